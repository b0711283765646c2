//! Event bus port — publish/subscribe for session events.

use std::future::Future;

use moistlink_domain::error::MoistLinkError;
use moistlink_domain::event::SessionEvent;

/// Publishes session events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(
        &self,
        event: SessionEvent,
    ) -> impl Future<Output = Result<(), MoistLinkError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        event: SessionEvent,
    ) -> impl Future<Output = Result<(), MoistLinkError>> + Send {
        (**self).publish(event)
    }
}
