//! Alert delivery — picks the channel that carries an alert to the user.
//!
//! Fallback chain:
//! 1. system notification, when permission is granted
//! 2. blocking prompt, when the application is in the foreground
//! 3. otherwise the alert is dropped (no queue, no retry)

use moistlink_domain::alert::{Alert, DeliveryOutcome};

use crate::ports::AlertSink;

/// Delivers alerts through an [`AlertSink`] following the fallback chain.
pub struct AlertDelivery<S> {
    sink: S,
}

impl<S: AlertSink> AlertDelivery<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Ask the sink for notification permission. Call only in response to a
    /// user action.
    pub async fn request_permission(&self) -> bool {
        let granted = self.sink.request_permission().await;
        tracing::debug!(granted, "notification permission requested");
        granted
    }

    /// Deliver an alert on the first available channel.
    ///
    /// A failing channel is logged and the alert counts as dropped.
    pub async fn deliver(&self, alert: &Alert) -> DeliveryOutcome {
        if self.sink.permission_granted() {
            return match self.sink.notify(alert).await {
                Ok(()) => DeliveryOutcome::Notified,
                Err(err) => {
                    tracing::warn!(%err, "system notification failed, alert dropped");
                    DeliveryOutcome::Dropped
                }
            };
        }

        if self.sink.is_foreground() {
            return match self.sink.prompt(alert).await {
                Ok(()) => DeliveryOutcome::Prompted,
                Err(err) => {
                    tracing::warn!(%err, "alert prompt failed, alert dropped");
                    DeliveryOutcome::Dropped
                }
            };
        }

        tracing::debug!(title = %alert.title, "no alert channel available, alert dropped");
        DeliveryOutcome::Dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use moistlink_domain::error::BoxError;

    #[derive(Default)]
    struct RecordingSink {
        granted: AtomicBool,
        grant_on_request: bool,
        foreground: bool,
        failing: bool,
        shown: Mutex<Vec<(&'static str, Alert)>>,
    }

    impl RecordingSink {
        fn record(&self, channel: &'static str, alert: &Alert) -> Result<(), BoxError> {
            if self.failing {
                return Err("channel unavailable".into());
            }
            self.shown.lock().unwrap().push((channel, alert.clone()));
            Ok(())
        }
    }

    impl AlertSink for RecordingSink {
        fn request_permission(&self) -> impl Future<Output = bool> + Send {
            self.granted.store(self.grant_on_request, Ordering::SeqCst);
            let granted = self.grant_on_request;
            async move { granted }
        }

        fn permission_granted(&self) -> bool {
            self.granted.load(Ordering::SeqCst)
        }

        fn is_foreground(&self) -> bool {
            self.foreground
        }

        fn notify(&self, alert: &Alert) -> impl Future<Output = Result<(), BoxError>> + Send {
            let result = self.record("notify", alert);
            async move { result }
        }

        fn prompt(&self, alert: &Alert) -> impl Future<Output = Result<(), BoxError>> + Send {
            let result = self.record("prompt", alert);
            async move { result }
        }
    }

    fn alert() -> Alert {
        Alert {
            title: "Sensor is wet".to_owned(),
            body: "Moisture detected".to_owned(),
        }
    }

    #[tokio::test]
    async fn should_notify_when_permission_granted() {
        let delivery = AlertDelivery::new(RecordingSink {
            grant_on_request: true,
            foreground: true,
            ..RecordingSink::default()
        });
        assert!(delivery.request_permission().await);

        assert_eq!(delivery.deliver(&alert()).await, DeliveryOutcome::Notified);
        let shown = delivery.sink.shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].0, "notify");
    }

    #[tokio::test]
    async fn should_prompt_when_denied_but_in_foreground() {
        let delivery = AlertDelivery::new(RecordingSink {
            foreground: true,
            ..RecordingSink::default()
        });
        assert!(!delivery.request_permission().await);

        assert_eq!(delivery.deliver(&alert()).await, DeliveryOutcome::Prompted);
        assert_eq!(delivery.sink.shown.lock().unwrap()[0].0, "prompt");
    }

    #[tokio::test]
    async fn should_drop_when_denied_and_in_background() {
        let delivery = AlertDelivery::new(RecordingSink::default());

        assert_eq!(delivery.deliver(&alert()).await, DeliveryOutcome::Dropped);
        assert!(delivery.sink.shown.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_not_assume_permission_before_request() {
        let delivery = AlertDelivery::new(RecordingSink {
            grant_on_request: true,
            ..RecordingSink::default()
        });

        assert_eq!(delivery.deliver(&alert()).await, DeliveryOutcome::Dropped);
    }

    #[tokio::test]
    async fn should_drop_when_channel_fails() {
        let delivery = AlertDelivery::new(RecordingSink {
            grant_on_request: true,
            failing: true,
            ..RecordingSink::default()
        });
        delivery.request_permission().await;

        assert_eq!(delivery.deliver(&alert()).await, DeliveryOutcome::Dropped);
    }
}
