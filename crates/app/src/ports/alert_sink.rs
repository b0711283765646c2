//! Alert sink port — the channels that bring an alert to the user.

use std::future::Future;

use moistlink_domain::alert::Alert;
use moistlink_domain::error::BoxError;

/// Platform channels for user-facing alerts.
///
/// Implemented by the presentation layer; the application decides which
/// channel to use (see [`AlertDelivery`](crate::alert_delivery::AlertDelivery)).
pub trait AlertSink: Send + Sync {
    /// Ask the platform for permission to show system notifications.
    ///
    /// Only called in response to a user-initiated connect. Returns whether
    /// permission is granted.
    fn request_permission(&self) -> impl Future<Output = bool> + Send;

    /// Whether system notifications are currently permitted.
    fn permission_granted(&self) -> bool;

    /// Whether the application is visible to the user right now.
    fn is_foreground(&self) -> bool;

    /// Show a system-level notification.
    fn notify(&self, alert: &Alert) -> impl Future<Output = Result<(), BoxError>> + Send;

    /// Show a synchronous, attention-grabbing prompt.
    fn prompt(&self, alert: &Alert) -> impl Future<Output = Result<(), BoxError>> + Send;
}
