//! Connection state of the session with the peripheral.

use serde::{Deserialize, Serialize};

use crate::error::LinkError;
use crate::mode::Mode;
use crate::time::Timestamp;

/// Why a connection attempt ended in [`ConnectionState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    TransportUnavailable,
    DiscoveryCancelled,
    Connect { detail: String },
}

impl From<&LinkError> for FailureReason {
    fn from(err: &LinkError) -> Self {
        match err {
            LinkError::TransportUnavailable => Self::TransportUnavailable,
            LinkError::DiscoveryCancelled => Self::DiscoveryCancelled,
            other => Self::Connect {
                detail: error_chain(other),
            },
        }
    }
}

/// Render an error and its sources as `outer: inner: ...`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TransportUnavailable => f.write_str("bluetooth unavailable"),
            Self::DiscoveryCancelled => f.write_str("discovery cancelled"),
            Self::Connect { detail } => f.write_str(detail),
        }
    }
}

/// Lifecycle state of the session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Idle,
    Requesting,
    Connected,
    Receiving,
    Disconnected,
    Failed(FailureReason),
}

impl ConnectionState {
    /// Whether a live link to the peripheral is held.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected | Self::Receiving)
    }

    /// Whether `connect()` may start from this state.
    #[must_use]
    pub fn can_connect(&self) -> bool {
        matches!(self, Self::Idle | Self::Disconnected | Self::Failed(_))
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Requesting => f.write_str("requesting"),
            Self::Connected => f.write_str("connected"),
            Self::Receiving => f.write_str("receiving"),
            Self::Disconnected => f.write_str("disconnected"),
            Self::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// Point-in-time view of the session for the presentation layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SessionStatus {
    pub state: ConnectionState,
    pub mode: Mode,
    pub last_seen_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_idle() {
        assert_eq!(ConnectionState::default(), ConnectionState::Idle);
    }

    #[test]
    fn should_report_connected_states() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(ConnectionState::Receiving.is_connected());
        assert!(!ConnectionState::Requesting.is_connected());
        assert!(!ConnectionState::Disconnected.is_connected());
    }

    #[test]
    fn should_allow_connect_only_from_resting_states() {
        assert!(ConnectionState::Idle.can_connect());
        assert!(ConnectionState::Disconnected.can_connect());
        assert!(ConnectionState::Failed(FailureReason::DiscoveryCancelled).can_connect());
        assert!(!ConnectionState::Requesting.can_connect());
        assert!(!ConnectionState::Receiving.can_connect());
    }

    #[test]
    fn should_map_link_errors_to_failure_reasons() {
        assert_eq!(
            FailureReason::from(&LinkError::TransportUnavailable),
            FailureReason::TransportUnavailable
        );
        assert_eq!(
            FailureReason::from(&LinkError::DiscoveryCancelled),
            FailureReason::DiscoveryCancelled
        );
        let reason = FailureReason::from(&LinkError::Connect("service not found".into()));
        assert_eq!(
            reason,
            FailureReason::Connect {
                detail: "failed to connect to peripheral: service not found".to_owned()
            }
        );
    }

    #[test]
    fn should_display_failed_state_with_reason() {
        let state = ConnectionState::Failed(FailureReason::TransportUnavailable);
        assert_eq!(state.to_string(), "failed (bluetooth unavailable)");
    }

    #[test]
    fn should_serialize_state_with_tag() {
        let json = serde_json::to_value(ConnectionState::Receiving).unwrap();
        assert_eq!(json, serde_json::json!({"state": "receiving"}));
    }
}
