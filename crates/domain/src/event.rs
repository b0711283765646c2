//! Session events — immutable records of what the session did.
//!
//! Events are published on every state transition, mode change, decoded
//! reading, alert and dropped payload, so the presentation layer never
//! has to poll for changes.

use serde::Serialize;

use crate::alert::DeliveryOutcome;
use crate::connection::ConnectionState;
use crate::mode::Mode;
use crate::reading::Reading;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    StateChanged {
        from: ConnectionState,
        to: ConnectionState,
    },
    ModeChanged {
        mode: Mode,
    },
    ReadingReceived {
        reading: Reading,
    },
    AlertRaised {
        reading: Reading,
        delivery: DeliveryOutcome,
    },
    /// A notification payload could not be decoded and was dropped.
    DecodeFailed {
        payload: String,
        reason: String,
    },
}

impl SessionEvent {
    /// Short `snake_case` name of the event kind, for log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => "state_changed",
            Self::ModeChanged { .. } => "mode_changed",
            Self::ReadingReceived { .. } => "reading_received",
            Self::AlertRaised { .. } => "alert_raised",
            Self::DecodeFailed { .. } => "decode_failed",
        }
    }
}
