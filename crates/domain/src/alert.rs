//! Alert policy — decides whether a reading deserves the user's attention.

use serde::{Deserialize, Serialize};

use crate::reading::{MoistureState, Reading};

/// Outcome of evaluating a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAction {
    None,
    RaiseAlert,
}

/// Stateless per-reading alert decision.
///
/// Every wet reading raises an alert; consecutive wet readings are not
/// deduplicated, so realtime mode may alert once per second.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertPolicy;

impl AlertPolicy {
    #[must_use]
    pub fn evaluate(&self, reading: &Reading) -> AlertAction {
        if reading.moisture() == MoistureState::Wet {
            AlertAction::RaiseAlert
        } else {
            AlertAction::None
        }
    }
}

/// A user-facing alert raised for a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub body: String,
}

impl Alert {
    /// Build the alert text for a wet reading.
    #[must_use]
    pub fn for_reading(reading: &Reading) -> Self {
        let body = match reading.temperature_celsius() {
            Some(t) => format!("Moisture detected ({t:.1} °C)"),
            None => "Moisture detected".to_owned(),
        };
        Self {
            title: "Sensor is wet".to_owned(),
            body,
        }
    }
}

/// Which channel, if any, carried an alert to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Shown as a system-level notification.
    Notified,
    /// Shown as a blocking prompt while the app was in the foreground.
    Prompted,
    /// No channel was available; the alert was discarded.
    Dropped,
}
