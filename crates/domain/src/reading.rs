//! Reading — one decoded telemetry sample from the peripheral.

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// The sensor's classification of package saturation.
///
/// Closed set: raw tokens that do not match a known state map to
/// [`Unknown`](Self::Unknown) rather than being carried as free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoistureState {
    Dry,
    Wet,
    Mixed,
    #[default]
    Unknown,
}

impl MoistureState {
    /// Map a raw device token, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        let token = token.trim();
        if token.eq_ignore_ascii_case("wet") {
            Self::Wet
        } else if token.eq_ignore_ascii_case("dry") {
            Self::Dry
        } else if token.eq_ignore_ascii_case("mixed") {
            Self::Mixed
        } else {
            Self::Unknown
        }
    }
}

impl std::fmt::Display for MoistureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dry => f.write_str("dry"),
            Self::Wet => f.write_str("wet"),
            Self::Mixed => f.write_str("mixed"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// An immutable telemetry sample stamped with its arrival time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    observed_at: Timestamp,
    moisture: MoistureState,
    temperature_celsius: Option<f64>,
}

impl Reading {
    #[must_use]
    pub fn new(
        observed_at: Timestamp,
        moisture: MoistureState,
        temperature_celsius: Option<f64>,
    ) -> Self {
        Self {
            observed_at,
            moisture,
            temperature_celsius,
        }
    }

    /// When the notification carrying this reading arrived.
    #[must_use]
    pub fn observed_at(&self) -> Timestamp {
        self.observed_at
    }

    #[must_use]
    pub fn moisture(&self) -> MoistureState {
        self.moisture
    }

    /// Temperature in degrees Celsius, `None` when the device sent a
    /// value that is not a number.
    #[must_use]
    pub fn temperature_celsius(&self) -> Option<f64> {
        self.temperature_celsius
    }
}
