//! Device reporting mode and the commands that switch it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How often the peripheral pushes telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One notification every five minutes.
    #[default]
    Periodic,
    /// One notification per second.
    Realtime,
}

impl Mode {
    /// Nominal spacing between two notifications in this mode.
    #[must_use]
    pub fn interval(self) -> Duration {
        match self {
            Self::Periodic => Duration::from_secs(300),
            Self::Realtime => Duration::from_secs(1),
        }
    }

    /// The other mode.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Periodic => Self::Realtime,
            Self::Realtime => Self::Periodic,
        }
    }

    /// The command that puts the peripheral into this mode.
    #[must_use]
    pub fn command(self) -> ModeCommand {
        match self {
            Self::Periodic => ModeCommand::RealtimeOff,
            Self::Realtime => ModeCommand::RealtimeOn,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Periodic => f.write_str("periodic"),
            Self::Realtime => f.write_str("realtime"),
        }
    }
}

/// Command written to the peripheral's characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeCommand {
    RealtimeOn,
    RealtimeOff,
}

impl ModeCommand {
    /// ASCII wire form of the command.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RealtimeOn => "REALTIME_ON",
            Self::RealtimeOff => "REALTIME_OFF",
        }
    }

    #[must_use]
    pub fn as_bytes(self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}

impl std::fmt::Display for ModeCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
