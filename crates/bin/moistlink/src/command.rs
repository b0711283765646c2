//! Terminal commands.

/// A line typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    ToggleMode,
    Disconnect,
    Status,
    History,
    Help,
    Quit,
}

impl Command {
    /// Parse a command word; `None` for anything unrecognized.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let word = line.trim().to_ascii_lowercase();
        let command = match word.as_str() {
            "c" | "connect" => Self::Connect,
            "m" | "mode" => Self::ToggleMode,
            "d" | "disconnect" => Self::Disconnect,
            "s" | "status" => Self::Status,
            "h" | "history" => Self::History,
            "?" | "help" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            _ => return None,
        };
        Some(command)
    }
}

pub const HELP: &str = "\
commands:
  c, connect     scan for the sensor and connect
  m, mode        toggle periodic / realtime reporting
  d, disconnect  release the sensor
  s, status      connection state, countdown and statistics
  h, history     retained readings, oldest first
  ?, help        this message
  q, quit        disconnect and exit";
