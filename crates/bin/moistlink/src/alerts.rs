//! Terminal alert sink.
//!
//! "System notifications" are highlighted lines on stderr, permitted or not
//! by configuration. The prompt rings the terminal bell and is only used
//! when stdout is an interactive terminal.

use std::io::{IsTerminal as _, Write as _};
use std::sync::atomic::{AtomicBool, Ordering};

use moistlink_app::ports::AlertSink;
use moistlink_domain::alert::Alert;
use moistlink_domain::error::BoxError;

pub struct TerminalAlertSink {
    allow_notifications: bool,
    granted: AtomicBool,
}

impl TerminalAlertSink {
    #[must_use]
    pub fn new(allow_notifications: bool) -> Self {
        Self {
            allow_notifications,
            granted: AtomicBool::new(false),
        }
    }
}

impl AlertSink for TerminalAlertSink {
    async fn request_permission(&self) -> bool {
        self.granted
            .store(self.allow_notifications, Ordering::SeqCst);
        self.allow_notifications
    }

    fn permission_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn is_foreground(&self) -> bool {
        std::io::stdout().is_terminal()
    }

    async fn notify(&self, alert: &Alert) -> Result<(), BoxError> {
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "[notification] {}: {}", alert.title, alert.body)?;
        Ok(())
    }

    async fn prompt(&self, alert: &Alert) -> Result<(), BoxError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "\x07!! {} !! {}", alert.title, alert.body)?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_grant_permission_when_enabled() {
        let sink = TerminalAlertSink::new(true);
        assert!(!sink.permission_granted());

        assert!(sink.request_permission().await);
        assert!(sink.permission_granted());
    }

    #[tokio::test]
    async fn should_deny_permission_when_disabled() {
        let sink = TerminalAlertSink::new(false);

        assert!(!sink.request_permission().await);
        assert!(!sink.permission_granted());
    }
}
