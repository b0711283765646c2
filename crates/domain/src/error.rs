//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`MoistLinkError`] via `#[from]`.

use crate::connection::ConnectionState;

/// Boxed error used to carry transport-specific failures across the port
/// boundary without leaking adapter types into the domain.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for the moistlink workspace.
#[derive(Debug, thiserror::Error)]
pub enum MoistLinkError {
    #[error("telemetry decode error")]
    Decode(#[from] DecodeError),

    #[error("peripheral link error")]
    Link(#[from] LinkError),

    #[error("session error")]
    Session(#[from] SessionError),
}

/// Why a notification payload could not be turned into a reading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The payload bytes are not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    /// The payload matches none of the known wire formats.
    #[error("unrecognized payload format")]
    UnrecognizedFormat,

    /// A keyed payload lacks a mandatory field.
    #[error("missing field {0}")]
    MissingField(&'static str),
}

/// Failures reported by the peripheral transport port.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// No BLE capability on this host.
    #[error("bluetooth transport unavailable")]
    TransportUnavailable,

    /// Discovery ended without a peripheral being selected.
    #[error("device discovery cancelled")]
    DiscoveryCancelled,

    /// Connection, service or characteristic resolution failed.
    #[error("failed to connect to peripheral")]
    Connect(#[source] BoxError),

    /// A command write was rejected.
    #[error("failed to write command")]
    Write(#[source] BoxError),

    /// Releasing the link failed.
    #[error("failed to release peripheral link")]
    Release(#[source] BoxError),
}

/// Errors raised by connection session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The operation is not allowed from the current state.
    #[error("cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: ConnectionState,
    },

    /// The session is connected but holds no link (should not happen).
    #[error("no peripheral link held")]
    NotLinked,

    /// The transport rejected the operation.
    #[error("peripheral link error")]
    Link(#[from] LinkError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_decode_errors() {
        assert_eq!(
            DecodeError::UnrecognizedFormat.to_string(),
            "unrecognized payload format"
        );
        assert_eq!(
            DecodeError::MissingField("MOISTURE").to_string(),
            "missing field MOISTURE"
        );
    }

    #[test]
    fn should_display_invalid_transition_with_state() {
        let err = SessionError::InvalidTransition {
            operation: "toggle mode",
            state: ConnectionState::Idle,
        };
        assert_eq!(err.to_string(), "cannot toggle mode while idle");
    }

    #[test]
    fn should_wrap_link_error_into_session_error() {
        let err: SessionError = LinkError::TransportUnavailable.into();
        assert!(matches!(
            err,
            SessionError::Link(LinkError::TransportUnavailable)
        ));
    }

    #[test]
    fn should_expose_write_source() {
        let source: BoxError = "gatt rejected".into();
        let err = LinkError::Write(source);
        let inner = std::error::Error::source(&err).unwrap();
        assert_eq!(inner.to_string(), "gatt rejected");
    }

    fn layer(err: &MoistLinkError) -> &'static str {
        match err {
            MoistLinkError::Decode(_) => "decode",
            MoistLinkError::Link(_) => "link",
            MoistLinkError::Session(_) => "session",
        }
    }

    #[test]
    fn should_convert_every_layer_into_top_level_error() {
        let decode: MoistLinkError = DecodeError::InvalidUtf8.into();
        let link: MoistLinkError = LinkError::DiscoveryCancelled.into();
        let session: MoistLinkError = SessionError::NotLinked.into();

        assert_eq!(layer(&decode), "decode");
        assert_eq!(layer(&link), "link");
        assert_eq!(layer(&session), "session");
    }
}
