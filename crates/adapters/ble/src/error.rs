//! BLE adapter error types.

use moistlink_domain::error::LinkError;

/// Errors specific to the BLE adapter.
#[derive(Debug, thiserror::Error)]
pub enum BleError {
    /// No BLE adapter found on the host, or the BLE stack is unusable.
    #[error("no BLE adapter available")]
    NotAvailable,

    /// BLE scan or adapter operation failed.
    #[error("BLE scan error")]
    Scan(#[from] btleplug::Error),

    /// Nothing advertising the configured name was seen during the scan.
    #[error("no device named {name:?} found")]
    DeviceNotFound { name: String },

    /// Connecting to the peripheral failed.
    #[error("GATT connection failed")]
    GattConnect(#[source] btleplug::Error),

    /// A GATT operation on a connected peripheral failed.
    #[error("GATT operation failed")]
    Gatt(#[source] btleplug::Error),

    #[error("service {uuid} not found")]
    ServiceNotFound { uuid: uuid::Uuid },

    #[error("characteristic {uuid} not found")]
    CharacteristicNotFound { uuid: uuid::Uuid },

    #[error("{operation} timed out")]
    Timeout { operation: &'static str },
}

impl From<BleError> for LinkError {
    fn from(err: BleError) -> Self {
        match err {
            BleError::NotAvailable => Self::TransportUnavailable,
            BleError::DeviceNotFound { .. } => Self::DiscoveryCancelled,
            other => Self::Connect(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_not_available_error() {
        let err = BleError::NotAvailable;
        assert_eq!(err.to_string(), "no BLE adapter available");
    }

    #[test]
    fn should_display_device_not_found_error() {
        let err = BleError::DeviceNotFound {
            name: "XIAO-C3-BLE".to_owned(),
        };
        assert_eq!(err.to_string(), r#"no device named "XIAO-C3-BLE" found"#);
    }

    #[test]
    fn should_display_timeout_error() {
        let err = BleError::Timeout {
            operation: "connect",
        };
        assert_eq!(err.to_string(), "connect timed out");
    }

    #[test]
    fn should_map_not_available_to_transport_unavailable() {
        let err: LinkError = BleError::NotAvailable.into();
        assert!(matches!(err, LinkError::TransportUnavailable));
    }

    #[test]
    fn should_map_device_not_found_to_discovery_cancelled() {
        let err: LinkError = BleError::DeviceNotFound {
            name: "XIAO-C3-BLE".to_owned(),
        }
        .into();
        assert!(matches!(err, LinkError::DiscoveryCancelled));
    }

    #[test]
    fn should_map_gatt_failures_to_connect_error() {
        let err: LinkError = BleError::GattConnect(btleplug::Error::DeviceNotFound).into();
        assert!(matches!(err, LinkError::Connect(_)));

        let uuid = uuid::Uuid::nil();
        let err: LinkError = BleError::CharacteristicNotFound { uuid }.into();
        let LinkError::Connect(source) = err else {
            panic!("expected connect error");
        };
        assert!(source.to_string().contains("characteristic"));
    }
}
