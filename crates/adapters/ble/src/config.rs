//! BLE transport configuration.

use std::time::Duration;

use serde::Deserialize;

/// Local name advertised by the sensor firmware.
pub const DEFAULT_DEVICE_NAME: &str = "XIAO-C3-BLE";

/// Configuration for discovering and connecting the sensor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BleConfig {
    /// Exact advertised local name to connect to.
    pub device_name: String,
    /// How long to scan before giving up on discovery, in seconds.
    pub scan_duration_secs: u16,
    /// Upper bound on connect + service discovery + subscribe, in seconds.
    pub connect_timeout_secs: u16,
}

impl Default for BleConfig {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.to_owned(),
            scan_duration_secs: 10,
            connect_timeout_secs: 10,
        }
    }
}

impl BleConfig {
    #[must_use]
    pub fn scan_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.scan_duration_secs))
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.connect_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_sensor_name() {
        let config = BleConfig::default();
        assert_eq!(config.device_name, "XIAO-C3-BLE");
        assert_eq!(config.scan_duration(), Duration::from_secs(10));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn should_fill_missing_fields_with_defaults() {
        let config: BleConfig = toml::from_str("scan_duration_secs = 30").unwrap();
        assert_eq!(config.scan_duration_secs, 30);
        assert_eq!(config.device_name, DEFAULT_DEVICE_NAME);
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn should_accept_custom_device_name() {
        let config: BleConfig = toml::from_str(r#"device_name = "bench-sensor""#).unwrap();
        assert_eq!(config.device_name, "bench-sensor");
    }
}
