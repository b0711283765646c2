//! GATT helpers for the sensor's single read/write/notify characteristic.
//!
//! [`open`] connects a discovered peripheral, resolves the service and
//! characteristic and subscribes to notifications. On any failure after the
//! link came up, the peripheral is disconnected before returning.

use std::future::Future;

use btleplug::api::{Characteristic, Peripheral as _};
use btleplug::platform::Peripheral;
use uuid::Uuid;

use crate::error::BleError;

/// Primary service exposed by the sensor firmware.
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x1234_5678_1234_5678_1234_5678_9abc_def0);

/// Characteristic carrying telemetry notifications and mode commands.
pub const CHARACTERISTIC_UUID: Uuid = Uuid::from_u128(0x1234_5678_1234_5678_1234_5678_9abc_def1);

/// Find a GATT characteristic by UUID on a peripheral that has already
/// discovered its services.
///
/// # Errors
///
/// Returns [`BleError::CharacteristicNotFound`] if no characteristic with
/// the given UUID is present.
fn find_characteristic(
    peripheral: &Peripheral,
    uuid: Uuid,
) -> Result<Characteristic, BleError> {
    peripheral
        .characteristics()
        .into_iter()
        .find(|c| c.uuid == uuid)
        .ok_or(BleError::CharacteristicNotFound { uuid })
}

/// Connect, discover, and subscribe to the telemetry characteristic.
///
/// # Protocol
///
/// 1. Connect to the peripheral
/// 2. Discover services and characteristics
/// 3. Check the sensor service is present
/// 4. Subscribe to notifications on the telemetry characteristic
///
/// # Errors
///
/// Returns [`BleError::GattConnect`] if the connection fails,
/// [`BleError::ServiceNotFound`] / [`BleError::CharacteristicNotFound`]
/// for a peripheral that is not the sensor, or [`BleError::Gatt`] when
/// discovery or subscription fails.
pub async fn open(peripheral: &Peripheral) -> Result<Characteristic, BleError> {
    peripheral.connect().await.map_err(BleError::GattConnect)?;

    disconnect_on_error(open_inner(peripheral).await, || peripheral.disconnect()).await
}

/// Run `disconnect` when `result` is an error, then return `result`
/// unchanged. A failing disconnect is logged, never reported.
pub(crate) async fn disconnect_on_error<T, F>(
    result: Result<T, BleError>,
    disconnect: impl FnOnce() -> F,
) -> Result<T, BleError>
where
    F: Future<Output = Result<(), btleplug::Error>>,
{
    if result.is_err() {
        if let Err(err) = disconnect().await {
            tracing::warn!(%err, "failed to disconnect peripheral after setup error");
        }
    }
    result
}

/// Inner setup logic, separated so the caller can disconnect on error.
async fn open_inner(peripheral: &Peripheral) -> Result<Characteristic, BleError> {
    peripheral
        .discover_services()
        .await
        .map_err(BleError::Gatt)?;

    if !peripheral.services().iter().any(|s| s.uuid == SERVICE_UUID) {
        return Err(BleError::ServiceNotFound { uuid: SERVICE_UUID });
    }
    let characteristic = find_characteristic(peripheral, CHARACTERISTIC_UUID)?;

    peripheral
        .subscribe(&characteristic)
        .await
        .map_err(BleError::Gatt)?;
    tracing::debug!(uuid = %characteristic.uuid, "subscribed to telemetry notifications");

    Ok(characteristic)
}
