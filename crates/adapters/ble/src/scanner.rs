//! BLE scanner — finds the sensor by its advertised local name.

use std::time::Duration;

use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use tokio_stream::StreamExt as _;

use crate::error::BleError;

/// Whether an advertised local name designates the wanted device.
///
/// Names are compared exactly; firmware names are case-sensitive.
pub(crate) fn matches_name(local_name: Option<&str>, wanted: &str) -> bool {
    local_name == Some(wanted)
}

/// Open the first BLE adapter on the host.
///
/// # Errors
///
/// Returns [`BleError::NotAvailable`] when the BLE stack cannot be reached
/// or the host has no adapter.
pub async fn first_adapter() -> Result<Adapter, BleError> {
    let manager = Manager::new().await.map_err(|err| {
        tracing::debug!(%err, "BLE manager unavailable");
        BleError::NotAvailable
    })?;
    let adapters = manager.adapters().await?;
    adapters.into_iter().next().ok_or(BleError::NotAvailable)
}

/// Scan until a peripheral advertising `device_name` shows up, or the
/// scan window elapses.
///
/// # Errors
///
/// Returns [`BleError::DeviceNotFound`] when the window elapses without a
/// match, or [`BleError::Scan`] if the scan cannot be started.
pub async fn find_peripheral(
    central: &Adapter,
    device_name: &str,
    scan_duration: Duration,
) -> Result<Peripheral, BleError> {
    let mut events = central.events().await?;
    central.start_scan(ScanFilter::default()).await?;
    tracing::info!(
        device_name,
        duration_secs = scan_duration.as_secs(),
        "BLE scan started"
    );

    let found = scan_for(central, &mut events, device_name, scan_duration).await;

    if let Err(err) = central.stop_scan().await {
        tracing::warn!(%err, "failed to stop BLE scan");
    }

    found.ok_or_else(|| BleError::DeviceNotFound {
        name: device_name.to_owned(),
    })
}

async fn scan_for<S>(
    central: &Adapter,
    events: &mut S,
    device_name: &str,
    scan_duration: Duration,
) -> Option<Peripheral>
where
    S: tokio_stream::Stream<Item = CentralEvent> + Unpin,
{
    // Peripherals cached from an earlier scan never emit DeviceDiscovered.
    if let Ok(known) = central.peripherals().await {
        for peripheral in known {
            if has_name(&peripheral, device_name).await {
                return Some(peripheral);
            }
        }
    }

    let deadline = tokio::time::Instant::now() + scan_duration;
    while tokio::time::Instant::now() < deadline {
        let remaining = deadline - tokio::time::Instant::now();
        match tokio::time::timeout(remaining, events.next()).await {
            Ok(Some(
                CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id),
            )) => {
                if let Some(peripheral) = named_peripheral(central, &id, device_name).await {
                    return Some(peripheral);
                }
            }
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => break,
        }
    }
    None
}

async fn named_peripheral(
    central: &Adapter,
    id: &PeripheralId,
    device_name: &str,
) -> Option<Peripheral> {
    let peripheral = central.peripheral(id).await.ok()?;
    has_name(&peripheral, device_name)
        .await
        .then_some(peripheral)
}

async fn has_name(peripheral: &Peripheral, device_name: &str) -> bool {
    let Ok(Some(props)) = peripheral.properties().await else {
        return false;
    };
    let found = matches_name(props.local_name.as_deref(), device_name);
    if found {
        tracing::info!(address = %props.address, rssi = ?props.rssi, "sensor discovered");
    } else {
        tracing::trace!(address = %props.address, name = ?props.local_name, "BLE device skipped");
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_match_exact_name() {
        assert!(matches_name(Some("XIAO-C3-BLE"), "XIAO-C3-BLE"));
    }

    #[test]
    fn should_not_match_other_or_missing_names() {
        assert!(!matches_name(Some("xiao-c3-ble"), "XIAO-C3-BLE"));
        assert!(!matches_name(Some("XIAO-C3-BLE-2"), "XIAO-C3-BLE"));
        assert!(!matches_name(None, "XIAO-C3-BLE"));
    }
}
