//! # moistlink-adapter-ble
//!
//! BLE transport for the moisture sensor.
//!
//! ## How it works
//!
//! The sensor advertises under a fixed local name and exposes one GATT
//! characteristic that both notifies telemetry and accepts mode commands.
//! [`BleTransport::connect`] scans for the name, connects, subscribes, and
//! spawns a pump task that forwards notifications and the adapter's
//! disconnect event into the session's event channel.
//!
//! | Item | Value |
//! |------|-------|
//! | Local name | `XIAO-C3-BLE` |
//! | Service | `12345678-1234-5678-1234-56789abcdef0` |
//! | Characteristic | `12345678-1234-5678-1234-56789abcdef1` |
//! | Commands | `REALTIME_ON`, `REALTIME_OFF` (write with response) |
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `moistlink-app` and `moistlink-domain`.

mod config;
mod error;
pub mod gatt;
mod scanner;

pub use config::{BleConfig, DEFAULT_DEVICE_NAME};
pub use error::BleError;

use std::pin::Pin;

use btleplug::api::{
    Central as _, CentralEvent, Characteristic, Peripheral as _, ValueNotification, WriteType,
};
use btleplug::platform::{Adapter, Peripheral};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::{Stream, StreamExt as _};

use moistlink_app::ports::{Connection, LinkEvent, PeripheralLink, PeripheralTransport};
use moistlink_domain::error::LinkError;
use moistlink_domain::mode::ModeCommand;

/// Capacity of the channel between the pump task and the session.
const EVENT_CHANNEL_CAPACITY: usize = 64;

type NotificationStream = Pin<Box<dyn Stream<Item = ValueNotification> + Send>>;
type CentralEventStream = Pin<Box<dyn Stream<Item = CentralEvent> + Send>>;

/// Transport that discovers the sensor over the host's first BLE adapter.
pub struct BleTransport {
    config: BleConfig,
}

impl BleTransport {
    #[must_use]
    pub fn new(config: BleConfig) -> Self {
        Self { config }
    }

    async fn open(&self) -> Result<Connection<BleLink>, BleError> {
        let central = scanner::first_adapter().await?;
        let peripheral = scanner::find_peripheral(
            &central,
            &self.config.device_name,
            self.config.scan_duration(),
        )
        .await?;

        let characteristic =
            match tokio::time::timeout(self.config.connect_timeout(), gatt::open(&peripheral))
                .await
            {
                Ok(result) => result?,
                Err(_) => {
                    if let Err(err) = peripheral.disconnect().await {
                        tracing::warn!(%err, "failed to disconnect after connect timeout");
                    }
                    return Err(BleError::Timeout {
                        operation: "connect",
                    });
                }
            };

        let (notifications, central_events) = gatt::disconnect_on_error(
            event_streams(&central, &peripheral).await,
            || peripheral.disconnect(),
        )
        .await?;

        let peripheral_id = peripheral.id();
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let pump = tokio::spawn(pump_events(
            notifications,
            central_events,
            move |event: &CentralEvent| {
                matches!(event, CentralEvent::DeviceDisconnected(id) if *id == peripheral_id)
            },
            characteristic.uuid,
            tx,
        ));

        tracing::info!(device_name = %self.config.device_name, "sensor connected");
        Ok(Connection {
            link: BleLink {
                peripheral,
                characteristic,
                pump,
            },
            events: rx,
        })
    }
}

impl PeripheralTransport for BleTransport {
    type Link = BleLink;

    async fn connect(&self) -> Result<Connection<BleLink>, LinkError> {
        Ok(self.open().await?)
    }
}

/// A connected, subscribed sensor.
pub struct BleLink {
    peripheral: Peripheral,
    characteristic: Characteristic,
    pump: JoinHandle<()>,
}

impl PeripheralLink for BleLink {
    async fn write_command(&self, command: ModeCommand) -> Result<(), LinkError> {
        tracing::debug!(%command, "writing mode command");
        self.peripheral
            .write(
                &self.characteristic,
                command.as_bytes(),
                WriteType::WithResponse,
            )
            .await
            .map_err(|err| LinkError::Write(Box::new(err)))
    }

    async fn release(&self) -> Result<(), LinkError> {
        self.pump.abort();
        self.peripheral
            .disconnect()
            .await
            .map_err(|err| LinkError::Release(Box::new(err)))?;
        tracing::info!("sensor link released");
        Ok(())
    }
}

impl Drop for BleLink {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

async fn event_streams(
    central: &Adapter,
    peripheral: &Peripheral,
) -> Result<(NotificationStream, CentralEventStream), BleError> {
    let notifications = peripheral.notifications().await.map_err(BleError::Gatt)?;
    let central_events = central.events().await?;
    Ok((notifications, central_events))
}

/// Forward telemetry notifications and the disconnect signal for one
/// peripheral into `tx`. Ends after the first [`LinkEvent::Disconnected`]
/// or once the receiver is gone.
///
/// `is_disconnect` selects the adapter event that means this peripheral
/// dropped the link; the end of either stream counts as a disconnect too.
async fn pump_events<N, C, E>(
    mut notifications: N,
    mut central_events: C,
    is_disconnect: impl Fn(&E) -> bool,
    characteristic: uuid::Uuid,
    tx: mpsc::Sender<LinkEvent>,
) where
    N: Stream<Item = ValueNotification> + Unpin,
    C: Stream<Item = E> + Unpin,
{
    loop {
        let event = tokio::select! {
            notification = notifications.next() => match notification {
                Some(notification) => match forwarded_notification(notification, characteristic) {
                    Some(event) => event,
                    None => continue,
                },
                None => LinkEvent::Disconnected,
            },
            central = central_events.next() => match central {
                Some(event) if is_disconnect(&event) => LinkEvent::Disconnected,
                Some(_) => continue,
                None => LinkEvent::Disconnected,
            },
        };

        let last = event == LinkEvent::Disconnected;
        if tx.send(event).await.is_err() || last {
            break;
        }
    }
    tracing::debug!("BLE event pump stopped");
}

fn forwarded_notification(
    notification: ValueNotification,
    characteristic: uuid::Uuid,
) -> Option<LinkEvent> {
    (notification.uuid == characteristic).then(|| LinkEvent::Notification(notification.value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_create_transport_with_config() {
        let transport = BleTransport::new(BleConfig::default());
        assert_eq!(transport.config.device_name, DEFAULT_DEVICE_NAME);
    }

    #[test]
    fn should_forward_notifications_from_telemetry_characteristic() {
        let notification = ValueNotification {
            uuid: gatt::CHARACTERISTIC_UUID,
            value: b"MOISTURE:Dry;TEMP:21.0".to_vec(),
        };

        let event = forwarded_notification(notification, gatt::CHARACTERISTIC_UUID);

        assert_eq!(
            event,
            Some(LinkEvent::Notification(b"MOISTURE:Dry;TEMP:21.0".to_vec()))
        );
    }

    #[test]
    fn should_ignore_notifications_from_other_characteristics() {
        let notification = ValueNotification {
            uuid: gatt::SERVICE_UUID,
            value: vec![1, 2, 3],
        };

        assert_eq!(
            forwarded_notification(notification, gatt::CHARACTERISTIC_UUID),
            None
        );
    }

    #[test]
    fn should_write_mode_commands_as_ascii() {
        assert_eq!(ModeCommand::RealtimeOn.as_bytes(), b"REALTIME_ON");
        assert_eq!(ModeCommand::RealtimeOff.as_bytes(), b"REALTIME_OFF");
    }

    fn notification(uuid: uuid::Uuid, payload: &str) -> ValueNotification {
        ValueNotification {
            uuid,
            value: payload.as_bytes().to_vec(),
        }
    }

    fn is_sensor(id: &u8) -> bool {
        *id == 1
    }

    async fn collect(mut rx: mpsc::Receiver<LinkEvent>) -> Vec<LinkEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn should_report_disconnect_when_notification_stream_ends() {
        let notifications = tokio_stream::iter(vec![
            notification(gatt::CHARACTERISTIC_UUID, "dry,20"),
            notification(gatt::SERVICE_UUID, "ignored"),
            notification(gatt::CHARACTERISTIC_UUID, "wet,21"),
        ]);
        let (tx, rx) = mpsc::channel(16);

        pump_events(
            notifications,
            tokio_stream::pending::<u8>(),
            is_sensor,
            gatt::CHARACTERISTIC_UUID,
            tx,
        )
        .await;

        assert_eq!(
            collect(rx).await,
            [
                LinkEvent::Notification(b"dry,20".to_vec()),
                LinkEvent::Notification(b"wet,21".to_vec()),
                LinkEvent::Disconnected,
            ]
        );
    }

    #[tokio::test]
    async fn should_ignore_disconnect_of_other_peripherals() {
        let (tx, rx) = mpsc::channel(16);

        pump_events(
            tokio_stream::pending::<ValueNotification>(),
            tokio_stream::iter(vec![2_u8, 3, 1, 1]),
            is_sensor,
            gatt::CHARACTERISTIC_UUID,
            tx,
        )
        .await;

        assert_eq!(collect(rx).await, [LinkEvent::Disconnected]);
    }

    #[tokio::test]
    async fn should_stop_after_first_disconnect() {
        let notifications = tokio_stream::iter(vec![notification(
            gatt::CHARACTERISTIC_UUID,
            "dry,20",
        )])
        .chain(tokio_stream::pending());
        let (tx, rx) = mpsc::channel(16);

        pump_events(
            notifications,
            tokio_stream::iter(vec![1_u8]).chain(tokio_stream::pending()),
            is_sensor,
            gatt::CHARACTERISTIC_UUID,
            tx,
        )
        .await;

        let events = collect(rx).await;
        assert_eq!(events.last(), Some(&LinkEvent::Disconnected));
        assert_eq!(
            events
                .iter()
                .filter(|event| **event == LinkEvent::Disconnected)
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn should_stop_when_receiver_is_gone() {
        let notifications = tokio_stream::iter(std::iter::repeat_with(|| {
            notification(gatt::CHARACTERISTIC_UUID, "dry,20")
        }));
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        tokio::time::timeout(
            std::time::Duration::from_secs(1),
            pump_events(
                notifications,
                tokio_stream::pending::<u8>(),
                is_sensor,
                gatt::CHARACTERISTIC_UUID,
                tx,
            ),
        )
        .await
        .expect("pump should stop once the session is gone");
    }
}
