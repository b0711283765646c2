//! Peripheral port — the link to the single sensor the session talks to.
//!
//! A transport discovers and connects the peripheral, then hands back a
//! [`Connection`]: the link used for outbound commands and a channel of
//! inbound [`LinkEvent`]s. Events arrive in the order the transport
//! delivered them. The link is owned by the session alone.

use std::future::Future;

use tokio::sync::mpsc;

use moistlink_domain::error::LinkError;
use moistlink_domain::mode::ModeCommand;

/// Something the peripheral did on its own initiative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Raw payload pushed on the subscribed characteristic.
    Notification(Vec<u8>),
    /// The peripheral dropped the link.
    Disconnected,
}

/// A live, subscribed link to the peripheral.
pub trait PeripheralLink: Send + Sync {
    /// Write a mode command to the characteristic and wait for the write
    /// acknowledgement.
    fn write_command(
        &self,
        command: ModeCommand,
    ) -> impl Future<Output = Result<(), LinkError>> + Send;

    /// Explicitly close the link and stop delivering events.
    fn release(&self) -> impl Future<Output = Result<(), LinkError>> + Send;
}

/// Result of a successful [`PeripheralTransport::connect`].
#[derive(Debug)]
pub struct Connection<L> {
    pub link: L,
    pub events: mpsc::Receiver<LinkEvent>,
}

/// Discovers the peripheral and establishes a subscribed link.
pub trait PeripheralTransport: Send + Sync {
    type Link: PeripheralLink;

    /// Discover the peripheral, connect, resolve the service and
    /// characteristic, and subscribe to notifications.
    ///
    /// Suspends until the transport resolves or rejects. There is no
    /// automatic retry.
    fn connect(&self) -> impl Future<Output = Result<Connection<Self::Link>, LinkError>> + Send;
}
