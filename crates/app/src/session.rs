//! Connection session — the use case that owns the link to the sensor.
//!
//! Lifecycle: [`ConnectionSession::new`] → [`connect`](ConnectionSession::connect)
//! → (notifications, [`toggle_mode`](ConnectionSession::toggle_mode)) →
//! [`disconnect`](ConnectionSession::disconnect) → … →
//! [`dispose`](ConnectionSession::dispose).
//!
//! State machine:
//!
//! ```text
//! Idle ─connect─► Requesting ─ok─► Connected ─notification─► Receiving
//!                     │                 ▲                        │
//!                     └─err─► Failed    └────────────────────────┘
//! Connected / Receiving ─disconnect or peripheral loss─► Disconnected
//! Disconnected / Failed ─connect─► Requesting
//! ```
//!
//! The session is driven by a single task: user commands and link events
//! are interleaved by the caller (see [`next_link_event`](ConnectionSession::next_link_event)),
//! so notifications are appended one at a time, in transport order.

use tokio::sync::{mpsc, watch};

use moistlink_domain::alert::{Alert, AlertAction, AlertPolicy};
use moistlink_domain::cadence::next_update_in;
use moistlink_domain::connection::{ConnectionState, FailureReason, SessionStatus};
use moistlink_domain::error::SessionError;
use moistlink_domain::event::SessionEvent;
use moistlink_domain::history::ReadingHistory;
use moistlink_domain::mode::Mode;
use moistlink_domain::telemetry;
use moistlink_domain::time::{Timestamp, now};

use crate::alert_delivery::AlertDelivery;
use crate::countdown::CountdownTicker;
use crate::ports::{
    AlertSink, Connection, EventPublisher, LinkEvent, PeripheralLink, PeripheralTransport,
};

/// A session with one sensor peripheral.
pub struct ConnectionSession<T: PeripheralTransport, P, S> {
    transport: T,
    publisher: P,
    alerts: AlertDelivery<S>,
    policy: AlertPolicy,
    link: Option<T::Link>,
    link_events: Option<mpsc::Receiver<LinkEvent>>,
    state: ConnectionState,
    mode: Mode,
    last_seen_at: Option<Timestamp>,
    history: ReadingHistory,
    status: watch::Sender<SessionStatus>,
    ticker: CountdownTicker,
}

impl<T, P, S> ConnectionSession<T, P, S>
where
    T: PeripheralTransport,
    P: EventPublisher,
    S: AlertSink,
{
    /// Create an idle session that keeps at most `history_capacity` readings.
    pub fn new(transport: T, publisher: P, sink: S, history_capacity: usize) -> Self {
        let (status, _) = watch::channel(SessionStatus::default());
        Self {
            transport,
            publisher,
            alerts: AlertDelivery::new(sink),
            policy: AlertPolicy,
            link: None,
            link_events: None,
            state: ConnectionState::Idle,
            mode: Mode::Periodic,
            last_seen_at: None,
            history: ReadingHistory::new(history_capacity),
            status,
            ticker: CountdownTicker::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn last_seen_at(&self) -> Option<Timestamp> {
        self.last_seen_at
    }

    #[must_use]
    pub fn history(&self) -> &ReadingHistory {
        &self.history
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// Receiver updated on every state, mode or last-seen change.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Seconds until the next expected update, evaluated at `now`.
    #[must_use]
    pub fn next_update_in(&self, now: Timestamp) -> u64 {
        next_update_in(self.last_seen_at, self.mode, now)
    }

    /// Receiver of the countdown, refreshed once per second while connected.
    #[must_use]
    pub fn countdown(&self) -> watch::Receiver<u64> {
        self.ticker.subscribe()
    }

    /// Discover, connect and subscribe to the peripheral.
    ///
    /// Also requests notification permission, since this is a user-initiated
    /// action. History from a previous session is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] when already connected,
    /// or [`SessionError::Link`] when the transport fails; in that last case
    /// the state is [`ConnectionState::Failed`].
    ///
    /// # Cancellation
    ///
    /// Dropping the returned future leaves the session in
    /// [`ConnectionState::Requesting`]. The next `connect` or `disconnect`
    /// closes that abandoned attempt as failed before doing its own work.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        self.close_abandoned_attempt().await;
        if !self.state.can_connect() {
            return Err(SessionError::InvalidTransition {
                operation: "connect",
                state: self.state.clone(),
            });
        }

        self.alerts.request_permission().await;

        self.history.clear();
        self.last_seen_at = None;
        self.mode = Mode::Periodic;
        self.transition(ConnectionState::Requesting).await;

        match self.transport.connect().await {
            Ok(Connection { link, events }) => {
                self.link = Some(link);
                self.link_events = Some(events);
                self.transition(ConnectionState::Connected).await;
                self.ticker.start(self.status.subscribe());
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%err, "connection attempt failed");
                let reason = FailureReason::from(&err);
                self.transition(ConnectionState::Failed(reason)).await;
                Err(err.into())
            }
        }
    }

    /// Wait for the next event from the link.
    ///
    /// Never resolves while no link is held, so it can sit in a `select!`
    /// loop unconditionally. A closed event channel is reported as
    /// [`LinkEvent::Disconnected`].
    pub async fn next_link_event(&mut self) -> LinkEvent {
        match self.link_events.as_mut() {
            Some(events) => events.recv().await.unwrap_or(LinkEvent::Disconnected),
            None => std::future::pending().await,
        }
    }

    /// React to an event produced by the link.
    pub async fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Notification(payload) => self.on_notification(&payload).await,
            LinkEvent::Disconnected => self.on_peripheral_lost().await,
        }
    }

    /// Switch the peripheral between periodic and realtime reporting.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] when not connected, or
    /// [`SessionError::Link`] when the command write fails; mode and state
    /// are unchanged in both cases.
    pub async fn toggle_mode(&mut self) -> Result<Mode, SessionError> {
        if !self.state.is_connected() {
            return Err(SessionError::InvalidTransition {
                operation: "toggle mode",
                state: self.state.clone(),
            });
        }
        let link = self.link.as_ref().ok_or(SessionError::NotLinked)?;

        let target = self.mode.toggled();
        let command = target.command();
        if let Err(err) = link.write_command(command).await {
            tracing::warn!(%err, %command, "mode command write failed");
            return Err(err.into());
        }

        self.set_mode(target).await;
        Ok(target)
    }

    /// Release the link and return to [`ConnectionState::Disconnected`].
    ///
    /// Idempotent once disconnected. An abandoned connection attempt is
    /// closed and counts as disconnected.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] from states that never
    /// held a link (idle, failed).
    pub async fn disconnect(&mut self) -> Result<(), SessionError> {
        if self.state == ConnectionState::Requesting {
            self.close_abandoned_attempt().await;
            self.transition(ConnectionState::Disconnected).await;
            return Ok(());
        }
        if self.state == ConnectionState::Disconnected {
            return Ok(());
        }
        if !self.state.is_connected() {
            return Err(SessionError::InvalidTransition {
                operation: "disconnect",
                state: self.state.clone(),
            });
        }

        if let Some(link) = self.link.take() {
            if let Err(err) = link.release().await {
                tracing::warn!(%err, "failed to release peripheral link");
            }
        }
        self.teardown_link().await;
        self.transition(ConnectionState::Disconnected).await;
        Ok(())
    }

    /// End the session, releasing the link and stopping the ticker.
    pub async fn dispose(mut self) {
        self.close_abandoned_attempt().await;
        if self.state.is_connected() {
            if let Err(err) = self.disconnect().await {
                tracing::warn!(%err, "failed to disconnect while disposing session");
            }
        }
        self.ticker.stop();
        tracing::info!("session disposed");
    }

    /// `connect` holds `&mut self` until the transport resolves, so finding
    /// the session still `Requesting` means that future was dropped.
    async fn close_abandoned_attempt(&mut self) {
        if self.state != ConnectionState::Requesting {
            return;
        }
        tracing::warn!("previous connection attempt was abandoned");
        self.transition(ConnectionState::Failed(FailureReason::DiscoveryCancelled))
            .await;
    }

    async fn on_notification(&mut self, payload: &[u8]) {
        if !self.state.is_connected() {
            tracing::debug!(state = %self.state, "ignoring notification without a live link");
            return;
        }

        let telemetry = match telemetry::decode(payload) {
            Ok(telemetry) => telemetry,
            Err(err) => {
                let payload = String::from_utf8_lossy(payload).into_owned();
                tracing::warn!(%err, %payload, "dropping undecodable notification");
                self.publish(SessionEvent::DecodeFailed {
                    payload,
                    reason: err.to_string(),
                })
                .await;
                return;
            }
        };

        let reading = telemetry.observed_at(now());
        self.history.append(reading.clone());
        self.last_seen_at = Some(reading.observed_at());
        self.sync_status();
        self.transition(ConnectionState::Receiving).await;

        tracing::debug!(
            moisture = %reading.moisture(),
            temperature_celsius = ?reading.temperature_celsius(),
            history_len = self.history.len(),
            "reading received"
        );
        self.publish(SessionEvent::ReadingReceived {
            reading: reading.clone(),
        })
        .await;

        if self.policy.evaluate(&reading) == AlertAction::RaiseAlert {
            let delivery = self.alerts.deliver(&Alert::for_reading(&reading)).await;
            tracing::info!(?delivery, "moisture alert raised");
            self.publish(SessionEvent::AlertRaised { reading, delivery })
                .await;
        }
    }

    async fn on_peripheral_lost(&mut self) {
        if !self.state.is_connected() {
            tracing::debug!(state = %self.state, "ignoring disconnect without a live link");
            self.link_events = None;
            return;
        }

        tracing::info!("peripheral dropped the link");
        self.link = None;
        self.teardown_link().await;
        self.transition(ConnectionState::Disconnected).await;
    }

    /// Drop the event channel, stop the countdown and reset the mode.
    async fn teardown_link(&mut self) {
        self.link_events = None;
        self.ticker.stop();
        self.set_mode(Mode::Periodic).await;
    }

    async fn set_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        tracing::info!(%mode, "mode changed");
        self.sync_status();
        self.publish(SessionEvent::ModeChanged { mode }).await;
    }

    async fn transition(&mut self, to: ConnectionState) {
        if self.state == to {
            return;
        }
        let from = std::mem::replace(&mut self.state, to.clone());
        tracing::info!(%from, %to, "session state changed");
        self.sync_status();
        self.publish(SessionEvent::StateChanged { from, to }).await;
    }

    fn sync_status(&self) {
        self.status.send_replace(SessionStatus {
            state: self.state.clone(),
            mode: self.mode,
            last_seen_at: self.last_seen_at,
        });
    }

    async fn publish(&self, event: SessionEvent) {
        let kind = event.kind();
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(%err, kind, "failed to publish session event");
        }
    }
}
