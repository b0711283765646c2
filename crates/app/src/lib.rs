//! # moistlink-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `PeripheralTransport` / `PeripheralLink` — discovery, connection,
//!     command writes and the notification stream of the sensor
//!   - `AlertSink` — user-facing notification and prompt channels
//!   - `EventPublisher` — fan-out of session events
//! - Define the **driving/inbound** use case:
//!   - `ConnectionSession` — connect, toggle mode, disconnect, react to
//!     notifications and peripheral loss
//! - Provide **in-process infrastructure** that doesn't need IO (event bus,
//!   countdown ticker, alert delivery fallback chain)
//!
//! ## Dependency rule
//! Depends on `moistlink-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod alert_delivery;
pub mod countdown;
pub mod event_bus;
pub mod ports;
pub mod session;
