//! # moistlink-domain
//!
//! Pure domain model for the moistlink sensor client.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, timestamps
//! - Define **Readings** (one decoded telemetry sample) and the closed
//!   [`MoistureState`](reading::MoistureState) enumeration
//! - Decode raw notification payloads in both supported wire formats
//! - Keep the bounded, FIFO-evicting **reading history**
//! - Compute the advisory **cadence** countdown for a device mode
//! - Decide whether a reading raises an **alert**
//! - Model the **connection state** and the events a session emits
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod alert;
pub mod cadence;
pub mod connection;
pub mod event;
pub mod history;
pub mod mode;
pub mod reading;
pub mod telemetry;
