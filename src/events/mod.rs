//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the supervisor loop, the
//! output readers of the launcher and the cleanup step.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor` loop, `ProcessLauncher` stream readers.
//! - **Consumers**: the event listener started by `Supervisor::run`, which fans
//!   out to the `SubscriberSet` (console log, log file, user subscribers).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
