//! # Event subscribers for the swarmvisor runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and built-in implementations for handling runtime events broadcast through
//! the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Supervisor / ProcessLauncher ── publish(Event) ──► Bus ──► event listener
//!                                                                   │
//!                                                          SubscriberSet::emit
//!                                                                   │
//!                                                   ┌───────────────┼───────────┐
//!                                                   ▼               ▼           ▼
//!                                               LogWriter        FileLog      Custom
//!                                             (tracing console) (append file)
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use swarmvisor::{Subscribe, Event, EventKind};
//! use async_trait::async_trait;
//!
//! struct RestartCounter;
//!
//! #[async_trait]
//! impl Subscribe for RestartCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if let EventKind::RunStarting = event.kind {
//!             // increment a counter
//!         }
//!     }
//! }
//! ```

mod file;
mod log;
mod set;
mod subscriber;

pub use file::FileLog;
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
