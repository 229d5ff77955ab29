//! # swarmvisor
//!
//! **Swarmvisor** keeps a long-running swarm training process alive.
//!
//! It launches the trainer, watches both of its output streams for failure
//! markers, classifies why each run ended and decides how to restart it:
//! immediately, after an exponential backoff, or after cleaning up stale
//! processes that still hold the node identity.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                     ┌──────────────────────┐
//!                     │   RunConfiguration   │  (SwarmOptions::resolve)
//!                     └──────────┬───────────┘
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor (restart loop)                                        │
//! │  - CancellationToken (OS signals / shutdown())                    │
//! │  - RestartQueue (capacity-1, coalescing)                          │
//! │  - RestartPolicy + RestartState (backoff between runs)            │
//! └──────┬──────────────────────────────┬──────────────────────┬──────┘
//!        ▼                              ▼                      │
//! ┌──────────────────┐        ┌──────────────────┐             │
//! │  ProcessLauncher │        │  ProcessCleaner  │             │
//! │  (one run)       │        │  (on conflict)   │             │
//! └┬────────────────┬┘        └──────────────────┘             │
//!  │ stdout reader  │ stderr reader                            │
//!  └──► OutputClassifier ──► ConflictFlag (shared atomic)      │
//!  │                                                           │
//!  │ Publishes: ChildSpawned, MarkerMatched                    │ Publishes: RunStarting,
//!  ▼                                                           ▼ RunExited, BackoffScheduled, ...
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │              (capacity: SupervisorConfig::bus_capacity)           │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       │   (in Supervisor)      │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                           (per-sub queues)
//!                        ┌──────────┼──────────┐
//!                        ▼          ▼          ▼
//!                    LogWriter   FileLog     custom
//! ```
//!
//! ### Lifecycle
//! ```text
//! loop {
//!   ├─► select! { cancelled ─► exit, restart requested ─► continue }
//!   ├─► attempt += 1, publish RunStarting
//!   ├─► launch(config) ─► ExitOutcome
//!   │       ├─ Clean            ─► restart now,             backoff = initial
//!   │       ├─ GenericFailure   ─► sleep(backoff),          backoff = min(2×, max)
//!   │       └─ IdentityConflict ─► cleanup + sleep(10s),    backoff = initial
//!   └─► request next run (dropped if one is already pending)
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                        |
//! |-------------------|----------------------------------------------------------|-------------------------------------------|
//! | **Supervision**   | Restart loop with signal-driven shutdown.                | [`Supervisor`], [`SupervisorConfig`]      |
//! | **Policies**      | Restart decisions and doubling backoff.                  | [`RestartPolicy`], [`BackoffPolicy`]      |
//! | **Process**       | Launch, output classification, stale process cleanup.    | [`process::Launch`], [`process::Cleanup`] |
//! | **Subscriber API**| Hook into supervision events (console, log file, custom).| [`Subscribe`], [`LogWriter`], [`FileLog`] |
//! | **Training**      | Node options and interpreter bootstrap.                  | [`training::SwarmOptions`]                |
//! | **Errors**        | Typed errors with stable labels.                         | [`RuntimeError`], [`ExitError`]           |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use swarmvisor::{LogWriter, Subscribe, Supervisor, SupervisorConfig};
//! use swarmvisor::training::{SwarmOptions, bootstrap};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let python = bootstrap::venv_interpreter(".venv".as_ref());
//!     bootstrap::ensure_interpreter(&python)?;
//!
//!     let run = SwarmOptions::default().resolve(python, bootstrap::detect_cpu_only().await)?;
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let sup = Supervisor::builder(SupervisorConfig::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     // Returns after SIGINT / SIGTERM / SIGQUIT.
//!     sup.run(&run).await?;
//!     Ok(())
//! }
//! ```

mod build_info;
mod core;
mod error;
mod events;
mod policies;
pub mod process;
mod subscribers;
pub mod training;

// ---- Public re-exports ----

pub use build_info::BuildInfo;
pub use core::{Supervisor, SupervisorBuilder, SupervisorConfig};
pub use error::{BootstrapError, ConfigError, ExitError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, Decision, RestartAction, RestartPolicy, RestartState};
pub use subscribers::{FileLog, LogWriter, Subscribe, SubscriberSet};
