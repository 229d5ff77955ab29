//! Runtime core: orchestration and lifecycle.
//!
//! The public API from this module is [`Supervisor`] (built through
//! [`SupervisorBuilder`]) and its [`SupervisorConfig`].
//!
//! Internal modules:
//! - [`supervisor`]: the restart loop, event listener and shutdown handling;
//! - [`builder`]: wiring of launcher, cleanup, subscribers and build metadata;
//! - [`queue`]: single-slot coalescing restart queue;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod config;
mod queue;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use supervisor::Supervisor;
