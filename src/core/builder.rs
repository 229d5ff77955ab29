use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{config::SupervisorConfig, supervisor::Supervisor};
use crate::{
    build_info::BuildInfo,
    events::Bus,
    process::{Cleanup, Launch, ProcessCleaner, ProcessLauncher},
    subscribers::Subscribe,
};

/// Builder for constructing a Supervisor with injected collaborators.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    build_info: BuildInfo,
    launcher: Option<Arc<dyn Launch>>,
    cleaner: Option<Arc<dyn Cleanup>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            build_info: BuildInfo::current(),
            launcher: None,
            cleaner: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (runs, restarts, cleanups)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the build metadata reported in `SupervisorStarted`.
    pub fn with_build_info(mut self, info: BuildInfo) -> Self {
        self.build_info = info;
        self
    }

    /// Replaces the default [`ProcessLauncher`].
    pub fn with_launcher(mut self, launcher: Arc<dyn Launch>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Replaces the default [`ProcessCleaner`].
    pub fn with_cleaner(mut self, cleaner: Arc<dyn Cleanup>) -> Self {
        self.cleaner = Some(cleaner);
        self
    }

    /// Builds and returns the Supervisor instance.
    ///
    /// Falls back to [`ProcessLauncher::default`] and a [`ProcessCleaner`] built
    /// from `SupervisorConfig::cleaner` for collaborators that were not injected.
    pub fn build(self) -> Arc<Supervisor> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let launcher = self
            .launcher
            .unwrap_or_else(|| Arc::new(ProcessLauncher::default()));
        let cleaner = self
            .cleaner
            .unwrap_or_else(|| Arc::new(ProcessCleaner::new(self.cfg.cleaner.clone())));

        Arc::new(Supervisor::new_internal(
            self.cfg,
            bus,
            self.subscribers,
            self.build_info,
            launcher,
            cleaner,
            CancellationToken::new(),
        ))
    }
}
