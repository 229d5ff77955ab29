//! # Cross-platform OS signal handling.
//!
//! Provides [`ShutdownSignals`] which registers termination handlers up front,
//! so a registration failure is reported before the first launch.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal, often used for core dumps or hard stop)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Registered termination signal listeners.
#[cfg(unix)]
pub(crate) struct ShutdownSignals {
    sigint: Signal,
    sigterm: Signal,
    sigquit: Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    /// Installs the listeners. Must be called from within a tokio runtime.
    pub(crate) fn register() -> std::io::Result<Self> {
        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
            sigquit: signal(SignalKind::quit())?,
        })
    }

    /// Completes when any termination signal arrives.
    pub(crate) async fn recv(&mut self) {
        tokio::select! {
            _ = self.sigint.recv()  => {},
            _ = self.sigterm.recv() => {},
            _ = self.sigquit.recv() => {},
        }
    }
}

/// Registered termination signal listeners.
#[cfg(not(unix))]
pub(crate) struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    pub(crate) fn register() -> std::io::Result<Self> {
        Ok(Self)
    }

    /// Completes when Ctrl-C arrives.
    pub(crate) async fn recv(&mut self) {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
