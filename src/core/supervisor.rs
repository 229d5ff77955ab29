//! # Supervisor: restart loop, fan-out delivery, and signal-driven shutdown.
//!
//! The [`Supervisor`] owns the event bus, the cancellation token and the
//! collaborators of one supervision loop (launcher, cleanup, subscribers).
//!
//! ## Key responsibilities
//! - subscribe to the [`Bus`] and **fan-out** events via [`SubscriberSet`]
//! - drive launch → classify → decide → (cleanup) → sleep → requeue
//! - handle OS termination signals (SIGINT/SIGTERM/SIGQUIT, Ctrl-C on Windows)
//!
//! ## High-level architecture
//! ```text
//! run(&RunConfiguration):
//!   subscriber_listener(): Bus.subscribe() ─► SubscriberSet::emit(&Event)
//!   ShutdownSignals::register()  (error → RuntimeError::Signals, nothing launched)
//!   publish SupervisorStarted{ build info }
//!   queue.request()
//!
//!   loop {
//!     select! { biased;
//!       token.cancelled() ─► break
//!       queue.next()      ─► cycle
//!     }
//!   }
//!
//! cycle:
//!   attempt += 1
//!   publish RunStarting
//!   outcome = launcher.launch(config)         (not cancellable)
//!   publish RunExited{ outcome }
//!   action = policy.advance(&mut state, &outcome)
//!     ├─ Immediate        ─► publish RestartImmediate
//!     ├─ Backoff{d}       ─► publish BackoffScheduled ─► sleep(d)       (cancellable)
//!     └─ CleanupThenRetry ─► publish CleanupScheduled ─► cleanup()
//!                            ─► publish CleanupFinished ─► sleep(10s)  (cancellable)
//!   queue.request()   (dropped if one is pending → RestartCoalesced)
//!
//! Shutdown path:
//!   signal / Supervisor::shutdown()
//!     └─► Bus.publish(ShutdownRequested)
//!     └─► token.cancel() ─► loop exits at the next select or sleep
//!     └─► Bus.publish(SupervisorStopped) ─► listener drains subscribers
//! ```
//!
//! A child that is running when shutdown is requested is not signalled; the
//! loop returns once that run has ended.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::builder::SupervisorBuilder;
use super::config::SupervisorConfig;
use super::queue::RestartQueue;
use super::shutdown::ShutdownSignals;
use crate::{
    build_info::BuildInfo,
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    policies::{RestartAction, RestartState},
    process::{Cleanup, ExitOutcome, Launch, RunConfiguration},
    subscribers::{Subscribe, SubscriberSet},
};

/// Drives the supervised process through restarts until cancelled.
pub struct Supervisor {
    cfg: SupervisorConfig,
    bus: Bus,
    subscribers: Vec<Arc<dyn Subscribe>>,
    build_info: BuildInfo,
    launcher: Arc<dyn Launch>,
    cleaner: Arc<dyn Cleanup>,
    token: CancellationToken,
}

impl Supervisor {
    /// Starts building a supervisor with the given configuration.
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        bus: Bus,
        subscribers: Vec<Arc<dyn Subscribe>>,
        build_info: BuildInfo,
        launcher: Arc<dyn Launch>,
        cleaner: Arc<dyn Cleanup>,
        token: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            bus,
            subscribers,
            build_info,
            launcher,
            cleaner,
            token,
        }
    }

    /// Event bus of this supervisor.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Token that stops the loop when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.cfg
    }

    /// Requests shutdown. Idempotent.
    pub fn shutdown(&self) {
        request_shutdown(&self.bus, &self.token, "requested");
    }

    /// Runs the supervision loop until cancellation.
    ///
    /// Returns `Ok(())` after a shutdown request, or [`RuntimeError::Signals`]
    /// if the OS signal handlers cannot be installed (nothing is launched then).
    pub async fn run(&self, config: &RunConfiguration) -> Result<(), RuntimeError> {
        let listener = self.subscriber_listener();

        if self.cfg.os_signals {
            match ShutdownSignals::register() {
                Ok(signals) => self.spawn_signal_watcher(signals),
                Err(source) => {
                    self.bus.publish(
                        Event::new(EventKind::SupervisorStopped)
                            .with_reason(format!("signal registration failed: {source}")),
                    );
                    join_listener(listener).await;
                    return Err(RuntimeError::Signals { source });
                }
            }
        }

        self.bus.publish(
            Event::new(EventKind::SupervisorStarted).with_reason(self.build_info.to_string()),
        );

        let mut queue = RestartQueue::new();
        let mut state = self.cfg.restart.initial_state();
        let mut attempt: u64 = 0;
        queue.request();

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = queue.next() => {}
            }

            attempt += 1;
            if !self.run_cycle(config, attempt, &mut state, &queue).await {
                break;
            }
        }

        self.bus.publish(Event::new(EventKind::SupervisorStopped).with_attempt(attempt));
        join_listener(listener).await;
        Ok(())
    }

    /// One launch and the restart decision that follows it.
    ///
    /// Returns false when cancellation interrupted a policy sleep.
    async fn run_cycle(
        &self,
        config: &RunConfiguration,
        attempt: u64,
        state: &mut RestartState,
        queue: &RestartQueue,
    ) -> bool {
        self.bus
            .publish(Event::new(EventKind::RunStarting).with_attempt(attempt));

        let outcome = self.launcher.launch(config, attempt, &self.bus).await;

        let mut exited = Event::new(EventKind::RunExited)
            .with_attempt(attempt)
            .with_outcome(outcome.label());
        let failure = match &outcome {
            ExitOutcome::GenericFailure(e) => Some(e.to_string()),
            _ => None,
        };
        if let Some(reason) = failure.as_deref() {
            exited = exited.with_reason(reason);
        }
        self.bus.publish(exited);

        let action = self.cfg.restart.advance(state, &outcome);
        let backoff = state.current();
        debug!(attempt, action = action.as_label(), ?backoff, "restart decision");

        match action {
            RestartAction::Immediate => {
                self.bus.publish(
                    Event::new(EventKind::RestartImmediate)
                        .with_attempt(attempt)
                        .with_backoff(backoff),
                );
            }
            RestartAction::Backoff { delay } => {
                let mut ev = Event::new(EventKind::BackoffScheduled)
                    .with_attempt(attempt)
                    .with_delay(delay)
                    .with_backoff(backoff);
                if let Some(reason) = failure {
                    ev = ev.with_reason(reason);
                }
                self.bus.publish(ev);

                if !self.pause(delay).await {
                    return false;
                }
            }
            RestartAction::CleanupThenRetry { delay } => {
                self.bus.publish(
                    Event::new(EventKind::CleanupScheduled)
                        .with_attempt(attempt)
                        .with_delay(delay)
                        .with_backoff(backoff),
                );

                let report = self.cleaner.cleanup().await;
                for warning in &report.warnings {
                    self.bus.publish(
                        Event::new(EventKind::CleanupWarning).with_reason(warning.as_str()),
                    );
                }
                self.bus.publish(
                    Event::new(EventKind::CleanupFinished)
                        .with_attempt(attempt)
                        .with_reason(report.summary()),
                );

                if !self.pause(delay).await {
                    return false;
                }
            }
        }

        if !queue.request() {
            self.bus
                .publish(Event::new(EventKind::RestartCoalesced).with_attempt(attempt));
        }
        true
    }

    /// Sleeps for `delay` unless cancelled first. Returns false on cancellation.
    async fn pause(&self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    /// Subscribes to the bus and forwards events to the subscriber set.
    ///
    /// Stops after `SupervisorStopped` and drains every subscriber queue.
    fn subscriber_listener(&self) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let set = SubscriberSet::new(self.subscribers.clone());

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        let last = ev.kind == EventKind::SupervisorStopped;
                        set.emit(&ev);
                        if last {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event listener lagged behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            set.shutdown().await;
        })
    }

    fn spawn_signal_watcher(&self, mut signals: ShutdownSignals) {
        let bus = self.bus.clone();
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = signals.recv() => request_shutdown(&bus, &token, "signal"),
                _ = token.cancelled() => {}
            }
        });
    }
}

/// Waits for the listener to drain; a failed listener is logged, not propagated.
async fn join_listener(listener: JoinHandle<()>) -> bool {
    match listener.await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "event listener task failed");
            false
        }
    }
}

fn request_shutdown(bus: &Bus, token: &CancellationToken, reason: &'static str) {
    if token.is_cancelled() {
        return;
    }
    bus.publish(Event::new(EventKind::ShutdownRequested).with_reason(reason));
    token.cancel();
}
