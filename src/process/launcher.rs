//! # Launching one run of the training process.
//!
//! [`ProcessLauncher`] starts the child described by a [`RunConfiguration`] and
//! drives it to completion:
//!
//! ```text
//! spawn(interpreter, args)   stdin: inherited, stdout/stderr: piped
//!   ├─► reader(stdout) ─► echo to our stdout ─► classify ─► MarkerMatched?
//!   ├─► reader(stderr) ─► echo to our stderr ─► classify ─► MarkerMatched?
//!   │          └──────────── shared ConflictFlag ──────────────┘
//!   ├─► wait() for exit
//!   ├─► join both readers (end of stream)
//!   └─► ExitOutcome::from_run(flag, status)
//! ```
//!
//! Spawn failures do not abort supervision: they come back as
//! [`ExitOutcome::GenericFailure`] and are retried with backoff.
//!
//! The child is not killed when the launch future is dropped.
//!
//! A run ends when the child has exited and both pipes reached end of stream.
//! A grandchild that inherited the pipes (a p2p daemon started by the trainer,
//! for instance) keeps them open, so the outcome is only reported once that
//! grandchild exits too.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ExitError;
use crate::events::{Bus, Event, EventKind};

use super::classifier::{ConflictFlag, OutputClassifier, StreamKind};
use super::outcome::ExitOutcome;
use super::spec::RunConfiguration;

/// Runs a single lifetime of the supervised process.
///
/// `attempt` is the 1-based run number; implementations publish run events
/// (spawned, marker matches) on `bus`.
#[async_trait]
pub trait Launch: Send + Sync + 'static {
    async fn launch(&self, config: &RunConfiguration, attempt: u64, bus: &Bus) -> ExitOutcome;
}

/// [`Launch`] implementation backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    classifier: Arc<OutputClassifier>,
    echo: bool,
}

impl ProcessLauncher {
    /// Creates a launcher that echoes child output to the console.
    pub fn new(classifier: OutputClassifier) -> Self {
        Self {
            classifier: Arc::new(classifier),
            echo: true,
        }
    }

    /// Enables or disables echoing child output to the console.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    fn spawn_reader<R>(
        &self,
        pipe: Option<R>,
        stream: StreamKind,
        flag: &ConflictFlag,
        bus: &Bus,
        attempt: u64,
    ) -> Option<JoinHandle<()>>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let reader = StreamReader {
            stream,
            classifier: Arc::clone(&self.classifier),
            flag: flag.clone(),
            bus: bus.clone(),
            attempt,
            echo: self.echo,
        };
        pipe.map(|p| tokio::spawn(reader.run(p)))
    }
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self::new(OutputClassifier::default())
    }
}

#[async_trait]
impl Launch for ProcessLauncher {
    async fn launch(&self, config: &RunConfiguration, attempt: u64, bus: &Bus) -> ExitOutcome {
        let mut cmd = Command::new(&config.interpreter);
        cmd.args(config.command_args())
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                return ExitOutcome::GenericFailure(ExitError::Spawn {
                    program: config.program(),
                    source,
                });
            }
        };

        let mut spawned = Event::new(EventKind::ChildSpawned).with_attempt(attempt);
        if let Some(pid) = child.id() {
            spawned = spawned.with_pid(pid);
        }
        bus.publish(spawned);

        let flag = ConflictFlag::new();
        let readers: Vec<JoinHandle<()>> = [
            self.spawn_reader(child.stdout.take(), StreamKind::Stdout, &flag, bus, attempt),
            self.spawn_reader(child.stderr.take(), StreamKind::Stderr, &flag, bus, attempt),
        ]
        .into_iter()
        .flatten()
        .collect();

        let status = child.wait().await.map_err(|source| ExitError::Wait { source });

        for reader in readers {
            if let Err(e) = reader.await {
                warn!(error = %e, "output reader task failed");
            }
        }

        ExitOutcome::from_run(flag.is_raised(), status)
    }
}

/// Reads one pipe of the child line by line until end of stream.
struct StreamReader {
    stream: StreamKind,
    classifier: Arc<OutputClassifier>,
    flag: ConflictFlag,
    bus: Bus,
    attempt: u64,
    echo: bool,
}

impl StreamReader {
    async fn run<R>(self, pipe: R)
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(stream = %self.stream, error = %e, "failed to read child output");
                    break;
                }
            }

            if self.echo {
                self.forward(&buf).await;
            }

            let text = String::from_utf8_lossy(&buf);
            let line = text.trim_end_matches(['\n', '\r']);
            if let Some(marker) = self.classifier.find(line) {
                if self.flag.raise() {
                    debug!(stream = %self.stream, marker = %marker.kind, "first marker of run");
                }
                self.bus.publish(
                    Event::new(EventKind::MarkerMatched)
                        .with_attempt(self.attempt)
                        .with_stream(self.stream)
                        .with_marker(marker.kind)
                        .with_reason(line),
                );
            }
        }
    }

    async fn forward(&self, bytes: &[u8]) {
        let res = match self.stream {
            StreamKind::Stdout => {
                let mut out = tokio::io::stdout();
                match out.write_all(bytes).await {
                    Ok(()) => out.flush().await,
                    Err(e) => Err(e),
                }
            }
            StreamKind::Stderr => {
                let mut out = tokio::io::stderr();
                match out.write_all(bytes).await {
                    Ok(()) => out.flush().await,
                    Err(e) => Err(e),
                }
            }
        };
        if let Err(e) = res {
            debug!(stream = %self.stream, error = %e, "failed to echo child output");
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::process::{MarkerKind, NetworkMode};
    use std::path::PathBuf;
    use std::time::Duration;

    fn sh(script: &str) -> RunConfiguration {
        RunConfiguration {
            interpreter: PathBuf::from("sh"),
            entrypoint: vec!["-c".into(), script.into()],
            hf_token: "None".into(),
            identity_path: PathBuf::from("swarm.pem"),
            config_path: PathBuf::from("cfg.yaml"),
            game: "gsm8k".into(),
            param_b: "0.5".into(),
            network: NetworkMode::Local {
                public_maddr: "/ip4/127.0.0.1/tcp/1".into(),
                initial_peers: "/ip4/127.0.0.1/tcp/1".into(),
                host_maddr: "/ip4/0.0.0.0/tcp/1".into(),
            },
        }
    }

    fn launcher() -> ProcessLauncher {
        ProcessLauncher::default().with_echo(false)
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[tokio::test]
    async fn clean_exit_without_markers() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();

        let outcome = launcher()
            .launch(&sh("echo step 1; echo step 2; exit 0"), 1, &bus)
            .await;
        assert!(outcome.is_clean());

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::ChildSpawned);
        assert!(events[0].pid.is_some());
    }

    #[tokio::test]
    async fn non_zero_exit_is_generic_failure() {
        let bus = Bus::new(16);
        match launcher().launch(&sh("echo working; exit 7"), 1, &bus).await {
            ExitOutcome::GenericFailure(ExitError::Exited { code }) => assert_eq!(code, Some(7)),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn conflict_on_stderr_is_detected() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();

        let outcome = launcher()
            .launch(
                &sh("echo 'peer Qm1 is already taken by another user' >&2; exit 1"),
                4,
                &bus,
            )
            .await;
        assert!(matches!(outcome, ExitOutcome::IdentityConflict));

        let matched: Vec<Event> = drain(&mut rx)
            .into_iter()
            .filter(|e| e.kind == EventKind::MarkerMatched)
            .collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].attempt, Some(4));
        assert_eq!(matched[0].stream, Some(StreamKind::Stderr));
        assert_eq!(matched[0].marker, Some(MarkerKind::IdentityConflict));
        assert_eq!(
            matched[0].reason.as_deref(),
            Some("peer Qm1 is already taken by another user")
        );
    }

    #[tokio::test]
    async fn marker_wins_over_successful_exit() {
        let bus = Bus::new(16);
        let outcome = launcher()
            .launch(&sh("echo 'Traceback: (most recent call last)'; exit 0"), 1, &bus)
            .await;
        assert!(matches!(outcome, ExitOutcome::IdentityConflict));
    }

    #[tokio::test]
    async fn markers_on_both_streams_keep_one_outcome() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();

        let outcome = launcher()
            .launch(&sh("echo 'Error: a'; echo 'Exception: b' >&2; exit 2"), 1, &bus)
            .await;
        assert!(matches!(outcome, ExitOutcome::IdentityConflict));

        let matched = drain(&mut rx)
            .into_iter()
            .filter(|e| e.kind == EventKind::MarkerMatched)
            .count();
        assert_eq!(matched, 2);
    }

    #[tokio::test]
    async fn outcome_waits_for_grandchild_holding_pipes() {
        let bus = Bus::new(16);
        let started = std::time::Instant::now();

        let outcome = launcher()
            .launch(&sh("sleep 1 & echo bye; exit 1"), 1, &bus)
            .await;

        assert!(started.elapsed() >= Duration::from_millis(900));
        match outcome {
            ExitOutcome::GenericFailure(ExitError::Exited { code }) => assert_eq!(code, Some(1)),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_interpreter_is_generic_failure() {
        let bus = Bus::new(16);
        let mut config = sh("exit 0");
        config.interpreter = PathBuf::from("/nonexistent/swarmvisor/python");

        match launcher().launch(&config, 1, &bus).await {
            ExitOutcome::GenericFailure(err @ ExitError::Spawn { .. }) => {
                assert_eq!(err.as_label(), "exit_spawn_failed");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
