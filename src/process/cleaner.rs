//! # Stale process cleanup.
//!
//! When a run reports an identity conflict, processes left behind by earlier
//! runs usually still hold the peer identity. [`ProcessCleaner`] finds every
//! process whose command line contains one of the configured patterns and
//! stops it:
//!
//! ```text
//! scan ──► SIGTERM all matches ──► sleep(grace) ──► rescan
//!                                                    ├─ none left ──► done
//!                                                    └─ survivors ──► SIGKILL ──► sleep(settle)
//! ```
//!
//! Cleanup is best-effort. Nothing matching is a success, and failures to
//! signal a process are collected in [`CleanupReport::warnings`] instead of
//! being returned as errors. The supervisor's own process is never a target.

use std::time::Duration;

use async_trait::async_trait;
use sysinfo::{ProcessRefreshKind, System, UpdateKind};
use tracing::debug;

/// Settings of the stale process cleanup.
#[derive(Debug, Clone)]
pub struct CleanerConfig {
    /// Substrings searched for in process command lines.
    pub patterns: Vec<String>,
    /// Wait between the terminate signal and the rescan.
    pub grace: Duration,
    /// Wait after force-killing survivors.
    pub settle: Duration,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            patterns: vec!["gensyn".into(), "hivemind".into()],
            grace: Duration::from_secs(2),
            settle: Duration::from_secs(1),
        }
    }
}

/// What a cleanup pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Processes that were sent a terminate signal.
    pub terminated: Vec<u32>,
    /// Processes that survived the grace period and were force-killed.
    pub force_killed: Vec<u32>,
    /// Non-fatal problems met along the way.
    pub warnings: Vec<String>,
}

impl CleanupReport {
    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        if self.terminated.is_empty() && self.force_killed.is_empty() {
            return "no matching processes".to_string();
        }
        format!(
            "terminated={} force_killed={}",
            self.terminated.len(),
            self.force_killed.len()
        )
    }
}

/// Removes processes that would conflict with the next run.
#[async_trait]
pub trait Cleanup: Send + Sync + 'static {
    /// Runs one cleanup pass. Never fails.
    async fn cleanup(&self) -> CleanupReport;
}

/// [`Cleanup`] implementation that scans the process table with `sysinfo`.
#[derive(Debug, Clone, Default)]
pub struct ProcessCleaner {
    config: CleanerConfig,
}

#[derive(Debug, Clone, Copy)]
enum Strength {
    Terminate,
    Kill,
}

impl ProcessCleaner {
    pub fn new(config: CleanerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    async fn scan(&self, report: &mut CleanupReport) -> Vec<u32> {
        let patterns = self.config.patterns.clone();
        let scanned = tokio::task::spawn_blocking(move || {
            let own = std::process::id();
            let mut sys = System::new();
            // Command lines are not loaded by a plain refresh.
            sys.refresh_processes_specifics(
                ProcessRefreshKind::new().with_cmd(UpdateKind::Always),
            );
            let table = sys.processes().iter().map(|(pid, p)| {
                let cmdline = if p.cmd().is_empty() {
                    p.name().to_string()
                } else {
                    p.cmd().join(" ")
                };
                (pid.as_u32(), cmdline)
            });
            select_targets(table, &patterns, own)
        })
        .await;

        match scanned {
            Ok(pids) => pids,
            Err(e) => {
                report.warnings.push(format!("process scan failed: {e}"));
                Vec::new()
            }
        }
    }

    fn signal_all(&self, pids: &[u32], strength: Strength, report: &mut CleanupReport) -> Vec<u32> {
        let mut signalled = Vec::with_capacity(pids.len());
        for &pid in pids {
            match send_signal(pid, strength) {
                Ok(()) => {
                    debug!(pid, ?strength, "signalled stale process");
                    signalled.push(pid);
                }
                Err(e) => report.warnings.push(format!("pid {pid}: {e}")),
            }
        }
        signalled
    }
}

#[async_trait]
impl Cleanup for ProcessCleaner {
    async fn cleanup(&self) -> CleanupReport {
        let mut report = CleanupReport::default();

        let targets = self.scan(&mut report).await;
        if targets.is_empty() {
            return report;
        }
        report.terminated = self.signal_all(&targets, Strength::Terminate, &mut report);

        tokio::time::sleep(self.config.grace).await;

        let survivors = self.scan(&mut report).await;
        if !survivors.is_empty() {
            report.force_killed = self.signal_all(&survivors, Strength::Kill, &mut report);
            tokio::time::sleep(self.config.settle).await;
        }
        report
    }
}

/// Returns true if `cmdline` contains any of `patterns`.
pub fn matches_patterns(cmdline: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|p| !p.is_empty() && cmdline.contains(p.as_str()))
}

fn select_targets(
    table: impl IntoIterator<Item = (u32, String)>,
    patterns: &[String],
    exclude: u32,
) -> Vec<u32> {
    let mut pids: Vec<u32> = table
        .into_iter()
        .filter(|(pid, cmdline)| *pid != exclude && matches_patterns(cmdline, patterns))
        .map(|(pid, _)| pid)
        .collect();
    pids.sort_unstable();
    pids
}

#[cfg(unix)]
fn send_signal(pid: u32, strength: Strength) -> Result<(), String> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| "pid out of range".to_string())?;
    let sig = match strength {
        Strength::Terminate => Signal::SIGTERM,
        Strength::Kill => Signal::SIGKILL,
    };
    match kill(Pid::from_raw(raw), sig) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(format!("{sig:?} failed: {e}")),
    }
}

#[cfg(not(unix))]
fn send_signal(pid: u32, _strength: Strength) -> Result<(), String> {
    let pid = sysinfo::Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_process(pid);
    match sys.process(pid) {
        Some(p) if p.kill() => Ok(()),
        Some(_) => Err("kill failed".to_string()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(p: &[&str]) -> Vec<String> {
        p.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn pattern_matching_is_substring_based() {
        let pats = patterns(&["gensyn", "hivemind"]);
        assert!(matches_patterns(
            "python -m hivemind_exp.gsm8k.train_single_gpu",
            &pats
        ));
        assert!(matches_patterns("/opt/gensyn/node --run", &pats));
        assert!(!matches_patterns("python train.py", &pats));
        assert!(!matches_patterns("anything", &patterns(&[""])));
    }

    #[test]
    fn own_process_is_never_a_target() {
        let pats = patterns(&["hivemind"]);
        let table = vec![
            (10, "python -m hivemind_exp".to_string()),
            (11, "swarmvisor --config hivemind.yaml".to_string()),
            (12, "bash".to_string()),
            (3, "hivemind-p2pd".to_string()),
        ];
        assert_eq!(select_targets(table, &pats, 11), vec![3, 10]);
    }

    #[test]
    fn summary_mentions_counts() {
        assert_eq!(CleanupReport::default().summary(), "no matching processes");
        let report = CleanupReport {
            terminated: vec![1, 2],
            force_killed: vec![2],
            warnings: vec![],
        };
        assert_eq!(report.summary(), "terminated=2 force_killed=1");
    }

    #[tokio::test]
    async fn nothing_matching_is_success() {
        let cleaner = ProcessCleaner::new(CleanerConfig {
            patterns: patterns(&["swarmvisor-no-such-process-7f3a9c"]),
            grace: Duration::from_millis(10),
            settle: Duration::from_millis(10),
        });
        let report = cleaner.cleanup().await;
        assert_eq!(report, CleanupReport::default());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn terminates_matching_process() {
        let tag = format!("swarmvisor-cleaner-test-{}", std::process::id());
        let mut child = tokio::process::Command::new("sh")
            .args(["-c", "while :; do sleep 1; done", tag.as_str()])
            .kill_on_drop(true)
            .spawn()
            .expect("spawn sh");
        let pid = child.id().expect("pid");
        tokio::time::sleep(Duration::from_millis(200)).await;

        let cleaner = ProcessCleaner::new(CleanerConfig {
            patterns: vec![tag],
            grace: Duration::from_millis(200),
            settle: Duration::from_millis(50),
        });
        let report = cleaner.cleanup().await;

        assert!(report.terminated.contains(&pid), "report: {report:?}");
        let status = child.wait().await.expect("wait");
        assert!(!status.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn pattern_only_in_arguments_is_found() {
        let tag = format!("swarmvisor-args-only-{}", std::process::id());
        let mut child = tokio::process::Command::new("sh")
            .args(["-c", "while :; do sleep 1; done", tag.as_str()])
            .kill_on_drop(true)
            .spawn()
            .expect("spawn sh");
        let pid = child.id().expect("pid");
        tokio::time::sleep(Duration::from_millis(200)).await;

        let cleaner = ProcessCleaner::new(CleanerConfig {
            patterns: vec![tag.clone()],
            grace: Duration::from_millis(200),
            settle: Duration::from_millis(50),
        });
        let mut report = CleanupReport::default();
        let found = cleaner.scan(&mut report).await;

        assert!(found.contains(&pid), "scan: {found:?} warnings: {:?}", report.warnings);
        assert!(report.warnings.is_empty());

        let mut sys = System::new();
        sys.refresh_processes_specifics(ProcessRefreshKind::new());
        if let Some(p) = sys.process(sysinfo::Pid::from_u32(pid)) {
            assert!(!p.name().contains(tag.as_str()), "name: {}", p.name());
        }

        child.kill().await.expect("kill");
    }
}
