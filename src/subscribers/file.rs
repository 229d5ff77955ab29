//! # FileLog: append-only event log on disk
//!
//! Writes one line per [`Event`] to a log file so a run history survives the
//! terminal session:
//!
//! ```text
//! 2026-10-19T09:12:03.512+00:00 run_starting attempt=4
//! 2026-10-19T09:14:47.020+00:00 run_exited attempt=4 outcome=generic_failure reason="..."
//! ```
//!
//! Writes are short and synchronous; each line is flushed before the next
//! event is taken from the queue.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local, SecondsFormat};
use parking_lot::Mutex;
use tracing::warn;

use crate::events::Event;
use crate::subscribers::Subscribe;
use crate::subscribers::log::render_fields;

/// Subscriber appending every event to a file.
pub struct FileLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileLog {
    /// Opens `path` for appending, creating the file and missing parent directories.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Formats one log line (without the trailing newline).
pub(crate) fn format_line(e: &Event) -> String {
    let at: DateTime<Local> = e.at.into();
    format!(
        "{} {}{}",
        at.to_rfc3339_opts(SecondsFormat::Millis, false),
        e.kind.as_label(),
        render_fields(e)
    )
}

#[async_trait]
impl Subscribe for FileLog {
    async fn on_event(&self, e: &Event) {
        let line = format_line(e);
        let mut file = self.file.lock();
        if let Err(err) = writeln!(file, "{line}").and_then(|()| file.flush()) {
            warn!(path = %self.path.display(), error = %err, "failed to write event log");
        }
    }

    fn name(&self) -> &'static str {
        "FileLog"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn appends_lines_and_creates_parent_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("logs").join("swarm.log");

        let log = FileLog::open(&path).expect("open");
        log.on_event(&Event::new(EventKind::RunStarting).with_attempt(1))
            .await;
        log.on_event(&Event::new(EventKind::RunExited).with_attempt(1).with_outcome("clean"))
            .await;
        drop(log);

        let reopened = FileLog::open(&path).expect("reopen");
        reopened
            .on_event(&Event::new(EventKind::SupervisorStopped))
            .await;

        let text = fs::read_to_string(&path).expect("read");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(" run_starting attempt=1"));
        assert!(lines[1].ends_with(" run_exited attempt=1 outcome=clean"));
        assert!(lines[2].ends_with(" supervisor_stopped"));
    }

    #[test]
    fn line_starts_with_rfc3339_timestamp() {
        let line = format_line(&Event::new(EventKind::CleanupFinished));
        let (ts, rest) = line.split_once(' ').expect("space");
        assert!(DateTime::parse_from_rfc3339(ts).is_ok(), "bad timestamp: {ts}");
        assert_eq!(rest, "cleanup_finished");
    }
}
