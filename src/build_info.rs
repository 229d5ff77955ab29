//! # Build metadata.
//!
//! [`BuildInfo`] is a static description of the running binary. It is handed to
//! the [`Supervisor`](crate::Supervisor) at construction and published in the
//! `SupervisorStarted` event, so every log file records which build produced it.
//!
//! `git_commit` and `build_date` come from the optional compile-time variables
//! `SWARMVISOR_GIT_COMMIT` and `SWARMVISOR_BUILD_DATE`.

use std::fmt;

const UNKNOWN: &str = "unknown";

/// Static build metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildInfo {
    /// Crate version.
    pub version: &'static str,
    /// Commit the binary was built from.
    pub git_commit: &'static str,
    /// Build date.
    pub build_date: &'static str,
}

impl BuildInfo {
    /// Metadata baked into this build.
    pub const fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            git_commit: match option_env!("SWARMVISOR_GIT_COMMIT") {
                Some(commit) => commit,
                None => UNKNOWN,
            },
            build_date: match option_env!("SWARMVISOR_BUILD_DATE") {
                Some(date) => date,
                None => UNKNOWN,
            },
        }
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "version={} commit={} built={}",
            self.version, self.git_commit, self.build_date
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_uses_package_version() {
        let info = BuildInfo::current();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert!(!info.git_commit.is_empty());
        assert!(info.to_string().starts_with("version="));
    }
}
