//! # Interpreter environment bootstrap.
//!
//! Prepares the Python side before supervision starts: a recent enough system
//! interpreter, a virtualenv, its interpreter, the trainer requirements, and
//! GPU detection. Every command
//! runs with inherited stdio so pip output is visible to the user.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::BootstrapError;

/// Requirements file installed when none is given.
pub const DEFAULT_REQUIREMENTS: &str = "requirements.txt";

/// Oldest `major.minor` the trainer runs on.
pub const MIN_PYTHON: (u32, u32) = (3, 10);

/// Checks that `python3 --version` reports at least [`MIN_PYTHON`].
pub async fn ensure_python_version() -> Result<(), BootstrapError> {
    let output = Command::new("python3")
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| BootstrapError::Command {
            program: "python3".to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(BootstrapError::StepFailed {
            step: "python version check",
            code: output.status.code(),
        });
    }

    // Python 2 prints its version on stderr.
    let raw = if output.stdout.is_empty() {
        output.stderr
    } else {
        output.stdout
    };
    let (major, minor) = check_python_version(&String::from_utf8_lossy(&raw))?;
    debug!(major, minor, "system python accepted");
    Ok(())
}

/// Parses `Python X.Y[.Z]` and rejects versions below [`MIN_PYTHON`].
fn check_python_version(output: &str) -> Result<(u32, u32), BootstrapError> {
    let trimmed = output.trim();
    let version = trimmed.strip_prefix("Python ").unwrap_or(trimmed);
    let unparsed = || BootstrapError::PythonVersionUnparsed {
        output: trimmed.to_string(),
    };

    let mut parts = version.split('.');
    let major: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(unparsed)?;
    let minor: u32 = parts
        .next()
        .map(|p| p.trim_end_matches(|c: char| !c.is_ascii_digit()))
        .and_then(|p| p.parse().ok())
        .ok_or_else(unparsed)?;

    if (major, minor) < MIN_PYTHON {
        return Err(BootstrapError::PythonTooOld {
            found: version.to_string(),
            required: "3.10",
        });
    }
    Ok((major, minor))
}

/// Interpreter inside a virtualenv.
pub fn venv_interpreter(venv: &Path) -> PathBuf {
    if cfg!(windows) {
        venv.join("Scripts").join("python.exe")
    } else {
        venv.join("bin").join("python")
    }
}

/// Creates the virtualenv with `python3 -m venv` unless the directory exists.
pub async fn ensure_venv(venv: &Path) -> Result<(), BootstrapError> {
    if venv.exists() {
        debug!(venv = %venv.display(), "virtualenv already present");
        return Ok(());
    }
    info!(venv = %venv.display(), "creating virtualenv");
    run_step(
        "virtualenv creation",
        "python3",
        [OsStr::new("-m"), OsStr::new("venv"), venv.as_os_str()],
    )
    .await
}

/// Fails with [`BootstrapError::InterpreterMissing`] if `interpreter` does not exist.
pub fn ensure_interpreter(interpreter: &Path) -> Result<(), BootstrapError> {
    if interpreter.is_file() {
        Ok(())
    } else {
        Err(BootstrapError::InterpreterMissing {
            path: interpreter.to_path_buf(),
        })
    }
}

/// Upgrades pip and installs `requirements` into the interpreter's environment.
pub async fn install_requirements(
    interpreter: &Path,
    requirements: &Path,
) -> Result<(), BootstrapError> {
    let program = interpreter.as_os_str();

    info!("upgrading pip");
    run_step(
        "pip upgrade",
        program,
        ["-m", "pip", "install", "--upgrade", "pip"],
    )
    .await?;

    info!(requirements = %requirements.display(), "installing requirements");
    run_step(
        "requirements install",
        program,
        [
            OsStr::new("-m"),
            OsStr::new("pip"),
            OsStr::new("install"),
            OsStr::new("-r"),
            requirements.as_os_str(),
        ],
    )
    .await
}

/// True when `nvidia-smi` cannot be run successfully.
pub async fn detect_cpu_only() -> bool {
    let status = Command::new("nvidia-smi")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match status {
        Ok(s) => !s.success(),
        Err(e) => {
            debug!(error = %e, "nvidia-smi unavailable");
            true
        }
    }
}

async fn run_step<I, S>(
    step: &'static str,
    program: impl AsRef<OsStr>,
    args: I,
) -> Result<(), BootstrapError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let program = program.as_ref();
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|source| BootstrapError::Command {
            program: program.to_string_lossy().into_owned(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(BootstrapError::StepFailed {
            step,
            code: status.code(),
        })
    }
}
