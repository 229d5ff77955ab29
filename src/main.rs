use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use swarmvisor::process::NetworkMode;
use swarmvisor::training::{SwarmOptions, bootstrap};
use swarmvisor::{BuildInfo, FileLog, LogWriter, Subscribe, Supervisor, SupervisorConfig};

/// Keeps a swarm training node running: restarts it on exit, backs off on
/// failures and cleans up stale processes on identity conflicts.
#[derive(Parser, Debug)]
#[command(name = "swarmvisor", about, long_about = None, disable_version_flag = true)]
struct Args {
    #[command(flatten)]
    swarm: SwarmOptions,

    /// Virtualenv directory (created with python3 -m venv if missing)
    #[arg(long, value_name = "DIR", default_value = "venv")]
    venv: PathBuf,

    /// Requirements file installed into the virtualenv
    #[arg(long, value_name = "FILE", default_value = bootstrap::DEFAULT_REQUIREMENTS)]
    requirements: PathBuf,

    /// Skip virtualenv creation and requirements installation
    #[arg(long)]
    skip_install: bool,

    /// Append-only event log
    #[arg(long, value_name = "FILE", default_value = "logs/swarmvisor.log")]
    log_file: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Print version and build information
    #[arg(short = 'V', long)]
    version: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let build = BuildInfo::current();

    if args.version {
        println!("swarmvisor {build}");
        return Ok(());
    }

    initialize_logging(args.debug);
    info!("starting swarmvisor ({build})");

    let python = bootstrap::venv_interpreter(&args.venv);
    if !args.skip_install {
        bootstrap::ensure_python_version()
            .await
            .context("system python3 is not usable")?;
        bootstrap::ensure_venv(&args.venv)
            .await
            .with_context(|| format!("failed to create virtualenv {}", args.venv.display()))?;
    }
    bootstrap::ensure_interpreter(&python)?;
    if !args.skip_install {
        bootstrap::install_requirements(&python, &args.requirements)
            .await
            .context("failed to install requirements")?;
    }

    let cpu_only = args.swarm.cpu_only || bootstrap::detect_cpu_only().await;
    let run = args
        .swarm
        .resolve(python, cpu_only)
        .context("invalid configuration")?;

    let mode = match &run.network {
        NetworkMode::Testnet { .. } => "testnet",
        NetworkMode::Local { .. } => "local",
    };
    info!(
        mode,
        game = %run.game,
        model_size = %run.param_b,
        config = %run.config_path.display(),
        cpu_only,
        "resolved run configuration"
    );

    let file_log = FileLog::open(&args.log_file)
        .with_context(|| format!("failed to open log file {}", args.log_file.display()))?;
    info!("event log: {}", file_log.path().display());

    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new()), Arc::new(file_log)];
    let supervisor = Supervisor::builder(SupervisorConfig::default())
        .with_subscribers(subscribers)
        .with_build_info(build)
        .build();

    supervisor.run(&run).await?;
    info!("swarmvisor stopped");
    Ok(())
}

fn initialize_logging(debug: bool) {
    let filter = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
