//! # Swarm options → run configuration.
//!
//! [`SwarmOptions`] holds the user-facing settings of a training node (flags of
//! the binary). [`SwarmOptions::resolve`] validates them, fills in defaults that
//! depend on the swarm size and hardware, and produces the immutable
//! [`RunConfiguration`] the supervisor launches.

use std::path::PathBuf;

use clap::Args;

use crate::error::ConfigError;
use crate::process::{DEFAULT_ENTRYPOINT, NetworkMode, RunConfiguration};

/// Public multiaddr announced in local peering mode.
pub const DEFAULT_PUBLIC_MADDR: &str =
    "/ip4/38.101.215.13/tcp/30002/p2p/QmQ2gEXoPJg6iMBSUFWGzAabS2VhnzuS782Y637hGjfsRJ";
/// Bootstrap peer in local peering mode.
pub const DEFAULT_PEER_MADDR: &str =
    "/ip4/38.101.215.13/tcp/30002/p2p/QmQ2gEXoPJg6iMBSUFWGzAabS2VhnzuS782Y637hGjfsRJ";
/// Listen address of the node.
pub const DEFAULT_HOST_MADDR: &str = "/ip4/0.0.0.0/tcp/38331";

pub const SMALL_SWARM_CONTRACT: &str = "0x69C6e1D608ec64885E7b185d39b04B491a71768C";
pub const BIG_SWARM_CONTRACT: &str = "0x6947c6E196a48B77eFa9331EC1E3e45f3Ee5Fd58";

/// Supported model sizes, in billions of parameters.
pub const MODEL_SIZES: &[&str] = &["0.5", "1.5", "7", "32", "72"];
/// Supported game types.
pub const GAMES: &[&str] = &["gsm8k", "dapo"];

const CONFIG_ROOT: &str = "hivemind_exp/configs";

/// Settings of a training node.
#[derive(Debug, Clone, Args)]
pub struct SwarmOptions {
    /// HuggingFace access token ("None" disables uploads)
    #[arg(long, default_value = "None")]
    pub hf_token: String,

    /// Modal org id; joins the testnet when set
    #[arg(long)]
    pub org_id: Option<String>,

    /// Path to the identity PEM
    #[arg(long, default_value = "swarm.pem")]
    pub identity_path: PathBuf,

    /// Override the swarm contract address
    #[arg(long)]
    pub contract_address: Option<String>,

    /// Game type (gsm8k or dapo); defaults by swarm size
    #[arg(long)]
    pub game: Option<String>,

    /// Path to the trainer YAML config; derived from model size when omitted
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// Parameter count in billions (0.5, 1.5, 7, 32, 72)
    #[arg(long, default_value = "0.5")]
    pub model_size: String,

    /// Join the big swarm (Math Hard)
    #[arg(long)]
    pub big_swarm: bool,

    /// Force CPU-only mode
    #[arg(long)]
    pub cpu_only: bool,
}

impl Default for SwarmOptions {
    fn default() -> Self {
        Self {
            hf_token: "None".into(),
            org_id: None,
            identity_path: PathBuf::from("swarm.pem"),
            contract_address: None,
            game: None,
            config_path: None,
            model_size: "0.5".into(),
            big_swarm: false,
            cpu_only: false,
        }
    }
}

impl SwarmOptions {
    /// Validates the options and resolves every default.
    ///
    /// `cpu_only_detected` is the result of hardware detection; either it or
    /// `--cpu-only` selects the CPU config.
    pub fn resolve(
        &self,
        interpreter: PathBuf,
        cpu_only_detected: bool,
    ) -> Result<RunConfiguration, ConfigError> {
        let game = self
            .game
            .clone()
            .unwrap_or_else(|| default_game(self.big_swarm).to_string());
        validate(&self.model_size, &game)?;

        let cpu_only = self.cpu_only || cpu_only_detected;
        let config_path = self
            .config_path
            .clone()
            .unwrap_or_else(|| default_config_path(&self.model_size, cpu_only));

        let network = match self.org_id.as_deref().filter(|id| !id.is_empty()) {
            Some(org_id) => NetworkMode::Testnet {
                org_id: org_id.to_string(),
                contract_address: self
                    .contract_address
                    .clone()
                    .unwrap_or_else(|| default_contract(self.big_swarm).to_string()),
            },
            None => NetworkMode::Local {
                public_maddr: DEFAULT_PUBLIC_MADDR.into(),
                initial_peers: DEFAULT_PEER_MADDR.into(),
                host_maddr: DEFAULT_HOST_MADDR.into(),
            },
        };

        Ok(RunConfiguration {
            interpreter,
            entrypoint: DEFAULT_ENTRYPOINT.iter().map(|s| s.to_string()).collect(),
            hf_token: self.hf_token.clone(),
            identity_path: self.identity_path.clone(),
            config_path,
            game,
            param_b: self.model_size.clone(),
            network,
        })
    }
}

/// Checks model size and game against the supported values.
pub fn validate(model_size: &str, game: &str) -> Result<(), ConfigError> {
    if !MODEL_SIZES.contains(&model_size) {
        return Err(ConfigError::InvalidModelSize {
            value: model_size.to_string(),
            allowed: MODEL_SIZES,
        });
    }
    if !GAMES.contains(&game) {
        return Err(ConfigError::InvalidGame {
            value: game.to_string(),
            allowed: GAMES,
        });
    }
    Ok(())
}

/// Trainer config for a model size.
///
/// CPU-only nodes always get the small mac config; 32B and 72B models use the
/// 4-bit quantized configs; unknown sizes fall back to 0.5B.
pub fn default_config_path(model_size: &str, cpu_only: bool) -> PathBuf {
    let root = PathBuf::from(CONFIG_ROOT);
    if cpu_only {
        return root.join("mac").join("grpo-qwen-2.5-0.5b-deepseek-r1.yaml");
    }
    let file = match model_size {
        "32" | "72" => format!("grpo-qwen-2.5-{model_size}b-bnb-4bit-deepseek-r1.yaml"),
        "0.5" | "1.5" | "7" => format!("grpo-qwen-2.5-{model_size}b-deepseek-r1.yaml"),
        _ => "grpo-qwen-2.5-0.5b-deepseek-r1.yaml".to_string(),
    };
    root.join("gpu").join(file)
}

fn default_game(big_swarm: bool) -> &'static str {
    if big_swarm { "dapo" } else { "gsm8k" }
}

fn default_contract(big_swarm: bool) -> &'static str {
    if big_swarm {
        BIG_SWARM_CONTRACT
    } else {
        SMALL_SWARM_CONTRACT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python() -> PathBuf {
        PathBuf::from(".venv/bin/python")
    }

    #[test]
    fn defaults_resolve_to_local_small_swarm() {
        let cfg = SwarmOptions::default()
            .resolve(python(), false)
            .expect("valid");

        assert_eq!(cfg.game, "gsm8k");
        assert_eq!(cfg.param_b, "0.5");
        assert_eq!(cfg.identity_path, PathBuf::from("swarm.pem"));
        assert_eq!(
            cfg.config_path,
            PathBuf::from("hivemind_exp/configs/gpu/grpo-qwen-2.5-0.5b-deepseek-r1.yaml")
        );
        assert_eq!(
            cfg.network,
            NetworkMode::Local {
                public_maddr: DEFAULT_PUBLIC_MADDR.into(),
                initial_peers: DEFAULT_PEER_MADDR.into(),
                host_maddr: DEFAULT_HOST_MADDR.into(),
            }
        );
    }

    #[test]
    fn org_id_switches_to_testnet_with_contract_by_swarm_size() {
        let opts = SwarmOptions {
            org_id: Some("org-42".into()),
            big_swarm: true,
            ..SwarmOptions::default()
        };
        let cfg = opts.resolve(python(), false).expect("valid");

        assert_eq!(cfg.game, "dapo");
        assert_eq!(
            cfg.network,
            NetworkMode::Testnet {
                org_id: "org-42".into(),
                contract_address: BIG_SWARM_CONTRACT.into(),
            }
        );
    }

    #[test]
    fn empty_org_id_stays_local_and_override_wins() {
        let local = SwarmOptions {
            org_id: Some(String::new()),
            ..SwarmOptions::default()
        };
        assert!(matches!(
            local.resolve(python(), false).expect("valid").network,
            NetworkMode::Local { .. }
        ));

        let custom = SwarmOptions {
            org_id: Some("org".into()),
            contract_address: Some("0xfeed".into()),
            ..SwarmOptions::default()
        };
        match custom.resolve(python(), false).expect("valid").network {
            NetworkMode::Testnet {
                contract_address, ..
            } => assert_eq!(contract_address, "0xfeed"),
            other => panic!("unexpected network: {other:?}"),
        }
    }

    #[test]
    fn config_path_by_hardware_and_size() {
        assert_eq!(
            default_config_path("7", true),
            PathBuf::from("hivemind_exp/configs/mac/grpo-qwen-2.5-0.5b-deepseek-r1.yaml")
        );
        assert_eq!(
            default_config_path("1.5", false),
            PathBuf::from("hivemind_exp/configs/gpu/grpo-qwen-2.5-1.5b-deepseek-r1.yaml")
        );
        assert_eq!(
            default_config_path("72", false),
            PathBuf::from("hivemind_exp/configs/gpu/grpo-qwen-2.5-72b-bnb-4bit-deepseek-r1.yaml")
        );
        assert_eq!(
            default_config_path("13", false),
            PathBuf::from("hivemind_exp/configs/gpu/grpo-qwen-2.5-0.5b-deepseek-r1.yaml")
        );
    }

    #[test]
    fn detected_cpu_and_explicit_path() {
        let detected = SwarmOptions::default()
            .resolve(python(), true)
            .expect("valid");
        assert!(detected.config_path.starts_with("hivemind_exp/configs/mac"));

        let explicit = SwarmOptions {
            config_path: Some(PathBuf::from("my.yaml")),
            cpu_only: true,
            ..SwarmOptions::default()
        };
        assert_eq!(
            explicit.resolve(python(), false).expect("valid").config_path,
            PathBuf::from("my.yaml")
        );
    }

    #[test]
    fn rejects_unknown_model_size_and_game() {
        let bad_size = SwarmOptions {
            model_size: "3".into(),
            ..SwarmOptions::default()
        };
        assert_eq!(
            bad_size.resolve(python(), false),
            Err(ConfigError::InvalidModelSize {
                value: "3".into(),
                allowed: MODEL_SIZES,
            })
        );

        let bad_game = SwarmOptions {
            game: Some("chess".into()),
            ..SwarmOptions::default()
        };
        let err = bad_game.resolve(python(), false).expect_err("invalid");
        assert_eq!(err.as_label(), "config_invalid_game");
    }
}
