//! # Run configuration of the training process.
//!
//! [`RunConfiguration`] is resolved once at startup and borrowed by every launch.
//! It turns into the command line of the child via [`RunConfiguration::command_args`].

use std::ffi::OsString;
use std::path::PathBuf;

/// Default module invocation of the trainer.
pub const DEFAULT_ENTRYPOINT: &[&str] = &["-m", "hivemind_exp.gsm8k.train_single_gpu"];

/// How the trainer joins the swarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkMode {
    /// Coordinated through the on-chain testnet.
    Testnet {
        org_id: String,
        contract_address: String,
    },
    /// Direct peering over multiaddrs.
    Local {
        public_maddr: String,
        initial_peers: String,
        host_maddr: String,
    },
}

/// Fully-resolved, immutable description of what to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    /// Interpreter executable (usually the virtualenv python).
    pub interpreter: PathBuf,
    /// Leading arguments selecting the module to run.
    pub entrypoint: Vec<String>,
    pub hf_token: String,
    pub identity_path: PathBuf,
    pub config_path: PathBuf,
    pub game: String,
    /// Model size in billions of parameters, as given on the command line.
    pub param_b: String,
    pub network: NetworkMode,
}

impl RunConfiguration {
    /// Arguments passed to the interpreter, in order.
    pub fn command_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.entrypoint.iter().map(OsString::from).collect();

        args.push("--hf_token".into());
        args.push(self.hf_token.clone().into());
        args.push("--identity_path".into());
        args.push(self.identity_path.clone().into_os_string());
        args.push("--config".into());
        args.push(self.config_path.clone().into_os_string());
        args.push("--game".into());
        args.push(self.game.clone().into());
        args.push("--param_b".into());
        args.push(self.param_b.clone().into());

        match &self.network {
            NetworkMode::Testnet {
                org_id,
                contract_address,
            } => {
                args.push("--modal_org_id".into());
                args.push(org_id.into());
                args.push("--contract_address".into());
                args.push(contract_address.into());
            }
            NetworkMode::Local {
                public_maddr,
                initial_peers,
                host_maddr,
            } => {
                args.push("--public_maddr".into());
                args.push(public_maddr.into());
                args.push("--initial_peers".into());
                args.push(initial_peers.into());
                args.push("--host_maddr".into());
                args.push(host_maddr.into());
            }
        }
        args
    }

    /// Program name for diagnostics.
    pub fn program(&self) -> String {
        self.interpreter.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(network: NetworkMode) -> RunConfiguration {
        RunConfiguration {
            interpreter: PathBuf::from(".venv/bin/python"),
            entrypoint: DEFAULT_ENTRYPOINT.iter().map(|s| s.to_string()).collect(),
            hf_token: "None".into(),
            identity_path: PathBuf::from("swarm.pem"),
            config_path: PathBuf::from("cfg.yaml"),
            game: "gsm8k".into(),
            param_b: "0.5".into(),
            network,
        }
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn testnet_arguments() {
        let args = strings(
            config(NetworkMode::Testnet {
                org_id: "org-1".into(),
                contract_address: "0xabc".into(),
            })
            .command_args(),
        );
        assert_eq!(
            args,
            [
                "-m",
                "hivemind_exp.gsm8k.train_single_gpu",
                "--hf_token",
                "None",
                "--identity_path",
                "swarm.pem",
                "--config",
                "cfg.yaml",
                "--game",
                "gsm8k",
                "--param_b",
                "0.5",
                "--modal_org_id",
                "org-1",
                "--contract_address",
                "0xabc",
            ]
        );
    }

    #[test]
    fn local_arguments_end_with_multiaddrs() {
        let args = strings(
            config(NetworkMode::Local {
                public_maddr: "/ip4/1.2.3.4/tcp/1".into(),
                initial_peers: "/ip4/5.6.7.8/tcp/2".into(),
                host_maddr: "/ip4/0.0.0.0/tcp/3".into(),
            })
            .command_args(),
        );
        assert_eq!(
            &args[args.len() - 6..],
            [
                "--public_maddr",
                "/ip4/1.2.3.4/tcp/1",
                "--initial_peers",
                "/ip4/5.6.7.8/tcp/2",
                "--host_maddr",
                "/ip4/0.0.0.0/tcp/3",
            ]
        );
    }
}
