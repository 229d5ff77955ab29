//! Training node setup: options resolution and interpreter bootstrap.
//!
//! - [`SwarmOptions`] → [`RunConfiguration`](crate::process::RunConfiguration)
//! - [`bootstrap`] virtualenv, interpreter check, requirements, GPU detection

pub mod bootstrap;
mod config;

pub use config::{
    BIG_SWARM_CONTRACT, DEFAULT_HOST_MADDR, DEFAULT_PEER_MADDR, DEFAULT_PUBLIC_MADDR, GAMES,
    MODEL_SIZES, SMALL_SWARM_CONTRACT, SwarmOptions, default_config_path, validate,
};
