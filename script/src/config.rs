//! Pool configuration for the CLI.
//!
//! Resolution order:
//!   1. `--config <path>` (JSON `PoolConfig`)
//!   2. `POOL_CONFIG` env var, same format
//!   3. `POOL_ADDRESS`, `POOL_VKEY`, `POOL_DENOMINATION` env vars
//!
//! A `.env` file in the working directory is loaded first.

use std::path::{Path, PathBuf};

use alloy_primitives::{Address, B256, U256};
use anyhow::{Context, Result};
use privacy_pool_lib::PoolConfig;

pub fn load(path: Option<&Path>) -> Result<PoolConfig> {
    dotenv::dotenv().ok();

    let path = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var("POOL_CONFIG").ok().map(PathBuf::from));

    match path {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            from_json(&json).with_context(|| format!("Invalid config file: {}", path.display()))
        }
        None => from_env(),
    }
}

pub fn from_json(json: &str) -> Result<PoolConfig> {
    Ok(serde_json::from_str(json)?)
}

fn from_env() -> Result<PoolConfig> {
    let address: Address = std::env::var("POOL_ADDRESS")
        .context("POOL_ADDRESS not set")?
        .parse()
        .context("POOL_ADDRESS must be a 20-byte hex address")?;
    let verification_key: B256 = std::env::var("POOL_VKEY")
        .context("POOL_VKEY not set")?
        .parse()
        .context("POOL_VKEY must be a 32-byte hex value")?;
    let denomination: U256 = std::env::var("POOL_DENOMINATION")
        .context("POOL_DENOMINATION not set")?
        .parse()
        .context("POOL_DENOMINATION must be an integer")?;

    Ok(PoolConfig {
        address,
        verification_key,
        denomination,
    })
}
