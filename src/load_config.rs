//! `load_config` module: loads the static YAML config and injects secrets from the
//! environment into [`SyncSettings`].
//!
//! # Environment
//! - `GOOGLE_ACCESS_TOKEN`: bearer token for the drive API
//! - `NOTION_TOKEN`: integration token for the document store
//!
//! A `.env` file is honoured when present. Secret values are never logged.
//!
//! # Errors
//! All errors use `anyhow::Error` and are surfaced at the CLI boundary.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{error, info};

use crate::config::{Config, Secrets, SyncSettings};

pub const GOOGLE_ACCESS_TOKEN_VAR: &str = "GOOGLE_ACCESS_TOKEN";
pub const NOTION_TOKEN_VAR: &str = "NOTION_TOKEN";

/// Reads and parses the YAML file only.
pub fn load_static_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = fs::read_to_string(path_ref).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e)
    })?;

    let config: Config = serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
        anyhow::anyhow!("Failed to parse config YAML: {e}")
    })?;

    if config.drive.folder_id.trim().is_empty() {
        anyhow::bail!("drive.folder_id must not be empty");
    }
    if config.notion.database_id.trim().is_empty() {
        anyhow::bail!("notion.database_id must not be empty");
    }

    config.trace_loaded();
    Ok(config)
}

/// Loads the YAML file and merges in secrets from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SyncSettings> {
    dotenvy::dotenv().ok();
    let config = load_static_config(path)?;

    let secrets = Secrets {
        google_access_token: required_env(GOOGLE_ACCESS_TOKEN_VAR)?,
        notion_token: required_env(NOTION_TOKEN_VAR)?,
    };
    info!(?secrets, "Secrets found in environment");

    Ok(SyncSettings { config, secrets })
}

fn required_env(key: &str) -> Result<String> {
    let value = std::env::var(key)
        .map_err(|e| {
            error!(error = ?e, var = key, "Environment variable not set");
            e
        })
        .with_context(|| format!("{key} environment variable not set"))?;
    if value.trim().is_empty() {
        error!(var = key, "Environment variable is empty");
        anyhow::bail!("{key} environment variable is empty");
    }
    Ok(value)
}
