//! Runtime configuration
//!
//! Values come from the environment (`TASKMASTER_API_URL`,
//! `TASKMASTER_TOKEN_FILE`) and may be overridden by command-line flags;
//! clap merges both before we get here.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::Cli;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

const APP_DIR: &str = "taskmaster";
const TOKEN_FILE: &str = "token";

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "taskmaster=info,tm_client=info,tm_core=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub token_file: PathBuf,
    pub json: bool,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let token_file = match &cli.token_file {
            Some(path) => path.clone(),
            None => default_token_file()?,
        };

        Ok(Self {
            api_url: cli.api_url.trim().to_string(),
            token_file,
            json: cli.json,
        })
    }
}

/// `<config dir>/taskmaster/token`
pub fn default_token_file() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine the user config directory")?;
    Ok(base.join(APP_DIR).join(TOKEN_FILE))
}
