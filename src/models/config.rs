use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

fn default_api_base() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_vs_currency() -> String {
    "usd".to_string()
}

fn default_page_size() -> u32 {
    25
}

fn default_search_limit() -> usize {
    25
}

fn default_refresh_interval() -> u64 {
    120
}

fn default_log_file() -> String {
    "coinmage.log".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_vs_currency")]
    pub vs_currency: String,
    /// Number of coins in the unfiltered list
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Maximum number of coins a search resolves to
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    /// Seconds between automatic refreshes of the unfiltered list, 0 disables
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base: default_api_base(),
            vs_currency: default_vs_currency(),
            page_size: default_page_size(),
            search_limit: default_search_limit(),
            refresh_interval: default_refresh_interval(),
            log_file: default_log_file(),
        }
    }
}

impl Config {
    /// Reads the config file, falling back to defaults when it does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(config_str) => serde_json::from_str(&config_str)
                .with_context(|| format!("invalid config file {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }
}
