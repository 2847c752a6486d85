use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ZionConfig {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub emission: EmissionConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NodeConfig {
    pub rpc_port: u16,
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

fn default_snapshot_path() -> String {
    "./data/ledger.json".to_string()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_port: 8000,
            snapshot_path: default_snapshot_path(),
        }
    }
}

/// Genesis yield: who receives new supply, how much, how often.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmissionConfig {
    pub architect_wallet: String,
    #[serde(default = "default_architect_alias")]
    pub architect_alias: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub reward: Decimal,
    pub interval_secs: u64,
}

fn default_architect_alias() -> String {
    "@architect".to_string()
}

impl Default for EmissionConfig {
    fn default() -> Self {
        Self {
            architect_wallet: "0xF497FFEB".to_string(),
            architect_alias: default_architect_alias(),
            reward: Decimal::ONE,
            interval_secs: 3600,
        }
    }
}

impl EmissionConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl ZionConfig {
    pub fn load_or_default(path: &str) -> Self {
        if Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => {
                        info!("Config loaded from {}", path);
                        c
                    }
                    Err(e) => {
                        warn!("Error parsing config: {}. Using Defaults.", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!("Error reading config: {}. Using Defaults.", e);
                    Self::default()
                }
            }
        } else {
            info!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            match toml::to_string_pretty(&config) {
                Ok(s) => {
                    if let Err(e) = std::fs::write(path, s) {
                        warn!("Could not write default config to {}: {}", path, e);
                    }
                }
                Err(e) => warn!("Could not render default config: {}", e),
            }
            config
        }
    }
}
