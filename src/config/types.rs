//! Root configuration type.

use serde::{Deserialize, Serialize};

use super::defaults::{default_port, default_public_addr};
use super::logging::LoggingConfig;
use super::server::HubConfig;
use super::storage::StorageConfig;

/// Root configuration for the hub server.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// TCP port the hub listens on (binds 0.0.0.0).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Address advertised to clients in GAME_LAUNCH_EVENT.
    #[serde(default = "default_public_addr")]
    pub public_addr: String,
    #[serde(default)]
    pub server: HubConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            public_addr: default_public_addr(),
            server: HubConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
