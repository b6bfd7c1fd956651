//! Configuration for the hub server.
//!
//! Configuration is loaded from `config.json` (path overridable via
//! `GAME_HUB_CONFIG_PATH`), with individual fields overridable through
//! `GAME_HUB__`-prefixed environment variables using `__` as the nested
//! separator, e.g. `GAME_HUB__PORT=12365` or `GAME_HUB__LOGGING__LEVEL=debug`.
//!
//! # Module structure
//!
//! - [`types`]: root `Config` struct
//! - [`server`]: hub behaviour (frame cap, chunk size, ready-check timeout)
//! - [`storage`]: on-disk layout (snapshots, uploads, session extraction)
//! - [`logging`]: log level/format/file settings
//! - [`defaults`]: default value functions
//! - [`loader`]: configuration loading
//! - [`validation`]: configuration validation

pub mod defaults;
pub mod loader;
pub mod logging;
pub mod server;
pub mod storage;
pub mod types;
pub mod validation;

pub use loader::load;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use server::HubConfig;
pub use storage::StorageConfig;
pub use types::Config;
pub use validation::validate;
