//! Application settings, read from an optional `finance.toml` and from
//! `FINANCE__*` environment variables (e.g. `FINANCE__STORAGE__DIR`).
use config::{Config, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "finance.toml";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Storage {
    /// Directory holding one `<slot>.json` file per slot.
    pub dir: String,
    pub slot: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Log {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub storage: Storage,
    pub log: Log,
}

impl Settings {
    /// Loads settings. An explicit `path` must exist; the default file is
    /// optional.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        Self::builder(path)?
            .add_source(Environment::with_prefix("FINANCE").separator("__"))
            .build()?
            .try_deserialize()
    }

    fn builder(path: Option<&str>) -> Result<config::ConfigBuilder<DefaultState>, ConfigError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_PATH).required(false),
        };
        Ok(Config::builder()
            .set_default("storage.dir", "data")?
            .set_default("storage.slot", "transactions")?
            .set_default("log.level", "info")?
            .add_source(file))
    }
}
