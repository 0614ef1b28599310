//! Runtime settings.
//!
//! Applications can load [`Settings`] from `config/condor.toml` or
//! environment variables using `Settings::load()` and install them with
//! [`init_with_settings`](crate::init_with_settings).

use crate::error::Result;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Chunk size used by batch inserts when none (or a non-positive one) is given.
pub const DEFAULT_BATCH_SIZE: usize = 1000;
/// Column used for key lookups when an entity declares no `#[primary_key]`.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_page_size() -> i64 {
    crate::page::DEFAULT_PAGE_SIZE
}

fn default_primary_key() -> String {
    DEFAULT_PRIMARY_KEY.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            page_size: default_page_size(),
            primary_key: default_primary_key(),
        }
    }
}

impl Settings {
    /// Load settings from `config/condor.toml` (`[condor]` table), falling back to env vars.
    ///
    /// Environment variables use the `CONDOR` prefix and `__` separator, e.g.
    /// `CONDOR__CONDOR__BATCH_SIZE=500`. A missing `[condor]` section yields the defaults;
    /// malformed values fail with [`Error::Config`](crate::Error::Config).
    pub fn load() -> Result<Self> {
        Self::load_from("config/condor.toml")
    }

    /// Same as [`Settings::load`] with an explicit file path.
    pub fn load_from(path: &str) -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("CONDOR").separator("__").try_parsing(true));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if std::path::Path::new(path).exists() {
                    log::warn!("failed to load {path}, falling back to env: {err}");
                }
                Config::builder()
                    .add_source(Environment::with_prefix("CONDOR").separator("__").try_parsing(true))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                        ))
                    })?
            }
        };

        match settings.get::<Settings>("condor") {
            Ok(loaded) => Ok(loaded),
            Err(ConfigError::NotFound(_)) => Ok(Settings::default()),
            Err(err) => Err(ConfigError::Message(format!(
                "condor settings could not be loaded from file or environment: {err}"
            ))
            .into()),
        }
    }
}
