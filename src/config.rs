//! Layered application configuration.
//!
//! Settings are merged with `figment`, later layers winning:
//!
//! 1. Built-in defaults ([`Settings::default`])
//! 2. A TOML file: `--config PATH`, or `config.toml` in the platform
//!    configuration directory (e.g. `~/.config/filematch/config.toml`)
//! 3. `FILEMATCH_*` environment variables (`FILEMATCH_HASH_WORKERS=8`)
//! 4. Command-line flags ([`SettingsOverrides`])
//!
//! ```toml
//! dir_workers = 10
//! hash_workers = 50
//! queue_capacity = 100
//! prefix_size = "64KiB"
//! min_group_size = 2
//! stats_interval_secs = 60
//! ```

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::parse_size;
use crate::duplicates::{FinderConfig, MIN_GROUP_SIZE};
use crate::scanner::DEFAULT_PREFIX_SIZE;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "FILEMATCH_";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// A layer could not be parsed or has the wrong shape.
    #[error("Invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A value parsed but is out of range.
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Setting name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Tuning knobs of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Concurrent directory-listing workers.
    pub dir_workers: usize,
    /// Concurrent hashing workers per stage.
    pub hash_workers: usize,
    /// Capacity of the bounded job queues.
    pub queue_capacity: usize,
    /// Leading bytes digested by the prefix stage.
    #[serde(deserialize_with = "deserialize_size")]
    pub prefix_size: u64,
    /// Smallest group of identical files worth reporting.
    pub min_group_size: usize,
    /// Seconds between progress statistics; 0 disables them.
    pub stats_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dir_workers: 10,
            hash_workers: 50,
            queue_capacity: 100,
            prefix_size: DEFAULT_PREFIX_SIZE,
            min_group_size: MIN_GROUP_SIZE,
            stats_interval_secs: 60,
        }
    }
}

/// Values given on the command line; `None` leaves lower layers in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir_workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_group_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats_interval_secs: Option<u64>,
}

impl Settings {
    /// Platform default location of the configuration file.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "filematch").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the merged provider stack.
    ///
    /// `config_file` replaces the platform default file. A missing default
    /// file is skipped silently.
    #[must_use]
    pub fn figment(config_file: Option<&Path>, overrides: &SettingsOverrides) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        match config_file {
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                if let Some(path) = Self::default_path() {
                    log::debug!("Looking for configuration in {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::globals(overrides))
    }

    /// Load and validate settings from every layer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] if `config_file` is given but
    /// missing, [`ConfigError::Load`] if a layer cannot be parsed, and
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn load(
        config_file: Option<&Path>,
        overrides: &SettingsOverrides,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = config_file {
            if !path.is_file() {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }
        }

        let settings: Settings = Self::figment(config_file, overrides)
            .extract()
            .map_err(Box::new)?;
        settings.validate()?;
        log::debug!("Effective settings: {:?}", settings);
        Ok(settings)
    }

    /// Check every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("dir_workers", self.dir_workers),
            ("hash_workers", self.hash_workers),
            ("queue_capacity", self.queue_capacity),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        if self.prefix_size == 0 {
            return Err(ConfigError::Invalid {
                field: "prefix_size",
                reason: "must be at least 1 byte".to_string(),
            });
        }
        if self.min_group_size < MIN_GROUP_SIZE {
            return Err(ConfigError::Invalid {
                field: "min_group_size",
                reason: format!("must be at least {MIN_GROUP_SIZE}"),
            });
        }
        Ok(())
    }

    /// Interval for periodic statistics, `None` when disabled.
    #[must_use]
    pub fn stats_interval(&self) -> Option<Duration> {
        (self.stats_interval_secs > 0).then(|| Duration::from_secs(self.stats_interval_secs))
    }

    /// Finder configuration carrying these settings.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_dir_workers(self.dir_workers)
            .with_hash_workers(self.hash_workers)
            .with_queue_capacity(self.queue_capacity)
            .with_prefix_size(self.prefix_size)
            .with_min_group_size(self.min_group_size)
    }
}

/// Accept either a byte count or a human-readable size string.
fn deserialize_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Bytes(u64),
        Human(String),
    }

    match Size::deserialize(deserializer)? {
        Size::Bytes(bytes) => Ok(bytes),
        Size::Human(text) => parse_size(&text).map_err(serde::de::Error::custom),
    }
}
