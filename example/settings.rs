//! Configuration file.
use arena_h1::Config;
use arena_h1::config::ConfigError;
use arena_h1::http::HeaderMatch;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),
}

/// Contents of the TOML configuration file, every field is optional.
///
/// ```toml
/// addr = "127.0.0.1:4221"
/// directory = "/tmp/files"
///
/// [connection]
/// arena_capacity = 1048576
/// read_timeout_secs = 10
/// compression = false
/// ```
#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub addr: Option<String>,
    pub directory: Option<PathBuf>,
    pub connection: ConnectionSettings,
}

#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionSettings {
    pub arena_capacity: Option<usize>,
    pub read_buffer_capacity: Option<usize>,
    pub read_chunk: Option<usize>,
    pub carry_capacity: Option<usize>,
    pub max_headers: Option<usize>,
    pub max_head_size: Option<usize>,
    /// Compare header names byte for byte.
    pub exact_header_match: Option<bool>,
    /// `0` disables the deadline.
    pub read_timeout_secs: Option<u64>,
    /// `0` disables the deadline.
    pub write_timeout_secs: Option<u64>,
    pub compression: Option<bool>,
}

fn timeout(secs: u64) -> Option<Duration> {
    (secs != 0).then(|| Duration::from_secs(secs))
}

impl ConnectionSettings {
    /// Override `config` with the fields that are set.
    pub fn apply(&self, mut config: Config) -> Config {
        macro_rules! apply {
            ($settings:ident => $config:ident; $($field:ident),*) => {
                $(
                    if let Some(value) = $settings.$field {
                        $config.$field = value;
                    }
                )*
            };
        }

        apply!(
            self => config;
            arena_capacity,
            read_buffer_capacity,
            read_chunk,
            carry_capacity,
            max_headers,
            max_head_size,
            compression
        );

        if let Some(exact) = self.exact_header_match {
            config.header_match = match exact {
                true => HeaderMatch::Exact,
                false => HeaderMatch::IgnoreCase,
            };
        }
        if let Some(secs) = self.read_timeout_secs {
            config.read_timeout = timeout(secs);
        }
        if let Some(secs) = self.write_timeout_secs {
            config.write_timeout = timeout(secs);
        }

        config
    }
}

impl Settings {
    pub fn parse(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        settings.connection.apply(Config::default()).validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }
}
