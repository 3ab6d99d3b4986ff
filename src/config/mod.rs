use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file '{path}': {source}")]
  Read {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("failed to parse config file '{path}': {source}")]
  Parse {
    path: PathBuf,
    source: toml::de::Error,
  },
  #[error("invalid server address '{addr}', expected host:port")]
  InvalidAddr { addr: String },
  #[error("invalid log level '{level}', expected a level or target=level list")]
  InvalidLogLevel { level: String },
}

/// Log configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LogConfig {
  /// Log file path, if not set, logs will be printed to stdout
  pub file: Option<PathBuf>,
  /// Log level, default is "info"
  #[serde(default = "default_log_level")]
  pub level: String,
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      file: None,
      level: default_log_level(),
    }
  }
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
  /// Server listening address (Redis protocol)
  #[serde(default = "default_server_addr")]
  pub server_addr: String,

  /// Log configuration
  #[serde(default)]
  pub log: LogConfig,
}

fn default_server_addr() -> String {
  "127.0.0.1:6379".to_string()
}

impl Default for Config {
  fn default() -> Self {
    Self {
      server_addr: default_server_addr(),
      log: LogConfig::default(),
    }
  }
}

impl Config {
  /// Load configuration from TOML file
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let config = Self::read_file(path.as_ref())?;
    config.validate()?;
    Ok(config)
  }

  fn read_file(path: &Path) -> Result<Self, ConfigError> {
    let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let config: Config = toml::from_str(&config_str).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    Ok(config)
  }

  /// Load from an optional file, then apply command line overrides.
  ///
  /// Flags win over the file and the file wins over the defaults. Only the
  /// merged result is validated, so a flag can replace a bad file value.
  pub fn load(
    path: Option<&Path>,
    addr: Option<String>,
    log_level: Option<String>,
  ) -> Result<Self, ConfigError> {
    let mut config = match path {
      Some(path) => Self::read_file(path)?,
      None => Self::default(),
    };
    if let Some(addr) = addr {
      config.server_addr = addr;
    }
    if let Some(level) = log_level {
      config.log.level = level;
    }
    config.validate()?;
    Ok(config)
  }

  /// Check that `server_addr` looks like `host:port` and that `log.level`
  /// is a level or a comma-separated list of `target=level` directives.
  ///
  /// Host names are not resolved here; binding reports those failures.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if !valid_log_level(&self.log.level) {
      return Err(ConfigError::InvalidLogLevel {
        level: self.log.level.clone(),
      });
    }

    let valid = match self.server_addr.rsplit_once(':') {
      Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
      None => false,
    };
    if !valid {
      return Err(ConfigError::InvalidAddr {
        addr: self.server_addr.clone(),
      });
    }
    Ok(())
  }
}

// A bare word would otherwise be read as a target name, which silences
// every other target.
fn valid_log_level(level: &str) -> bool {
  !level.trim().is_empty()
    && level.split(',').all(|directive| match directive.split_once('=') {
      Some((target, level)) => !target.is_empty() && level.parse::<LevelFilter>().is_ok(),
      None => !directive.is_empty() && directive.parse::<LevelFilter>().is_ok(),
    })
}
