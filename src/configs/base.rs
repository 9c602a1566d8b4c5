use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{common::types::AnyResult, configs::*};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
  pub logging: Option<LoggingConfig>,
  #[serde(default)]
  pub resampler: ResamplerConfig,
  #[serde(default)]
  pub convert: Option<ConvertConfig>,
}

impl Config {
  /// Loads `config.toml`, falling back to `config.default.toml`.
  pub fn load() -> AnyResult<Self> {
    let config_path = if Path::new("config.toml").exists() {
      "config.toml"
    } else if Path::new("config.default.toml").exists() {
      "config.default.toml"
    } else {
      return Err("config.toml or config.default.toml not found".into());
    };

    Self::load_from(config_path)
  }

  pub fn load_from(path: impl AsRef<Path>) -> AnyResult<Self> {
    let path = path.as_ref();
    println!("Loading configuration from: {}", path.display());

    let config_str = std::fs::read_to_string(path)?;
    if config_str.trim().is_empty() {
      return Err(format!("{} is empty", path.display()).into());
    }

    Self::parse(&config_str)
  }

  pub fn parse(config_str: &str) -> AnyResult<Self> {
    let config: Config = toml::from_str(config_str)?;
    Ok(config)
  }
}
