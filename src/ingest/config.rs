use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub global: GlobalConfig,
    /// Cleaned address exports, one file per state.
    pub addresses: Vec<AddressSource>,
    /// Produce-category reference values seeded into the category index.
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalConfig {
    pub es_url: String,
    #[serde(default = "default_index_prefix")]
    pub index_prefix: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AddressSource {
    /// State abbreviation stamped onto every record from this file.
    pub state: String,
    pub file: PathBuf,
}

fn default_index_prefix() -> String {
    "paddock".to_string()
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
