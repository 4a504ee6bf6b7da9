use super::{OutputFormat, Theme};
use cactus_link::CodecOptions;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Settings resolved from `cli.toml`; every field may still be overridden by a flag.
#[derive(Debug, Default)]
pub struct CliConfig {
    path: Option<PathBuf>,
    data: RawConfig,
    format: Option<OutputFormat>,
    theme: Option<Theme>,
}

impl CliConfig {
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let explicit_given = explicit.is_some();
        let path = explicit.or_else(default_config_path);
        let data = match path.as_ref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            Some(config_path) if explicit_given => {
                return Err(ConfigError::Missing {
                    path: config_path.clone(),
                })
            }
            _ => RawConfig::default(),
        };
        let format = parse_value(&data.format, "format")?;
        let theme = parse_value(&data.theme, "theme")?;
        Ok(Self {
            path,
            data,
            format,
            theme,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn log_level(&self) -> Option<&str> {
        self.data.log_level.as_deref()
    }

    pub fn format(&self) -> Option<OutputFormat> {
        self.format
    }

    pub fn theme(&self) -> Option<Theme> {
        self.theme
    }

    /// Codec options with the configured defaults applied.
    pub fn codec_options(&self) -> CodecOptions {
        let codec = &self.data.codec;
        let mut opts = CodecOptions::new();
        if let Some(max_links) = codec.max_links {
            opts = opts.max_links(max_links);
        }
        if let Some(verify) = codec.verify_after_load {
            opts = opts.verify_after_load(verify);
        }
        if let Some(checksum) = codec.checksum {
            opts = opts.checksum(checksum);
        }
        opts
    }
}

fn parse_value<T: ValueEnum>(raw: &Option<String>, key: &'static str) -> Result<Option<T>, ConfigError> {
    match raw.as_deref() {
        Some(value) => T::from_str(value, true)
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key,
                value: value.to_string(),
            }),
        None => Ok(None),
    }
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawConfig {
    #[serde(default)]
    log_level: Option<String>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    theme: Option<String>,
    #[serde(default)]
    codec: CodecSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct CodecSection {
    max_links: Option<usize>,
    verify_after_load: Option<bool>,
    checksum: Option<bool>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read CLI config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse CLI config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("CLI config {path} does not exist")]
    Missing { path: PathBuf },
    #[error("CLI config value '{value}' is invalid for '{key}'")]
    InvalidValue { key: &'static str, value: String },
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("cactus-link").join("cli.toml"))
}
