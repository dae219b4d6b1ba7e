// Global configuration management

use crate::engine::core::{CompressionLevel, CompressionSettings, Resolution, VideoFormat};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// ffmpeg executable (name on PATH or absolute path)
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Parent directory for the per-engine staging directory (system temp dir if unset)
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    /// Add the full ffmpeg command line to each job's log
    #[serde(default = "default_true_config")]
    pub log_command: bool,

    /// ffmpeg -loglevel; "info" or more verbose is needed for percentage progress
    #[serde(default = "default_ffmpeg_log_level")]
    pub ffmpeg_log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub resolution: Resolution,

    #[serde(default)]
    pub format: VideoFormat,

    #[serde(default)]
    pub compression_level: CompressionLevel,

    /// Inputs larger than this are refused before any work starts
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: u64,

    /// Where compressed files are written (next to the input if unset)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_true_config() -> bool {
    true
}

fn default_ffmpeg_log_level() -> String {
    "info".to_string()
}

fn default_max_input_bytes() -> u64 {
    2 * 1024 * 1024 * 1024
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            staging_dir: None,
            log_command: true,
            ffmpeg_log_level: default_ffmpeg_log_level(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            format: VideoFormat::default(),
            compression_level: CompressionLevel::default(),
            max_input_bytes: default_max_input_bytes(),
            output_dir: None,
        }
    }
}

impl DefaultsConfig {
    pub fn settings(&self) -> CompressionSettings {
        CompressionSettings::new(self.resolution, self.format, self.compression_level)
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
                .join("pixelsqueeze")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("pixelsqueeze")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Parse config from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse config")
    }

    /// Load config from disk, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from `config_path`, writing the defaults there if the file is missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            })?;

            Self::from_toml(&contents).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })
        } else {
            let config = Config::default();

            // Try to save the default config, but don't fail if we can't
            if let Err(e) = config.save_to(config_path) {
                tracing::warn!(
                    error = %format!("{:#}", e),
                    "could not create default config file; run 'pixelsqueeze init-config'"
                );
            }

            Ok(config)
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }
}
