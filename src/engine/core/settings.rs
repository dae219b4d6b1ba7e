//! User-facing compression choices.
//!
//! Every field is a closed enum so downstream matches are exhaustive. Text
//! boundaries (config file, CLI flags) go through `FromStr`, which rejects
//! anything outside the defined variants instead of guessing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Returned when a settings string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field} '{value}' (expected one of: {expected})")]
pub struct SettingsParseError {
    pub field: &'static str,
    pub value: String,
    pub expected: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "original")]
    Original,
    #[serde(rename = "1080p")]
    P1080,
    #[default]
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
}

impl Resolution {
    pub const ALL: [Resolution; 4] = [
        Resolution::Original,
        Resolution::P1080,
        Resolution::P720,
        Resolution::P480,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Original => "original",
            Resolution::P1080 => "1080p",
            Resolution::P720 => "720p",
            Resolution::P480 => "480p",
        }
    }

    /// Target output height, `None` keeps the source frame size.
    pub fn target_height(&self) -> Option<u32> {
        match self {
            Resolution::Original => None,
            Resolution::P1080 => Some(1080),
            Resolution::P720 => Some(720),
            Resolution::P480 => Some(480),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = SettingsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "original" => Ok(Resolution::Original),
            "1080p" | "1080" => Ok(Resolution::P1080),
            "720p" | "720" => Ok(Resolution::P720),
            "480p" | "480" => Ok(Resolution::P480),
            _ => Err(SettingsParseError {
                field: "resolution",
                value: s.to_string(),
                expected: "original, 1080p, 720p, 480p",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    #[default]
    Mp4,
    Webm,
}

impl VideoFormat {
    pub const ALL: [VideoFormat; 2] = [VideoFormat::Mp4, VideoFormat::Webm];

    /// File extension (without dot) and container name.
    pub fn extension(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "mp4",
            VideoFormat::Webm => "webm",
        }
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for VideoFormat {
    type Err = SettingsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "mp4" => Ok(VideoFormat::Mp4),
            "webm" => Ok(VideoFormat::Webm),
            _ => Err(SettingsParseError {
                field: "format",
                value: s.to_string(),
                expected: "mp4, webm",
            }),
        }
    }
}

/// How hard to squeeze. `Low` keeps the most quality, `High` the smallest file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl CompressionLevel {
    pub const ALL: [CompressionLevel; 3] = [
        CompressionLevel::Low,
        CompressionLevel::Medium,
        CompressionLevel::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionLevel::Low => "low",
            CompressionLevel::Medium => "medium",
            CompressionLevel::High => "high",
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionLevel {
    type Err = SettingsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(CompressionLevel::Low),
            "medium" => Ok(CompressionLevel::Medium),
            "high" => Ok(CompressionLevel::High),
            _ => Err(SettingsParseError {
                field: "compression level",
                value: s.to_string(),
                expected: "low, medium, high",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CompressionSettings {
    #[serde(default)]
    pub resolution: Resolution,

    #[serde(default)]
    pub format: VideoFormat,

    #[serde(default)]
    pub compression_level: CompressionLevel,
}

impl CompressionSettings {
    pub fn new(
        resolution: Resolution,
        format: VideoFormat,
        compression_level: CompressionLevel,
    ) -> Self {
        Self {
            resolution,
            format,
            compression_level,
        }
    }

    /// Every combination of the three choices (4 x 2 x 3).
    pub fn all() -> impl Iterator<Item = CompressionSettings> {
        Resolution::ALL.into_iter().flat_map(|resolution| {
            VideoFormat::ALL.into_iter().flat_map(move |format| {
                CompressionLevel::ALL
                    .into_iter()
                    .map(move |level| CompressionSettings::new(resolution, format, level))
            })
        })
    }
}

impl fmt::Display for CompressionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} / {}",
            self.resolution, self.format, self.compression_level
        )
    }
}
