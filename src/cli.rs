use clap::{Args, Parser, Subcommand};
use pixelsqueeze::engine::{CompressionLevel, CompressionSettings, Resolution, VideoFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pixelsqueeze")]
#[command(about = "Compress a video file with ffmpeg", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides for the configured default settings
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Output height: original, 1080p, 720p or 480p
    #[arg(short, long)]
    pub resolution: Option<Resolution>,

    /// Output container: mp4 (H.264) or webm (VP9)
    #[arg(short, long)]
    pub format: Option<VideoFormat>,

    /// Compression level: low (best quality), medium or high (smallest file)
    #[arg(short, long)]
    pub level: Option<CompressionLevel>,
}

impl SettingsArgs {
    pub fn apply(&self, defaults: CompressionSettings) -> CompressionSettings {
        CompressionSettings {
            resolution: self.resolution.unwrap_or(defaults.resolution),
            format: self.format.unwrap_or(defaults.format),
            compression_level: self.level.unwrap_or(defaults.compression_level),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compress one video file
    Compress {
        /// Path to the video file
        file: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Directory for the compressed file (defaults to config, then the input's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Print every ffmpeg log line
        #[arg(short, long)]
        verbose: bool,

        /// Emit job events as JSON lines on stdout instead of a progress line
        #[arg(long)]
        json: bool,
    },

    /// Show the ffmpeg command without executing (dry run)
    DryRun {
        /// Path to the video file
        file: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Check if ffmpeg is installed
    CheckFfmpeg,

    /// Show config status and location, or create default config if missing
    InitConfig,
}

pub fn parse() -> Cli {
    Cli::parse()
}
