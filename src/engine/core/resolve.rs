//! Settings -> concrete encoder parameters.

use super::settings::{CompressionLevel, CompressionSettings, Resolution, VideoFormat};

/// Audio is always re-encoded so the output container never has to accept
/// whatever codec the source carried.
pub const AUDIO_CODEC: &str = "aac";
pub const AUDIO_BITRATE_KBPS: u32 = 128;

/// Video codec selection plus the codec-specific arguments that go with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoCodec {
    /// libx264 with a speed preset.
    H264 { preset: &'static str },
    /// libvpx-vp9 in constant quality mode; `target_bitrate` of 0 makes the
    /// encoder honor CRF alone.
    Vp9 { target_bitrate: u32 },
}

impl VideoCodec {
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            VideoCodec::H264 { .. } => "libx264",
            VideoCodec::Vp9 { .. } => "libvpx-vp9",
        }
    }
}

/// Fully resolved parameters for a single encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderParameters {
    /// `None` passes frames through at source size.
    pub scale_filter: Option<String>,
    pub video_codec: VideoCodec,
    pub crf: u32,
    pub audio_codec: &'static str,
    pub audio_bitrate_kbps: u32,
}

pub fn scale_filter(resolution: Resolution) -> Option<String> {
    // -2 keeps the aspect ratio and rounds the width to an even number,
    // which yuv420p encoders require.
    resolution
        .target_height()
        .map(|height| format!("scale=-2:{}", height))
}

pub fn crf_for(level: CompressionLevel) -> u32 {
    match level {
        CompressionLevel::Low => 18,
        CompressionLevel::Medium => 23,
        CompressionLevel::High => 28,
    }
}

pub fn video_codec_for(format: VideoFormat) -> VideoCodec {
    match format {
        VideoFormat::Mp4 => VideoCodec::H264 { preset: "faster" },
        VideoFormat::Webm => VideoCodec::Vp9 { target_bitrate: 0 },
    }
}

/// Map user settings onto encoder parameters. Pure and infallible.
pub fn resolve(settings: &CompressionSettings) -> EncoderParameters {
    EncoderParameters {
        scale_filter: scale_filter(settings.resolution),
        video_codec: video_codec_for(settings.format),
        crf: crf_for(settings.compression_level),
        audio_codec: AUDIO_CODEC,
        audio_bitrate_kbps: AUDIO_BITRATE_KBPS,
    }
}
