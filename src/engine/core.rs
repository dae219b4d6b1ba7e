mod ffmpeg_cmd;
mod ffmpeg_info;
mod naming;
mod resolve;
mod settings;
mod types;

pub use ffmpeg_cmd::{RUNTIME_ARGS, build_engine_command, format_ffmpeg_cmd, synthesize};
pub use ffmpeg_info::{ffmpeg_version, parse_duration_line, parse_timestamp};
pub use naming::{is_video_file, staged_input_name, staged_output_name, suggested_filename};
pub use resolve::{
    AUDIO_BITRATE_KBPS, AUDIO_CODEC, EncoderParameters, VideoCodec, crf_for, resolve,
    scale_filter, video_codec_for,
};
pub use settings::{
    CompressionLevel, CompressionSettings, Resolution, SettingsParseError, VideoFormat,
};
pub use types::{
    InputFile, Job, JobState, LogEntry, ProgressParser, ResultSummary, Severity,
};
