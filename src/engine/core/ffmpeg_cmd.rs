use super::resolve::{EncoderParameters, VideoCodec};
use std::path::Path;
use std::process::Command;

/// Arguments the engine itself puts ahead of every synthesized invocation:
/// no banner, no stdin, overwrite, machine-readable progress on stdout.
pub const RUNTIME_ARGS: &[&str] = &[
    "-hide_banner",
    "-nostdin",
    "-y",
    "-progress",
    "pipe:1",
    "-nostats",
];

fn apply_video_codec(args: &mut Vec<String>, params: &EncoderParameters) {
    args.push("-c:v".to_string());
    args.push(params.video_codec.ffmpeg_name().to_string());

    match &params.video_codec {
        VideoCodec::H264 { preset } => {
            args.push("-preset".to_string());
            args.push(preset.to_string());
            args.push("-crf".to_string());
            args.push(params.crf.to_string());
        }
        VideoCodec::Vp9 { target_bitrate } => {
            // libvpx-vp9 only runs pure constant quality with -b:v 0
            args.push("-crf".to_string());
            args.push(params.crf.to_string());
            args.push("-b:v".to_string());
            args.push(target_bitrate.to_string());
        }
    }
}

fn apply_audio(args: &mut Vec<String>, params: &EncoderParameters) {
    args.push("-c:a".to_string());
    args.push(params.audio_codec.to_string());
    args.push("-b:a".to_string());
    args.push(format!("{}k", params.audio_bitrate_kbps));
}

/// Build the ordered ffmpeg argument list for one encode.
///
/// Order is fixed: input, optional scale filter, video codec and rate
/// control, audio, then the output name. ffmpeg applies options to the next
/// file named on the command line, so moving any group changes meaning.
pub fn synthesize(input_name: &str, output_name: &str, params: &EncoderParameters) -> Vec<String> {
    let mut args = vec!["-i".to_string(), input_name.to_string()];

    if let Some(filter) = &params.scale_filter {
        args.push("-vf".to_string());
        args.push(filter.clone());
    }

    apply_video_codec(&mut args, params);
    apply_audio(&mut args, params);

    args.push(output_name.to_string());
    args
}

/// Render an argument list as a copy-pasteable `ffmpeg ...` line.
pub fn format_ffmpeg_cmd(args: &[String]) -> String {
    let mut parts = vec!["ffmpeg".to_string()];
    parts.extend(args.iter().map(|arg| {
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            format!("'{}'", arg.replace('\'', "'\\''"))
        } else {
            arg.clone()
        }
    }));
    parts.join(" ")
}

/// Wrap synthesized arguments into a runnable process rooted at `workdir`.
pub fn build_engine_command(
    ffmpeg_path: &Path,
    log_level: &str,
    workdir: &Path,
    args: &[String],
) -> Command {
    let mut cmd = Command::new(ffmpeg_path);
    cmd.current_dir(workdir);
    cmd.args(RUNTIME_ARGS);
    cmd.arg("-loglevel").arg(log_level);
    cmd.args(args);
    cmd
}
