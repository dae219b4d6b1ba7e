//! Names derived from the caller's original file name.

use super::settings::VideoFormat;
use std::path::Path;

/// Default video file extensions accepted by the CLI pre-check
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "webm", "mov", "avi", "flv", "m4v", "wmv", "mpg", "mpeg", "ts", "3gp", "ogv",
];

/// Check if a path has a video file extension
pub fn is_video_file(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        if let Some(ext_str) = ext.to_str() {
            return VIDEO_EXTENSIONS.contains(&ext_str.to_lowercase().as_str());
        }
    }
    false
}

/// Extension of `file_name` after the last dot, if any.
fn extension(file_name: &str) -> Option<&str> {
    match file_name.rfind('.') {
        Some(idx) if idx + 1 < file_name.len() => Some(&file_name[idx + 1..]),
        _ => None,
    }
}

/// Name the input is staged under: `input` plus the original extension, so
/// the engine can pick a demuxer from it.
pub fn staged_input_name(original_name: &str) -> String {
    match extension(original_name) {
        Some(ext) => format!("input.{}", ext),
        None => "input".to_string(),
    }
}

pub fn staged_output_name(format: VideoFormat) -> String {
    format!("output.{}", format.extension())
}

/// `compressed_<base>.<ext>` where base is everything before the first dot.
pub fn suggested_filename(original_name: &str, format: VideoFormat) -> String {
    let file_name = Path::new(original_name)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(original_name);
    let base = file_name.split('.').next().unwrap_or(file_name);
    format!("compressed_{}.{}", base, format.extension())
}
