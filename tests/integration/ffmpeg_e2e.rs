// End-to-end tests that drive the real ffmpeg engine
//
// Skipped when ffmpeg is not on PATH

use pixelsqueeze::config::EngineConfig;
use pixelsqueeze::engine::{
    CompressionLevel, CompressionSettings, Engine, EngineState, FfmpegEngine, InputFile,
    JobController, JobError, JobEvent, JobState, Resolution, Severity, VideoFormat,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::common::ffmpeg_runner::*;
use crate::common::*;

macro_rules! require_ffmpeg {
    () => {
        if !is_ffmpeg_available() {
            eprintln!("Skipping test: FFmpeg not available");
            return;
        }
    };
}

fn create_test_video(temp_dir: &TempDir) -> PathBuf {
    let video_path = temp_dir.path().join("test_input.mp4");

    // Small clip: 1 second, 320x240, with audio
    generate_test_video(&video_path, 1.0, 320, 240).expect("Failed to generate test video");

    video_path
}

fn staging_config(temp_dir: &TempDir) -> EngineConfig {
    EngineConfig {
        staging_dir: Some(temp_dir.path().join("staging")),
        ..EngineConfig::default()
    }
}

fn loaded_controller(config: EngineConfig) -> JobController<FfmpegEngine> {
    let controller = JobController::new(Arc::new(Mutex::new(FfmpegEngine::new(config))));
    controller
        .load(&mut Vec::<JobEvent>::new())
        .expect("ffmpeg engine should load");
    controller
}

fn input_from(path: &Path) -> InputFile {
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    InputFile::new(name, fs::read(path).unwrap())
}

#[test]
fn e2e_engine_loads_and_reports_version() {
    require_ffmpeg!();

    let temp_dir = TempDir::new().unwrap();
    let mut engine = FfmpegEngine::new(staging_config(&temp_dir));
    engine.initialize().unwrap();

    assert_eq!(engine.state(), EngineState::Ready);
    assert!(engine.version().unwrap().starts_with("ffmpeg version"));
    let namespace = engine.namespace_dir().unwrap().to_path_buf();
    assert!(namespace.starts_with(temp_dir.path().join("staging")));

    engine.shutdown();
    assert_eq!(engine.state(), EngineState::Unloaded);
    assert!(!namespace.exists(), "staging directory should be removed");
}

#[test]
fn e2e_mp4_job_succeeds_and_cleans_up() {
    require_ffmpeg!();

    let temp_dir = TempDir::new().unwrap();
    let video = create_test_video(&temp_dir);
    let controller = loaded_controller(staging_config(&temp_dir));
    let settings =
        CompressionSettings::new(Resolution::P480, VideoFormat::Mp4, CompressionLevel::High);

    let mut events: Vec<JobEvent> = Vec::new();
    let output = controller
        .submit(&input_from(&video), settings, &mut events)
        .expect("mp4 encode should succeed");

    assert!(!output.data.is_empty());
    assert_eq!(output.summary.suggested_filename, "compressed_test_input.mp4");
    assert_eq!(
        states(&events),
        vec![
            JobState::Staging,
            JobState::Encoding,
            JobState::Finalizing,
            JobState::Succeeded
        ]
    );

    let pct = progress(&events);
    assert!(!pct.is_empty(), "expected progress updates");
    assert!(pct.iter().all(|p| (0.0..=100.0).contains(p)));
    assert_eq!(pct.last(), Some(&100.0));

    // Engine diagnostics were relayed as info lines
    assert!(
        messages_with(&events, Severity::Info)
            .iter()
            .any(|m| m.contains("Duration:"))
    );

    let engine = controller.engine().lock().unwrap();
    assert!(engine.staged_entries().is_empty());

    if is_ffprobe_available() {
        let height = probe_height(temp_dir.path(), "probe.mp4", &output.data).unwrap();
        assert_eq!(height, 480);
    }
}

#[test]
fn e2e_invalid_input_fails_with_diagnostic() {
    require_ffmpeg!();

    let temp_dir = TempDir::new().unwrap();
    let controller = loaded_controller(staging_config(&temp_dir));
    let garbage = InputFile::new("broken.mp4", b"definitely not a video".to_vec());

    let mut events: Vec<JobEvent> = Vec::new();
    let err = controller
        .submit(&garbage, CompressionSettings::default(), &mut events)
        .unwrap_err();

    assert!(matches!(err, JobError::Execution { .. }));
    assert!(err.diagnostic().is_some_and(|d| !d.is_empty()));
    assert_eq!(states(&events).last(), Some(&JobState::Failed));
    assert!(
        controller
            .engine()
            .lock()
            .unwrap()
            .staged_entries()
            .is_empty()
    );
}

#[test]
fn e2e_webm_job_always_cleans_up() {
    require_ffmpeg!();

    let temp_dir = TempDir::new().unwrap();
    let video = create_test_video(&temp_dir);
    let controller = loaded_controller(staging_config(&temp_dir));
    let settings = CompressionSettings::new(
        Resolution::Original,
        VideoFormat::Webm,
        CompressionLevel::High,
    );

    // Whether this build's webm muxer takes AAC decides the outcome; cleanup
    // must hold either way.
    let mut events: Vec<JobEvent> = Vec::new();
    let result = controller.submit(&input_from(&video), settings, &mut events);

    let job = controller.current_job().unwrap();
    match result {
        Ok(output) => {
            assert_eq!(job.state, JobState::Succeeded);
            assert_eq!(output.summary.suggested_filename, "compressed_test_input.webm");
        }
        Err(_) => assert_eq!(job.state, JobState::Failed),
    }
    assert!(
        controller
            .engine()
            .lock()
            .unwrap()
            .staged_entries()
            .is_empty()
    );
}

#[test]
fn e2e_missing_binary_leaves_engine_unavailable() {
    let controller = JobController::new(Arc::new(Mutex::new(FfmpegEngine::new(EngineConfig {
        ffmpeg_path: PathBuf::from("/nonexistent/ffmpeg"),
        ..EngineConfig::default()
    }))));

    let mut events: Vec<JobEvent> = Vec::new();
    assert!(matches!(
        controller.load(&mut events),
        Err(JobError::EngineUnavailable { .. })
    ));
    assert_eq!(controller.engine_state(), EngineState::Unloaded);
    assert!(!controller.can_submit());
    assert_eq!(messages_with(&events, Severity::Error).len(), 1);
}
