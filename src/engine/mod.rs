// Transcode engine and job control - independent of the CLI

pub mod adapter;
pub mod controller;
pub mod core;
pub mod ffmpeg;

pub use adapter::{Engine, EngineError, EngineObserver, EngineState, NullObserver};
pub use controller::{JobController, JobError, JobEvent, JobObserver, JobOutput, SilentObserver};
pub use self::core::*;
pub use ffmpeg::FfmpegEngine;
