//! Runs one transcode job at a time against a shared engine.
//!
//! A job moves `Idle -> Staging -> Encoding -> Finalizing -> Succeeded`, or
//! jumps to `Failed` from whichever step broke. Both staged names are
//! deleted on every path before the job reaches a terminal state.

use super::adapter::{Engine, EngineError, EngineObserver, EngineState};
use super::core::{
    CompressionSettings, InputFile, Job, JobState, LogEntry, ResultSummary, format_ffmpeg_cmd,
    resolve, staged_input_name, staged_output_name, suggested_filename, synthesize,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("engine unavailable: {reason}")]
    EngineUnavailable { reason: String },

    #[error("another job is already running")]
    Busy,

    #[error("could not stage input: {reason}")]
    Staging { reason: String },

    #[error("encoding failed ({status})")]
    Execution { status: String, diagnostic: String },

    #[error("encoder reported success but produced no '{name}'")]
    MissingOutput { name: String },

    #[error("cancelled")]
    Cancelled,
}

impl JobError {
    /// Only `Busy` is worth retrying as-is; everything else needs a change first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobError::Busy)
    }

    /// Engine output attached to an execution failure.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            JobError::Execution { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }
}

impl From<EngineError> for JobError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Load { reason } => JobError::EngineUnavailable { reason },
            EngineError::NotReady { state } => JobError::EngineUnavailable {
                reason: format!("engine is {}", state),
            },
            EngineError::Staging { name, reason } => JobError::Staging {
                reason: format!("{}: {}", name, reason),
            },
            EngineError::Execution { status, diagnostic } => {
                JobError::Execution { status, diagnostic }
            }
            EngineError::MissingOutput { name } => JobError::MissingOutput { name },
            EngineError::Cleanup { name, reason } => JobError::Staging {
                reason: format!("{}: {}", name, reason),
            },
            EngineError::Cancelled => JobError::Cancelled,
        }
    }
}

/// Event stream form of [`JobObserver`], for consumers on another thread.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum JobEvent {
    State { job_id: Uuid, state: JobState },
    Progress { pct: f64 },
    Log { entry: LogEntry },
}

/// Caller-supplied sink for job events. Called on the submitting thread,
/// in order, while `submit` is running.
pub trait JobObserver {
    fn on_state(&mut self, _job_id: Uuid, _state: JobState) {}

    fn on_progress(&mut self, _pct: f64) {}

    fn on_log(&mut self, _entry: &LogEntry) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl JobObserver for SilentObserver {}

impl JobObserver for Vec<JobEvent> {
    fn on_state(&mut self, job_id: Uuid, state: JobState) {
        self.push(JobEvent::State { job_id, state });
    }

    fn on_progress(&mut self, pct: f64) {
        self.push(JobEvent::Progress { pct });
    }

    fn on_log(&mut self, entry: &LogEntry) {
        self.push(JobEvent::Log {
            entry: entry.clone(),
        });
    }
}

impl JobObserver for Sender<JobEvent> {
    fn on_state(&mut self, job_id: Uuid, state: JobState) {
        let _ = self.send(JobEvent::State { job_id, state });
    }

    fn on_progress(&mut self, pct: f64) {
        let _ = self.send(JobEvent::Progress { pct });
    }

    fn on_log(&mut self, entry: &LogEntry) {
        let _ = self.send(JobEvent::Log {
            entry: entry.clone(),
        });
    }
}

/// Successful job result.
#[derive(Debug, Clone)]
pub struct JobOutput {
    pub job_id: Uuid,
    pub data: Vec<u8>,
    pub summary: ResultSummary,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Keeps the published job snapshot and the caller's observer in step.
struct Tracker<'a> {
    slot: &'a Mutex<Option<Job>>,
    observer: &'a mut dyn JobObserver,
    cancel: &'a AtomicBool,
    job_id: Uuid,
}

impl Tracker<'_> {
    fn update<R>(&self, f: impl FnOnce(&mut Job) -> R) -> Option<R> {
        lock(self.slot).as_mut().map(f)
    }

    fn transition(&mut self, state: JobState) {
        self.update(|job| job.state = state);
        info!(job_id = %self.job_id, %state, "job state");
        self.observer.on_state(self.job_id, state);
    }

    fn log(&mut self, entry: LogEntry) {
        self.observer.on_log(&entry);
        self.update(|job| job.logs.push(entry));
    }
}

impl EngineObserver for Tracker<'_> {
    fn on_log(&mut self, message: &str) {
        self.log(LogEntry::info(message));
    }

    fn on_progress(&mut self, pct: f64) {
        self.update(|job| job.progress_pct = pct);
        self.observer.on_progress(pct);
    }

    fn cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

pub struct JobController<E: Engine> {
    engine: Arc<Mutex<E>>,
    engine_state: Mutex<EngineState>,
    current: Mutex<Option<Job>>,
    cancel: AtomicBool,
    log_command: bool,
}

impl<E: Engine> JobController<E> {
    pub fn new(engine: Arc<Mutex<E>>) -> Self {
        let engine_state = lock(&*engine).state();
        Self {
            engine,
            engine_state: Mutex::new(engine_state),
            current: Mutex::new(None),
            cancel: AtomicBool::new(false),
            log_command: true,
        }
    }

    /// Whether the synthesized command line is added to each job's log.
    pub fn with_log_command(mut self, enabled: bool) -> Self {
        self.log_command = enabled;
        self
    }

    pub fn engine(&self) -> &Arc<Mutex<E>> {
        &self.engine
    }

    /// Last observed engine lifecycle state.
    pub fn engine_state(&self) -> EngineState {
        *lock(&self.engine_state)
    }

    /// Snapshot of the running or most recently finished job.
    pub fn current_job(&self) -> Option<Job> {
        lock(&self.current).clone()
    }

    /// True when a submit right now would be accepted.
    pub fn can_submit(&self) -> bool {
        let job_active = lock(&self.current)
            .as_ref()
            .is_some_and(|job| job.state.is_active());
        self.engine_state() == EngineState::Ready && !job_active
    }

    fn set_engine_state(&self, state: EngineState) {
        *lock(&self.engine_state) = state;
    }

    /// Load the engine. Safe to call again after a failure.
    pub fn load(&self, observer: &mut dyn JobObserver) -> Result<(), JobError> {
        let mut engine = match self.engine.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(JobError::Busy),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        self.set_engine_state(EngineState::Loading);
        let result = engine.initialize();
        self.set_engine_state(engine.state());

        match result {
            Ok(()) => {
                info!(engine = engine.name(), "engine ready");
                observer.on_log(&LogEntry::success("FFmpeg core loaded successfully"));
                Ok(())
            }
            Err(e) => {
                error!(engine = engine.name(), error = %e, "engine failed to load");
                observer.on_log(&LogEntry::error(format!("Failed to load FFmpeg: {}", e)));
                Err(e.into())
            }
        }
    }

    /// Ask the running encode to stop. Returns false when nothing is encoding.
    pub fn cancel(&self) -> bool {
        let encoding = lock(&self.current)
            .as_ref()
            .is_some_and(|job| job.state == JobState::Encoding);
        if encoding {
            info!("cancellation requested");
            self.cancel.store(true, Ordering::SeqCst);
        }
        encoding
    }

    /// Run one job to completion on the calling thread.
    ///
    /// Rejected with [`JobError::Busy`] while another job holds the engine;
    /// the running job is left untouched in that case.
    pub fn submit(
        &self,
        input: &InputFile,
        settings: CompressionSettings,
        observer: &mut dyn JobObserver,
    ) -> Result<JobOutput, JobError> {
        let mut engine = match self.engine.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                warn!(file = %input.name, "rejecting submission: engine busy");
                return Err(JobError::Busy);
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        let state = engine.state();
        self.set_engine_state(state);
        if state != EngineState::Ready {
            return Err(JobError::EngineUnavailable {
                reason: format!("engine is {}", state),
            });
        }

        let input_name = staged_input_name(&input.name);
        let output_name = staged_output_name(settings.format);
        let mut job = Job::new(input_name.clone(), output_name.clone());
        let started = Instant::now();
        job.started_at = Some(started);
        let job_id = job.id;

        self.cancel.store(false, Ordering::SeqCst);
        *lock(&self.current) = Some(job);
        info!(%job_id, file = %input.name, %settings, "job submitted");

        let mut tracker = Tracker {
            slot: &self.current,
            observer,
            cancel: &self.cancel,
            job_id,
        };
        tracker.log(LogEntry::info("Starting compression..."));

        let result = self.run(
            &mut *engine,
            &mut tracker,
            input,
            &settings,
            &input_name,
            &output_name,
        );

        for name in [&input_name, &output_name] {
            if let Err(e) = engine.delete_entry(name) {
                warn!(%job_id, error = %e, "cleanup failed");
                tracker.log(LogEntry::error(format!("Cleanup failed: {}", e)));
            }
        }

        match result {
            Ok(data) => {
                let summary = ResultSummary {
                    original_size: input.declared_size,
                    new_size: data.len() as u64,
                    elapsed: started.elapsed(),
                    suggested_filename: suggested_filename(&input.name, settings.format),
                };
                tracker.update(|job| job.summary = Some(summary.clone()));
                tracker.log(LogEntry::success("Compression finished successfully!"));
                tracker.transition(JobState::Succeeded);
                Ok(JobOutput {
                    job_id,
                    data,
                    summary,
                })
            }
            Err(e) => {
                error!(%job_id, error = %e, "job failed");
                tracker.update(|job| job.last_error = Some(e.to_string()));
                tracker.log(LogEntry::error(format!("Compression Error: {}", e)));
                tracker.transition(JobState::Failed);
                Err(e)
            }
        }
    }

    fn run(
        &self,
        engine: &mut E,
        tracker: &mut Tracker<'_>,
        input: &InputFile,
        settings: &CompressionSettings,
        input_name: &str,
        output_name: &str,
    ) -> Result<Vec<u8>, JobError> {
        tracker.transition(JobState::Staging);
        engine.stage_input(input_name, &input.data)?;

        tracker.transition(JobState::Encoding);
        let params = resolve(settings);
        let args = synthesize(input_name, output_name, &params);
        let command = format_ffmpeg_cmd(&args);
        debug!(%command, "synthesized command");
        if self.log_command {
            tracker.log(LogEntry::info(format!("Running command: {}", command)));
        }
        engine.execute(&args, tracker)?;

        tracker.transition(JobState::Finalizing);
        Ok(engine.read_output(output_name)?)
    }
}
