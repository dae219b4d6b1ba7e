//! The seam between the job controller and the media engine.
//!
//! An [`Engine`] owns one engine instance together with a private namespace
//! of staged files. The controller only ever talks to it through this trait,
//! which keeps the ffmpeg process plumbing in [`crate::engine::ffmpeg`] and
//! lets tests drive the controller with a scripted engine.

use std::fmt;
use thiserror::Error;

/// Lifecycle of an engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Unloaded,
    Loading,
    Ready,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineState::Unloaded => "unloaded",
            EngineState::Loading => "loading",
            EngineState::Ready => "ready",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine artifacts are missing or unusable on this host.
    #[error("engine unavailable: {reason}")]
    Load { reason: String },

    /// An operation other than `initialize` was called before the engine was ready.
    #[error("engine is {state}, not ready")]
    NotReady { state: EngineState },

    #[error("failed to stage '{name}': {reason}")]
    Staging { name: String, reason: String },

    /// The engine ran but reported failure. `diagnostic` is the engine's own
    /// output, passed through untouched.
    #[error("encode failed ({status})")]
    Execution { status: String, diagnostic: String },

    #[error("engine produced no output named '{name}'")]
    MissingOutput { name: String },

    #[error("failed to remove staged entry '{name}': {reason}")]
    Cleanup { name: String, reason: String },

    #[error("encode cancelled")]
    Cancelled,
}

/// Receives events while [`Engine::execute`] runs.
///
/// Calls arrive synchronously on the thread that called `execute`, in the
/// order the engine produced them. Implementations must return quickly.
pub trait EngineObserver {
    /// One diagnostic line from the engine.
    fn on_log(&mut self, message: &str);

    /// Encode progress as a percentage in [0, 100].
    fn on_progress(&mut self, pct: f64);

    /// Polled during execution; engines that can abort stop when this is true.
    fn cancel_requested(&self) -> bool {
        false
    }
}

/// Observer that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl EngineObserver for NullObserver {
    fn on_log(&mut self, _message: &str) {}

    fn on_progress(&mut self, _pct: f64) {}
}

pub trait Engine: Send {
    /// Short name for diagnostics.
    fn name(&self) -> &str;

    fn state(&self) -> EngineState;

    /// Load the engine. Repeated calls after success are no-ops.
    fn initialize(&mut self) -> Result<(), EngineError>;

    /// Make `bytes` available to the engine under `name`.
    fn stage_input(&mut self, name: &str, bytes: &[u8]) -> Result<(), EngineError>;

    /// Run one encode to completion. The observer passed here is the only
    /// one that receives events for this run.
    fn execute(
        &mut self,
        args: &[String],
        observer: &mut dyn EngineObserver,
    ) -> Result<(), EngineError>;

    fn read_output(&mut self, name: &str) -> Result<Vec<u8>, EngineError>;

    /// Remove `name` from the namespace. `Ok(false)` when it was never there.
    fn delete_entry(&mut self, name: &str) -> Result<bool, EngineError>;

    /// Names currently staged, sorted.
    fn staged_entries(&self) -> Vec<String>;

    /// Release the engine and everything staged in it.
    fn shutdown(&mut self);
}

/// Reject anything that could escape the namespace.
pub fn validate_entry_name(name: &str) -> Result<(), EngineError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(EngineError::Staging {
            name: name.to_string(),
            reason: "not a plain file name".to_string(),
        });
    }
    Ok(())
}
