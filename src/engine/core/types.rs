use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Idle,
    Staging,
    Encoding,
    Finalizing,
    Succeeded,
    Failed,
}

impl JobState {
    /// Staging, Encoding and Finalizing hold the engine.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            JobState::Staging | JobState::Encoding | JobState::Finalizing
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Idle => "idle",
            JobState::Staging => "staging",
            JobState::Encoding => "encoding",
            JobState::Finalizing => "finalizing",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
}

impl LogEntry {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Local::now(),
            severity,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }
}

/// Raw file handed over by the caller.
#[derive(Debug, Clone)]
pub struct InputFile {
    /// Original file name; only its extension and base name are used.
    pub name: String,
    pub data: Vec<u8>,
    /// Size as reported by the caller's file source. Not re-validated here.
    pub declared_size: u64,
}

impl InputFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        let declared_size = data.len() as u64;
        Self {
            name: name.into(),
            data,
            declared_size,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultSummary {
    pub original_size: u64,
    pub new_size: u64,
    pub elapsed: Duration,
    pub suggested_filename: String,
}

impl ResultSummary {
    /// Percentage saved relative to the original; negative when the output grew.
    pub fn savings_pct(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (1.0 - self.new_size as f64 / self.original_size as f64) * 100.0
    }
}

/// Snapshot of one transcode attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub input_name: String,
    pub output_name: String,
    pub state: JobState,
    pub progress_pct: f64,
    pub logs: Vec<LogEntry>,

    #[serde(skip)] // Don't serialize Instant
    pub started_at: Option<std::time::Instant>,

    pub summary: Option<ResultSummary>,
    pub last_error: Option<String>,
}

impl Job {
    pub fn new(input_name: String, output_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            input_name,
            output_name,
            state: JobState::Idle,
            progress_pct: 0.0,
            logs: Vec::new(),
            started_at: None,
            summary: None,
            last_error: None,
        }
    }
}

/// Parser for ffmpeg progress output (key=value format)
#[derive(Debug, Default, Clone)]
pub struct ProgressParser {
    pub out_time_us: u64,
    pub is_complete: bool,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a single line of ffmpeg progress output.
    /// Returns true when the line closes a progress block.
    pub fn parse_line(&mut self, line: &str) -> bool {
        let Some((key, value)) = line.split_once('=') else {
            return false;
        };
        let value = value.trim();
        match key.trim() {
            "out_time_us" => {
                // ffmpeg prints N/A before the first frame is muxed
                if let Ok(us) = value.parse::<u64>() {
                    self.out_time_us = us;
                }
            }
            "progress" => {
                if value == "end" {
                    self.is_complete = true;
                }
                return true;
            }
            _ => {}
        }
        false
    }

    /// Get output time in seconds
    pub fn out_time_s(&self) -> f64 {
        self.out_time_us as f64 / 1_000_000.0
    }

    /// Percentage of `duration_s` encoded so far, within [0, 100].
    pub fn progress_pct(&self, duration_s: Option<f64>) -> Option<f64> {
        if self.is_complete {
            return Some(100.0);
        }
        match duration_s {
            Some(dur) if dur > 0.0 => Some((self.out_time_s() / dur * 100.0).clamp(0.0, 100.0)),
            _ => None,
        }
    }
}
