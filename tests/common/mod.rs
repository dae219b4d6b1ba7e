#![allow(dead_code)] // Each test binary uses a different subset

pub mod ffmpeg_runner;

use pixelsqueeze::engine::{JobEvent, JobState, LogEntry, Severity};

/// Job states in the order they were reported
pub fn states(events: &[JobEvent]) -> Vec<JobState> {
    events
        .iter()
        .filter_map(|e| match e {
            JobEvent::State { state, .. } => Some(*state),
            _ => None,
        })
        .collect()
}

/// Progress values in the order they were reported
pub fn progress(events: &[JobEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Progress { pct } => Some(*pct),
            _ => None,
        })
        .collect()
}

pub fn logs(events: &[JobEvent]) -> Vec<LogEntry> {
    events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Log { entry } => Some(entry.clone()),
            _ => None,
        })
        .collect()
}

pub fn messages_with(events: &[JobEvent], severity: Severity) -> Vec<String> {
    logs(events)
        .into_iter()
        .filter(|entry| entry.severity == severity)
        .map(|entry| entry.message)
        .collect()
}
