//! Single-file video compression on top of ffmpeg.
//!
//! [`engine::JobController`] runs one job at a time against a shared
//! [`engine::Engine`]: it stages the input, resolves the user's
//! [`engine::CompressionSettings`] into an ffmpeg invocation, relays progress
//! and log lines to a [`engine::JobObserver`], and deletes everything it staged
//! whatever the outcome.

pub mod config;
pub mod engine;
