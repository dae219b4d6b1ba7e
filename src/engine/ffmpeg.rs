//! [`Engine`] backed by a native ffmpeg executable.
//!
//! The staging namespace is a private temporary directory; ffmpeg runs with
//! it as the working directory so staged names are used verbatim on the
//! command line. Engine output is read on two helper threads that publish
//! into a single channel, which `execute` drains on the caller's thread.

use super::adapter::{Engine, EngineError, EngineObserver, EngineState, validate_entry_name};
use super::core::{ProgressParser, build_engine_command, ffmpeg_version, parse_duration_line};
use crate::config::EngineConfig;
use std::collections::VecDeque;
use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// How many trailing stderr lines are kept as the failure diagnostic.
const DIAGNOSTIC_TAIL_LINES: usize = 40;

/// How often the drain loop wakes up to check for cancellation.
const CANCEL_POLL: Duration = Duration::from_millis(100);

enum EngineEvent {
    Log(String),
    Progress(String),
}

fn spawn_line_reader<R, F>(stream: R, tx: Sender<EngineEvent>, wrap: F) -> JoinHandle<()>
where
    R: Read + Send + 'static,
    F: Fn(String) -> EngineEvent + Send + 'static,
{
    thread::spawn(move || {
        // Lossy per line: ffmpeg echoes metadata in whatever encoding the
        // file used, and stopping early would close the pipe under it.
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        let mut forwarding = true;
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
            if !forwarding {
                continue;
            }
            let line = String::from_utf8_lossy(&buf)
                .trim_end_matches(['\n', '\r'])
                .to_string();
            if tx.send(wrap(line)).is_err() {
                // Receiver gone; keep draining so the child never blocks or gets SIGPIPE
                forwarding = false;
            }
        }
    })
}

pub struct FfmpegEngine {
    config: EngineConfig,
    state: EngineState,
    version: Option<String>,
    namespace: Option<TempDir>,
}

impl FfmpegEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: EngineState::Unloaded,
            version: None,
            namespace: None,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// ffmpeg's version banner, once loaded.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Directory backing the staging namespace, once loaded.
    pub fn namespace_dir(&self) -> Option<&Path> {
        self.namespace.as_ref().map(|dir| dir.path())
    }

    fn workdir(&self) -> Result<&Path, EngineError> {
        match (&self.state, &self.namespace) {
            (EngineState::Ready, Some(dir)) => Ok(dir.path()),
            (state, _) => Err(EngineError::NotReady { state: *state }),
        }
    }

    fn create_namespace(&self) -> io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("pixelsqueeze-");
        match &self.config.staging_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                builder.tempdir_in(dir)
            }
            None => builder.tempdir(),
        }
    }

    fn load(&mut self) -> Result<(), EngineError> {
        let version = ffmpeg_version(&self.config.ffmpeg_path).map_err(|e| EngineError::Load {
            reason: format!("{:#}", e),
        })?;
        let namespace = self.create_namespace().map_err(|e| EngineError::Load {
            reason: format!("could not create staging directory: {}", e),
        })?;

        info!(
            version = %version,
            staging = %namespace.path().display(),
            "ffmpeg engine loaded"
        );
        self.version = Some(version);
        self.namespace = Some(namespace);
        Ok(())
    }

    fn drain(
        &self,
        child: &mut Child,
        rx: mpsc::Receiver<EngineEvent>,
        observer: &mut dyn EngineObserver,
    ) -> Result<VecDeque<String>, EngineError> {
        let mut parser = ProgressParser::new();
        let mut duration_s: Option<f64> = None;
        let mut tail: VecDeque<String> = VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES);

        loop {
            if observer.cancel_requested() {
                warn!(pid = child.id(), "cancelling ffmpeg");
                let _ = child.kill();
                let _ = child.wait();
                return Err(EngineError::Cancelled);
            }

            match rx.recv_timeout(CANCEL_POLL) {
                Ok(EngineEvent::Log(line)) => {
                    if duration_s.is_none() {
                        duration_s = parse_duration_line(&line);
                        if let Some(dur) = duration_s {
                            debug!(duration_s = dur, "input duration");
                        }
                    }
                    if tail.len() == DIAGNOSTIC_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line.clone());
                    observer.on_log(&line);
                }
                Ok(EngineEvent::Progress(line)) => {
                    if parser.parse_line(&line) {
                        if let Some(pct) = parser.progress_pct(duration_s) {
                            observer.on_progress(pct);
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Ok(tail),
            }
        }
    }
}

impl Engine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn state(&self) -> EngineState {
        self.state
    }

    fn initialize(&mut self) -> Result<(), EngineError> {
        if self.state == EngineState::Ready {
            return Ok(());
        }

        self.state = EngineState::Loading;
        match self.load() {
            Ok(()) => {
                self.state = EngineState::Ready;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "ffmpeg engine failed to load");
                self.state = EngineState::Unloaded;
                Err(e)
            }
        }
    }

    fn stage_input(&mut self, name: &str, bytes: &[u8]) -> Result<(), EngineError> {
        validate_entry_name(name)?;
        let path = self.workdir()?.join(name);

        fs::write(&path, bytes).map_err(|e| EngineError::Staging {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        debug!(name, bytes = bytes.len(), "staged input");
        Ok(())
    }

    fn execute(
        &mut self,
        args: &[String],
        observer: &mut dyn EngineObserver,
    ) -> Result<(), EngineError> {
        let workdir = self.workdir()?;
        let mut cmd = build_engine_command(
            &self.config.ffmpeg_path,
            &self.config.ffmpeg_log_level,
            workdir,
            args,
        );
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| EngineError::Execution {
            status: "spawn failed".to_string(),
            diagnostic: format!(
                "failed to start {}: {}",
                self.config.ffmpeg_path.display(),
                e
            ),
        })?;
        debug!(pid = child.id(), "ffmpeg started");

        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(stdout, tx.clone(), EngineEvent::Progress));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(stderr, tx.clone(), EngineEvent::Log));
        }
        drop(tx);

        let tail = self.drain(&mut child, rx, observer)?;
        for reader in readers {
            let _ = reader.join();
        }

        let status = child.wait().map_err(|e| EngineError::Execution {
            status: "wait failed".to_string(),
            diagnostic: e.to_string(),
        })?;
        info!(%status, "ffmpeg exited");

        if !status.success() {
            return Err(EngineError::Execution {
                status: status.to_string(),
                diagnostic: Vec::from(tail).join("\n"),
            });
        }
        Ok(())
    }

    fn read_output(&mut self, name: &str) -> Result<Vec<u8>, EngineError> {
        let missing = || EngineError::MissingOutput {
            name: name.to_string(),
        };
        validate_entry_name(name).map_err(|_| missing())?;
        let path = self.workdir()?.join(name);

        fs::read(&path).map_err(|e| {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(name, error = %e, "failed to read engine output");
            }
            missing()
        })
    }

    fn delete_entry(&mut self, name: &str) -> Result<bool, EngineError> {
        if validate_entry_name(name).is_err() {
            return Ok(false);
        }
        let Some(dir) = self.namespace_dir() else {
            return Ok(false);
        };

        match fs::remove_file(dir.join(name)) {
            Ok(()) => {
                debug!(name, "deleted staged entry");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(EngineError::Cleanup {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn staged_entries(&self) -> Vec<String> {
        let Some(dir) = self.namespace_dir() else {
            return Vec::new();
        };
        let mut names: Vec<String> = fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| e.file_name().into_string().ok())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    fn shutdown(&mut self) {
        if let Some(namespace) = self.namespace.take() {
            if let Err(e) = namespace.close() {
                warn!(error = %e, "failed to remove staging directory");
            }
        }
        self.version = None;
        self.state = EngineState::Unloaded;
        info!("ffmpeg engine shut down");
    }
}
