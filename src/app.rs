use crate::cli::{Cli, Commands, SettingsArgs};
use anyhow::{Context, Result};
use pixelsqueeze::config::Config;
use pixelsqueeze::engine::{
    self, Engine, FfmpegEngine, InputFile, JobController, JobError, JobEvent, JobObserver,
    JobState, LogEntry, ResultSummary, Severity,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub fn run(cli: Cli) {
    let result = match cli.command {
        Commands::Compress {
            file,
            settings,
            output_dir,
            verbose,
            json,
        } => handle_compress(&file, &settings, output_dir, verbose, json),
        Commands::DryRun { file, settings } => handle_dry_run(&file, &settings),
        Commands::CheckFfmpeg => handle_check_ffmpeg(),
        Commands::InitConfig => handle_init_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Human-readable byte count (1024-based)
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        return format!("{} {}", bytes, UNITS[0]);
    }
    // Two decimals, trailing zeros dropped: 1.5 KB, 50 MB
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}

/// Prints job events to the terminal
struct ConsoleObserver {
    verbose: bool,
    json: bool,
    progress_shown: bool,
}

impl ConsoleObserver {
    fn new(verbose: bool, json: bool) -> Self {
        Self {
            verbose,
            json,
            progress_shown: false,
        }
    }

    fn emit_json(&self, event: &JobEvent) {
        if let Ok(line) = serde_json::to_string(event) {
            println!("{}", line);
        }
    }

    fn end_progress_line(&mut self) {
        if self.progress_shown {
            println!();
            self.progress_shown = false;
        }
    }
}

impl JobObserver for ConsoleObserver {
    fn on_state(&mut self, job_id: Uuid, state: JobState) {
        if self.json {
            self.emit_json(&JobEvent::State { job_id, state });
        }
    }

    fn on_progress(&mut self, pct: f64) {
        if self.json {
            self.emit_json(&JobEvent::Progress { pct });
            return;
        }
        print!("\rProgress: {:.1}%", pct);
        std::io::stdout().flush().ok();
        self.progress_shown = true;
    }

    fn on_log(&mut self, entry: &LogEntry) {
        if self.json {
            self.emit_json(&JobEvent::Log {
                entry: entry.clone(),
            });
            return;
        }
        match entry.severity {
            Severity::Info if !self.verbose => {}
            Severity::Info => {
                self.end_progress_line();
                eprintln!("[{}] {}", entry.timestamp.format("%H:%M:%S"), entry.message);
            }
            Severity::Success | Severity::Error => {
                self.end_progress_line();
                eprintln!("{}", entry.message);
            }
        }
    }
}

/// Load the user's config, refusing to run on defaults when the file is broken
fn load_config() -> Result<Config> {
    load_config_from(&Config::config_path()?)
}

fn load_config_from(path: &Path) -> Result<Config> {
    Config::load_from(path).context(
        "Config file is invalid; fix it, or run 'pixelsqueeze init-config' to replace it with defaults",
    )
}

fn file_loaded_entry(input: &InputFile) -> LogEntry {
    LogEntry::info(format!(
        "File loaded: {} ({})",
        input.name,
        format_bytes(input.declared_size)
    ))
}

fn precheck_input(file: &Path, max_input_bytes: u64) -> Result<u64> {
    if !engine::is_video_file(file) {
        anyhow::bail!("{} does not look like a video file", file.display());
    }
    let size = fs::metadata(file)
        .with_context(|| format!("Failed to read {}", file.display()))?
        .len();
    if size > max_input_bytes {
        anyhow::bail!(
            "File size {} exceeds processing limit ({})",
            format_bytes(size),
            format_bytes(max_input_bytes)
        );
    }
    Ok(size)
}

fn output_dir_for(file: &Path, cli_dir: Option<PathBuf>, config: &Config) -> PathBuf {
    cli_dir
        .or_else(|| config.defaults.output_dir.clone())
        .unwrap_or_else(|| {
            file.parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        })
}

fn print_summary(summary: &ResultSummary, written_to: &Path) {
    println!("Saved {}", written_to.display());
    println!("  Original: {}", format_bytes(summary.original_size));
    println!(
        "  New:      {} ({:+.1}%)",
        format_bytes(summary.new_size),
        -summary.savings_pct()
    );
    println!("  Time:     {}", format_duration(summary.elapsed));
}

fn handle_compress(
    file: &Path,
    settings_args: &SettingsArgs,
    output_dir: Option<PathBuf>,
    verbose: bool,
    json: bool,
) -> Result<()> {
    let config = load_config()?;
    let settings = settings_args.apply(config.defaults.settings());

    let declared_size = precheck_input(file, config.defaults.max_input_bytes)?;
    let data = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("input")
        .to_string();
    let input = InputFile {
        name,
        data,
        declared_size,
    };

    let engine = Arc::new(Mutex::new(FfmpegEngine::new(config.engine.clone())));
    let controller =
        JobController::new(Arc::clone(&engine)).with_log_command(config.engine.log_command);
    let mut observer = ConsoleObserver::new(verbose, json);

    controller
        .load(&mut observer)
        .context("ffmpeg engine unavailable")?;

    if !json {
        println!("Compressing {} ({})", file.display(), settings);
    }
    observer.on_log(&file_loaded_entry(&input));
    let result = controller.submit(&input, settings, &mut observer);
    observer.end_progress_line();

    if let Ok(mut engine) = engine.lock() {
        engine.shutdown();
    }

    match result {
        Ok(output) => {
            let dir = output_dir_for(file, output_dir, &config);
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
            let dest = dir.join(&output.summary.suggested_filename);
            fs::write(&dest, &output.data)
                .with_context(|| format!("Failed to write {}", dest.display()))?;

            if !json {
                print_summary(&output.summary, &dest);
            }
            Ok(())
        }
        Err(e) => {
            if let (Some(diagnostic), false) = (e.diagnostic(), verbose || json) {
                eprintln!("{}", diagnostic);
            }
            if matches!(e, JobError::Busy) {
                eprintln!("Another job is running; try again once it finishes.");
            }
            Err(e.into())
        }
    }
}

fn handle_dry_run(file: &Path, settings_args: &SettingsArgs) -> Result<()> {
    let config = load_config()?;
    let settings = settings_args.apply(config.defaults.settings());
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .context("File name is not valid UTF-8")?;

    let args = engine::synthesize(
        &engine::staged_input_name(name),
        &engine::staged_output_name(settings.format),
        &engine::resolve(&settings),
    );
    println!("Dry run: {} ({})", file.display(), settings);
    println!("{}", engine::format_ffmpeg_cmd(&args));
    println!(
        "Output: {}",
        engine::suggested_filename(name, settings.format)
    );
    Ok(())
}

fn handle_check_ffmpeg() -> Result<()> {
    let config = load_config()?;
    let version = engine::ffmpeg_version(&config.engine.ffmpeg_path)?;
    println!("ffmpeg found: {}", version);
    Ok(())
}

fn handle_init_config() -> Result<()> {
    match Config::load() {
        Ok(cfg) => {
            match Config::config_path() {
                Ok(path) => println!("Config loaded successfully from {}", path.display()),
                Err(e) => println!("Config loaded, but config path unknown: {:#}", e),
            }
            println!("{:#?}", cfg);
        }
        Err(e) => {
            println!("Config missing or invalid: {:#}", e);
            println!("Creating default config...");

            Config::default()
                .save()
                .context("Failed to save default config")?;
            match Config::config_path() {
                Ok(path) => println!("Default config saved to {}", path.display()),
                Err(e) => println!("Default config saved (path unknown): {:#}", e),
            }
        }
    }
    Ok(())
}
