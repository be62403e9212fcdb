//! Watch mode for automatic rebuilds on file changes
//!
//! Provides file system watching with debouncing for the `langpack watch` command.

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::build::{Artifact, BuildError};
use crate::config::schema::WatchConfig;

/// Error during watch mode
#[derive(Debug, Error)]
pub enum WatchError {
    /// Failed to initialize file watcher
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(#[source] notify::Error),
    /// Failed to add watch path
    #[error("Failed to watch path: {0}")]
    WatchPath(#[source] notify::Error),
    /// Channel receive error
    #[error("Watch channel error: {0}")]
    ChannelError(String),
    /// Source directory not found
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
}

/// Options for watch mode
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Source directory to watch
    pub src_dir: PathBuf,
    /// Watch configuration (debounce, clear screen)
    pub config: WatchConfig,
    /// Verbose output
    pub verbose: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self { src_dir: PathBuf::from("src"), config: WatchConfig::default(), verbose: false }
    }
}

/// Outcome of one rebuild, as reported to the console.
#[derive(Debug)]
pub struct Rebuild {
    /// The build result
    pub result: Result<Artifact, BuildError>,
    /// Build duration
    pub duration: Duration,
}

impl Rebuild {
    /// Check if the rebuild succeeded
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Tracks whether the previous build failed, to announce recovery.
#[derive(Debug, Default)]
pub struct RecoveryTracker {
    failing: bool,
}

impl RecoveryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rebuild. Returns true when it fixed a previously failing build.
    pub fn update(&mut self, rebuild: &Rebuild) -> bool {
        let recovered = self.failing && rebuild.success();
        self.failing = !rebuild.success();
        recovered
    }

    /// Whether the last build failed
    pub fn is_failing(&self) -> bool {
        self.failing
    }
}

/// Clear the terminal screen
fn clear_screen() {
    // ANSI escape code to clear screen and move cursor to top-left
    print!("\x1B[2J\x1B[1;1H");
}

/// Format duration for display
fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

/// Get current timestamp for logging
fn timestamp() -> String {
    use std::time::SystemTime;
    let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
    let secs = now.as_secs() % 86400; // seconds since midnight
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Perform a single build iteration, timing it.
pub fn do_build<F>(build_fn: F) -> Rebuild
where
    F: FnOnce() -> Result<Artifact, BuildError>,
{
    let start = Instant::now();
    let result = build_fn();
    Rebuild { result, duration: start.elapsed() }
}

/// Watch for file changes and rebuild automatically.
///
/// This function blocks and runs until interrupted (Ctrl+C). A failed build
/// is reported and watching continues.
///
/// # Arguments
/// * `options` - Watch mode configuration
/// * `build_fn` - Runs one build; called on startup and after each change
///
/// # Returns
/// * `Ok(())` if watch mode exits cleanly (shouldn't happen normally)
/// * `Err(WatchError)` if watch setup fails
pub fn watch_and_rebuild<F>(options: WatchOptions, mut build_fn: F) -> Result<(), WatchError>
where
    F: FnMut() -> Result<Artifact, BuildError>,
{
    // Verify source directory exists
    if !options.src_dir.exists() {
        return Err(WatchError::SourceNotFound(options.src_dir.clone()));
    }

    // Create channel for debounced events
    let (tx, rx) = channel();

    // Create debounced watcher
    let debounce_duration = Duration::from_millis(options.config.debounce_ms as u64);
    let mut debouncer = new_debouncer(debounce_duration, tx).map_err(WatchError::WatcherInit)?;

    // Start watching the source directory
    debouncer
        .watcher()
        .watch(&options.src_dir, RecursiveMode::Recursive)
        .map_err(WatchError::WatchPath)?;
    tracing::debug!(dir = %options.src_dir.display(), debounce_ms = options.config.debounce_ms, "watching");

    let mut tracker = RecoveryTracker::new();

    // Initial build
    if options.config.clear_screen {
        clear_screen();
    }
    println!("[{}] Building...", timestamp());
    let rebuild = do_build(&mut build_fn);
    let recovered = tracker.update(&rebuild);
    print_rebuild(&rebuild, recovered, options.verbose);
    println!("[{}] Watching {} for changes...", timestamp(), options.src_dir.display());

    // Watch loop
    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                // Filter for relevant file changes
                let relevant_changes: Vec<_> = events
                    .iter()
                    .filter(|e| {
                        matches!(e.kind, DebouncedEventKind::Any) && is_relevant_file(&e.path)
                    })
                    .collect();

                if relevant_changes.is_empty() {
                    continue;
                }

                for event in &relevant_changes {
                    if let Some(name) = event.path.file_name() {
                        println!("[{}] Changed: {}", timestamp(), name.to_string_lossy());
                    }
                }

                if options.config.clear_screen {
                    clear_screen();
                }

                println!("[{}] Building...", timestamp());
                let rebuild = do_build(&mut build_fn);
                let recovered = tracker.update(&rebuild);
                print_rebuild(&rebuild, recovered, options.verbose);

                println!("[{}] Watching {} for changes...", timestamp(), options.src_dir.display());
            }
            Ok(Err(error)) => {
                // Watch error (non-fatal) - log but continue watching
                eprintln!("[{}] Watch error: {:?}", timestamp(), error);
                eprintln!("[{}] Continuing to watch...", timestamp());
            }
            Err(e) => {
                return Err(WatchError::ChannelError(e.to_string()));
            }
        }
    }
}

/// Check if a file is relevant for rebuilding.
///
/// Only script sources count; hidden files (editor swap files and the
/// assembler's scratch manifest) are ignored.
fn is_relevant_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(true);
    if hidden {
        return false;
    }
    path.extension().map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("js")).unwrap_or(false)
}

/// Print a rebuild outcome to the console
fn print_rebuild(rebuild: &Rebuild, recovered: bool, verbose: bool) {
    if recovered {
        println!("[{}] Fixed: build is passing again", timestamp());
    }

    match &rebuild.result {
        Ok(artifact) => {
            println!(
                "[{}] Build complete ({}) - {}",
                timestamp(),
                format_duration(rebuild.duration),
                artifact.path.display()
            );
            if verbose {
                println!("{}", artifact.summary());
            }
        }
        Err(error) => {
            println!("[{}] Build failed ({})", timestamp(), format_duration(rebuild.duration));
            eprintln!("[{}] Error: {}", timestamp(), error);
        }
    }
}
