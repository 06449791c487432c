use crate::config::{self, RunConfig};
use crate::relocate::relocate;
use crate::select::select_files;
use crate::stats::{FileRecord, RunStats, StatsSummary};
use chrono::{DateTime, Local};
use regex::Regex;
use std::path::Path;
use sysinfo::Disks;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::Receiver;
use tokio::time::{sleep, Duration};

/// Control messages for the courier task. `Start`/`Stop`/`Clear`/`Reset`
/// mirror the buttons of the original mover; `Shutdown` ends the task.
#[derive(Debug)]
pub enum Message {
    Start(RunConfig),
    Stop,
    Clear,
    Reset,
    Shutdown,
}

/// Idle and Stopped behave identically (config editable, no wait armed);
/// they are kept apart so status messages can tell a fresh courier from a
/// stopped one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum State {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug)]
pub enum CourierError {
    BadPattern(String),
    BadSourceDir(String),
    BadDestDir(String),
}

impl std::fmt::Display for CourierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadPattern(pattern) => {
                write!(f, "Pattern {pattern:?} is not a valid regular expression")
            }
            Self::BadSourceDir(dir) => write!(
                f,
                "Source {dir:?} is not an existing writable directory"
            ),
            Self::BadDestDir(dir) => write!(
                f,
                "Destination {dir:?} is not an existing writable directory"
            ),
        }
    }
}

impl std::error::Error for CourierError {}

/// Reporting callbacks the courier drives. The courier never renders
/// anything itself; the binary's reporter decides what reaches the console
/// and the move log.
pub trait Reporter {
    fn on_status_changed(&mut self, message: &str);
    fn on_log_line(&mut self, line: &str);
    fn on_stats_updated(&mut self, summary: &StatsSummary);
    fn on_cycle_complete(&mut self, moved: usize, total_found: usize);
}

/// A validated, locked configuration for the duration of one running stint.
struct ActiveRun {
    config: RunConfig,
    pattern: Regex,
}

/// What a finished cycle asks the main loop to do next.
enum Aftermath {
    Continue,
    Stop,
    Clear,
    Shutdown,
}

/// The scheduler. Owns the statistics ledger and the state machine; all
/// interaction goes through the control channel, so there is never more
/// than one cycle in flight and no locking anywhere.
pub struct Courier<R: Reporter> {
    rx: Receiver<Message>,
    reporter: R,
    stats: RunStats,
    state: State,
    config: Option<RunConfig>,
}

impl<R: Reporter> Courier<R> {
    pub fn new(rx: Receiver<Message>, reporter: R) -> Self {
        Courier {
            rx,
            reporter,
            stats: RunStats::new(),
            state: State::Idle,
            config: None,
        }
    }

    /// Runs until `Shutdown` arrives or all senders are dropped. Returns the
    /// final statistics snapshot.
    pub async fn run(mut self) -> StatsSummary {
        let mut active: Option<ActiveRun> = None;

        'outer: loop {
            let Some(run) = active.as_ref() else {
                match self.rx.recv().await {
                    Some(message) => {
                        if self.handle_inactive_message(message, &mut active) {
                            break;
                        }
                    }
                    None => break,
                }
                continue;
            };

            match self.execute_cycle(run).await {
                Aftermath::Shutdown => break,
                Aftermath::Stop => {
                    active = None;
                    self.stop();
                }
                Aftermath::Clear => {
                    active = None;
                    self.stop();
                    self.clear();
                }
                Aftermath::Continue => {
                    // Re-armed only after the cycle's bookkeeping is done.
                    let wait = sleep(Duration::from_secs(run.config.interval_seconds));
                    tokio::pin!(wait);
                    loop {
                        tokio::select! {
                            _ = &mut wait => break,
                            message = self.rx.recv() => match message {
                                Some(Message::Stop) => {
                                    active = None;
                                    self.stop();
                                    continue 'outer;
                                }
                                Some(Message::Clear) => {
                                    active = None;
                                    self.stop();
                                    self.clear();
                                    continue 'outer;
                                }
                                Some(Message::Reset) => self.reset_fields(),
                                Some(Message::Start(_)) => {
                                    self.reporter.on_status_changed("Courier is already running");
                                }
                                Some(Message::Shutdown) | None => break 'outer,
                            }
                        }
                    }
                }
            }
        }

        self.stats.summary()
    }

    /// Handles a message while no run is active. Returns true on shutdown.
    fn handle_inactive_message(&mut self, message: Message, active: &mut Option<ActiveRun>) -> bool {
        match message {
            Message::Start(config) => match self.validate(config) {
                Ok(run) => {
                    if self.config.is_some() {
                        tracing::debug!("Replacing previously submitted configuration");
                    }
                    self.config = Some(run.config.clone());
                    self.state = State::Running;
                    let mut status = format!(
                        "Watching {} for {:?} every {}s, moving to {}",
                        run.config.source_dir,
                        run.config.pattern,
                        run.config.interval_seconds,
                        run.config.dest_dir,
                    );
                    if let Some(disk) = dest_disk_status(&run.config.dest_dir) {
                        status.push_str(&format!(" ({disk})"));
                    }
                    tracing::info!("{status}");
                    self.reporter.on_status_changed(&status);
                    *active = Some(run);
                }
                Err(e) => {
                    tracing::error!("Rejected start: {e}");
                    self.reporter.on_status_changed(&e.to_string());
                }
            },
            Message::Stop => {
                let status = match self.state {
                    State::Idle => "Courier has not been started",
                    _ => "Courier is not running",
                };
                self.reporter.on_status_changed(status);
            }
            Message::Clear => self.clear(),
            Message::Reset => self.reset_fields(),
            Message::Shutdown => return true,
        }
        false
    }

    fn validate(&self, config: RunConfig) -> Result<ActiveRun, CourierError> {
        let pattern = config::compile_pattern(&config.pattern)
            .ok_or_else(|| CourierError::BadPattern(config.pattern.clone()))?;
        if !config::is_valid_dir(&config.source_dir) {
            return Err(CourierError::BadSourceDir(config.source_dir.clone()));
        }
        if !config::is_valid_dir(&config.dest_dir) {
            return Err(CourierError::BadDestDir(config.dest_dir.clone()));
        }
        Ok(ActiveRun { config, pattern })
    }

    /// One select → relocate-all → accumulate pass. The control channel is
    /// polled before each file so a stop lands within one move's latency;
    /// files moved before the stop are still recorded.
    async fn execute_cycle(&mut self, run: &ActiveRun) -> Aftermath {
        let source = Path::new(&run.config.source_dir);
        let dest = Path::new(&run.config.dest_dir);
        let files = select_files(source, &run.pattern).await;
        let total_found = files.len();

        let mut moved_records = Vec::new();
        let mut overwritten = 0u64;
        let mut skipped = 0usize;
        let mut aftermath = Aftermath::Continue;

        for file in files {
            match self.rx.try_recv() {
                Ok(Message::Stop) => {
                    aftermath = Aftermath::Stop;
                    break;
                }
                Ok(Message::Clear) => {
                    aftermath = Aftermath::Clear;
                    break;
                }
                Ok(Message::Shutdown) => {
                    aftermath = Aftermath::Shutdown;
                    break;
                }
                Ok(Message::Reset) => self.reset_fields(),
                Ok(Message::Start(_)) => {
                    self.reporter.on_status_changed("Courier is already running");
                }
                Err(TryRecvError::Empty) => (),
                Err(TryRecvError::Disconnected) => {
                    aftermath = Aftermath::Shutdown;
                    break;
                }
            }

            match relocate(&file, dest, run.config.overwrite).await {
                Ok(outcome) if outcome.moved => {
                    let moved_at = Local::now();
                    if outcome.dest_existed {
                        overwritten += 1;
                    }
                    let line = move_log_line(moved_at, &file, &run.config, outcome.size_kb);
                    self.reporter.on_log_line(&line);
                    moved_records.push(FileRecord {
                        path: file,
                        size_kb: outcome.size_kb,
                        duration_secs: outcome.duration_secs,
                        moved_at,
                    });
                }
                Ok(_) => {
                    skipped += 1;
                    tracing::info!(
                        "Skipped {file:?}: destination exists and overwriting is off"
                    );
                }
                Err(e) => {
                    // The file may be picked up again next cycle.
                    tracing::warn!("Failed to move {file:?}: {e}");
                }
            }
        }

        self.stats.record_cycle(&moved_records, overwritten);
        let summary = self.stats.summary();
        self.reporter.on_stats_updated(&summary);
        self.reporter.on_cycle_complete(moved_records.len(), total_found);
        self.reporter.on_status_changed(&format!(
            "Run {}: moved {} of {} matching files ({} skipped)",
            summary.runs,
            moved_records.len(),
            total_found,
            skipped,
        ));
        aftermath
    }

    fn stop(&mut self) {
        self.state = State::Stopped;
        tracing::info!("Courier stopped");
        self.reporter.on_status_changed("Courier stopped");
    }

    fn clear(&mut self) {
        self.stats.reset();
        self.config = None;
        let summary = self.stats.summary();
        self.reporter.on_stats_updated(&summary);
        self.reporter.on_status_changed("Statistics and configuration cleared");
    }

    fn reset_fields(&mut self) {
        self.config = None;
        self.reporter.on_status_changed("Configuration fields cleared");
    }
}

/// `[YYYY-MM-DD HH:MM:SS] File <name> moved from <src> to <dest> | Size (kB): <size>`
fn move_log_line(
    moved_at: DateTime<Local>,
    file: &Path,
    config: &RunConfig,
    size_kb: f64,
) -> String {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!(
        "[{}] File {} moved from {} to {} | Size (kB): {}",
        moved_at.format("%Y-%m-%d %H:%M:%S"),
        name,
        config.source_dir,
        config.dest_dir,
        format_size_kb(size_kb),
    )
}

/// Whole sizes print as integers, everything else rounded to 2 decimals.
fn format_size_kb(size_kb: f64) -> String {
    let rounded = (size_kb * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as u64)
    } else {
        format!("{rounded}")
    }
}

/// Free/total space of the disk holding `dest_dir`, for the start status
/// line. Best effort; a miss just omits the detail.
fn dest_disk_status(dest_dir: &str) -> Option<String> {
    let disks = Disks::new_with_refreshed_list();
    let dest = Path::new(dest_dir);
    let disk = disks
        .iter()
        .filter(|disk| dest.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())?;
    Some(format!(
        "{:.1} of {:.1} GB free on {:?}",
        (disk.available_space() as f64) * 1.0e-9,
        (disk.total_space() as f64) * 1.0e-9,
        disk.mount_point(),
    ))
}
