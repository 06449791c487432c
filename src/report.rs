use crate::courier::Reporter;
use crate::stats::StatsSummary;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Console-and-file reporter used by the binary. Status and statistics go to
/// tracing; move-log lines are buffered during a cycle and appended to the
/// persistent log in one batch when the cycle completes. The log file is
/// opened in append mode per batch and never truncated.
pub struct LogFileReporter {
    log_path: PathBuf,
    pending: Vec<String>,
}

impl LogFileReporter {
    pub fn new(log_path: PathBuf) -> Self {
        LogFileReporter {
            log_path,
            pending: Vec::new(),
        }
    }

    fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let opened = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path);
        match opened {
            Ok(mut file) => {
                for line in self.pending.drain(..) {
                    if let Err(e) = writeln!(file, "{line}") {
                        tracing::warn!("Could not append to move log: {e}");
                        break;
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Could not open move log {:?}: {e}", self.log_path);
                self.pending.clear();
            }
        }
    }
}

impl Reporter for LogFileReporter {
    fn on_status_changed(&mut self, message: &str) {
        tracing::info!("{message}");
    }

    fn on_log_line(&mut self, line: &str) {
        tracing::info!("{line}");
        self.pending.push(line.to_string());
    }

    fn on_stats_updated(&mut self, summary: &StatsSummary) {
        tracing::debug!(
            "Stats: {} runs, {} files moved, {} overwritten",
            summary.runs,
            summary.files_moved,
            summary.overwritten_count,
        );
    }

    fn on_cycle_complete(&mut self, _moved: usize, _total_found: usize) {
        self.flush_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_appended_per_cycle_batch() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("moves.log");
        let mut reporter = LogFileReporter::new(log_path.clone());

        reporter.on_log_line("first");
        reporter.on_log_line("second");
        assert!(!log_path.exists());

        reporter.on_cycle_complete(2, 2);
        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(contents, "first\nsecond\n");

        // A later batch appends, never truncates.
        reporter.on_log_line("third");
        reporter.on_cycle_complete(1, 1);
        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(contents, "first\nsecond\nthird\n");
    }

    #[test]
    fn empty_cycle_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("moves.log");
        let mut reporter = LogFileReporter::new(log_path.clone());

        reporter.on_cycle_complete(0, 0);
        assert!(!log_path.exists());
    }
}
