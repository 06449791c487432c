use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;

/// One successfully moved file, as handed to the accumulator at cycle end.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size_kb: f64,
    pub duration_secs: f64,
    pub moved_at: DateTime<Local>,
}

/// The statistics ledger. Owned by the courier task and mutated only at the
/// end of each cycle; collaborators see [`StatsSummary`] snapshots, never
/// this struct.
///
/// Invariants: `files_per_run.len() == total_runs` and
/// `sum(files_per_run) == total_files_moved == file_sizes_kb.len()
/// == move_timestamps.len() == move_durations.len()`.
#[derive(Debug, Default, Serialize)]
pub struct RunStats {
    pub total_files_moved: u64,
    pub total_runs: u64,
    pub files_per_run: Vec<u64>,
    pub file_sizes_kb: Vec<f64>,
    pub move_timestamps: Vec<DateTime<Local>>,
    pub move_durations: Vec<f64>,
    pub overwritten_count: u64,
}

/// Immutable snapshot handed to reporting collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSummary {
    pub runs: u64,
    pub files_moved: u64,
    pub avg_size_kb: f64,
    pub max_size_kb: f64,
    pub avg_files_per_run: f64,
    pub overwritten_count: u64,
}

impl RunStats {
    pub fn new() -> Self {
        RunStats::default()
    }

    /// Folds one finished cycle into the ledger. A cycle that moved nothing
    /// still counts as a run and appends a trailing zero to `files_per_run`.
    pub fn record_cycle(&mut self, moved: &[FileRecord], overwritten_this_cycle: u64) {
        self.total_runs += 1;
        self.files_per_run.push(moved.len() as u64);
        self.total_files_moved += moved.len() as u64;
        self.overwritten_count += overwritten_this_cycle;
        for record in moved {
            self.file_sizes_kb.push(record.size_kb);
            self.move_timestamps.push(record.moved_at);
            self.move_durations.push(record.duration_secs);
        }
    }

    pub fn reset(&mut self) {
        *self = RunStats::default();
    }

    pub fn summary(&self) -> StatsSummary {
        let avg_size_kb = if self.file_sizes_kb.is_empty() {
            0.0
        } else {
            self.file_sizes_kb.iter().sum::<f64>() / self.file_sizes_kb.len() as f64
        };
        let max_size_kb = self.file_sizes_kb.iter().copied().fold(0.0, f64::max);
        let avg_files_per_run = if self.total_runs > 0 {
            self.total_files_moved as f64 / self.total_runs as f64
        } else {
            0.0
        };
        StatsSummary {
            runs: self.total_runs,
            files_moved: self.total_files_moved,
            avg_size_kb,
            max_size_kb,
            avg_files_per_run,
            overwritten_count: self.overwritten_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(size_kb: f64) -> FileRecord {
        FileRecord {
            path: PathBuf::from("f"),
            size_kb,
            duration_secs: 0.001,
            moved_at: Local::now(),
        }
    }

    fn assert_invariants(stats: &RunStats) {
        assert_eq!(stats.files_per_run.len() as u64, stats.total_runs);
        assert_eq!(
            stats.files_per_run.iter().sum::<u64>(),
            stats.total_files_moved
        );
        assert_eq!(stats.file_sizes_kb.len() as u64, stats.total_files_moved);
        assert_eq!(stats.move_timestamps.len() as u64, stats.total_files_moved);
        assert_eq!(stats.move_durations.len() as u64, stats.total_files_moved);
    }

    #[test]
    fn empty_cycle_only_bumps_the_run_count() {
        let mut stats = RunStats::new();
        stats.record_cycle(&[], 0);
        assert_eq!(stats.total_runs, 1);
        assert_eq!(stats.files_per_run, vec![0]);
        assert_eq!(stats.total_files_moved, 0);
        assert_invariants(&stats);
    }

    #[test]
    fn invariants_hold_across_many_cycles() {
        let mut stats = RunStats::new();
        stats.record_cycle(&[record(1.0), record(2.0)], 1);
        stats.record_cycle(&[], 0);
        stats.record_cycle(&[record(6.0)], 0);
        assert_eq!(stats.files_per_run, vec![2, 0, 1]);
        assert_eq!(stats.total_files_moved, 3);
        assert_eq!(stats.overwritten_count, 1);
        assert_invariants(&stats);
    }

    #[test]
    fn summary_averages_are_zero_safe() {
        let stats = RunStats::new();
        let summary = stats.summary();
        assert_eq!(summary.avg_size_kb, 0.0);
        assert_eq!(summary.max_size_kb, 0.0);
        assert_eq!(summary.avg_files_per_run, 0.0);
    }

    #[test]
    fn summary_reflects_the_ledger() {
        let mut stats = RunStats::new();
        stats.record_cycle(&[record(2.0), record(4.0)], 0);
        stats.record_cycle(&[record(9.0)], 2);
        let summary = stats.summary();
        assert_eq!(summary.runs, 2);
        assert_eq!(summary.files_moved, 3);
        assert_eq!(summary.avg_size_kb, 5.0);
        assert_eq!(summary.max_size_kb, 9.0);
        assert_eq!(summary.avg_files_per_run, 1.5);
        assert_eq!(summary.overwritten_count, 2);
    }

    #[test]
    fn reset_returns_to_the_initial_state() {
        let mut stats = RunStats::new();
        stats.record_cycle(&[record(1.0)], 1);
        stats.reset();
        assert_eq!(stats.total_runs, 0);
        assert_eq!(stats.total_files_moved, 0);
        assert!(stats.files_per_run.is_empty());
        assert_eq!(stats.overwritten_count, 0);
        assert_invariants(&stats);
    }
}
