//! Operator-facing run log, duplicated to stdout and an append-mode file.

use anyhow::{Context, Result};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Timestamp prefix on every run-log line
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Dual-sink log for a single run.
///
/// The file handle is opened once in append mode and held for the process
/// lifetime; file-write failures are best-effort and never abort a run.
pub struct RunLog {
    file: Mutex<File>,
}

impl RunLog {
    /// Open (or create) the log file at `path` for appending
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file: {}", path.display()))?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Write one timestamped line to stdout and to the log file
    pub fn line(&self, message: impl AsRef<str>) {
        let stamped = format!(
            "{} {}",
            Local::now().format(TIMESTAMP_FORMAT),
            message.as_ref()
        );

        println!("{stamped}");

        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{stamped}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lines_carry_a_timestamp_prefix() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("run.log");

        let log = RunLog::open(&path).expect("Failed to open log");
        log.line("hello");

        let text = std::fs::read_to_string(&path).expect("Failed to read log");
        let line = text.lines().next().expect("Log is empty");

        assert!(line.ends_with(" hello"), "Unexpected line: {line}");

        // "YYYY-MM-DD HH:MM:SS" is 19 bytes of ASCII
        let stamp = &line[..19];
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[7..8], "-");
        assert_eq!(&stamp[10..11], " ");
        assert_eq!(&stamp[13..14], ":");
        assert_eq!(&stamp[16..17], ":");
        assert!(stamp[..4].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn reopening_appends_instead_of_truncating() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("run.log");

        RunLog::open(&path).expect("Failed to open log").line("first");
        RunLog::open(&path).expect("Failed to open log").line("second");

        let text = std::fs::read_to_string(&path).expect("Failed to read log");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" first"));
        assert!(lines[1].ends_with(" second"));
    }
}
