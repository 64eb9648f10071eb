//! Subscriber setup: stderr output plus an optional per-minute log file

use anyhow::{Context, Result};
use chrono::{Datelike, Local, Timelike};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::writer::{EitherWriter, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Local wall-clock timestamps, second precision
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Log file for the current minute, e.g. `CE_2024_3_7_9_5.txt`
pub fn log_file_name() -> String {
    let now = Local::now();
    format!(
        "CE_{}_{}_{}_{}_{}.txt",
        now.year(),
        now.month(),
        now.day(),
        now.hour(),
        now.minute()
    )
}

fn open_log_file(dir: &Path, name: &str) -> Result<(PathBuf, File)> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory '{}'", dir.display()))?;
    let path = dir.join(name);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file '{}'", path.display()))?;
    Ok((path, file))
}

/// Appends each event to the log file of the minute it is written in
struct MinuteFiles {
    dir: PathBuf,
}

impl<'a> MakeWriter<'a> for MinuteFiles {
    type Writer = EitherWriter<File, io::Sink>;

    fn make_writer(&'a self) -> Self::Writer {
        match open_log_file(&self.dir, &log_file_name()) {
            Ok((_, file)) => EitherWriter::A(file),
            // Unwritable directory: drop the event
            Err(_) => EitherWriter::B(io::sink()),
        }
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks `warn`, `debug` or
/// `trace`.
pub fn init(verbose: u8, log_dir: Option<&Path>) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory '{}'", dir.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_timer(LocalTime)
                    .with_writer(MinuteFiles {
                        dir: dir.to_path_buf(),
                    }),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name() {
        let name = log_file_name();
        assert!(name.starts_with("CE_"));
        assert!(name.ends_with(".txt"));
        assert_eq!(name.trim_end_matches(".txt").split('_').count(), 6);
    }

    #[test]
    fn test_open_log_file_appends() {
        let dir = tempfile::TempDir::new().unwrap();
        let logs = dir.path().join("Logs");
        let (path, _) = open_log_file(&logs, "CE_test.txt").unwrap();
        fs::write(&path, "first\n").unwrap();
        let (again, mut file) = open_log_file(&logs, "CE_test.txt").unwrap();
        assert_eq!(path, again);
        std::io::Write::write_all(&mut file, b"second\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_minute_files_write_current_minute() {
        let dir = tempfile::TempDir::new().unwrap();
        let files = MinuteFiles {
            dir: dir.path().to_path_buf(),
        };
        io::Write::write_all(&mut files.make_writer(), b"event\n").unwrap();

        let written: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(written.len(), 1);
        let name = written[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("CE_"));
        assert_eq!(fs::read_to_string(&written[0]).unwrap(), "event\n");
    }

    #[test]
    fn test_minute_files_missing_dir_is_silent() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let files = MinuteFiles { dir: blocker };
        io::Write::write_all(&mut files.make_writer(), b"dropped\n").unwrap();
    }
}
