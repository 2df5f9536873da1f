//! Logger for the `quill` binary. Writes to stderr, and with a log file
//! requested also to `~/.quill/logs/{run_id}/log`.

use anyhow::{Context, Result};
use chrono::Local;
use dirs::home_dir;
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

pub struct QuillLogger {
    level: LevelFilter,
    file: Option<Mutex<File>>,
}

impl QuillLogger {
    /// Run IDs look like `{timestamp}_{uuid8}`.
    fn run_id() -> String {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let uuid = Uuid::new_v4().to_string();
        let short = uuid.split('-').next().unwrap_or("unknown");
        format!("{timestamp}_{short}")
    }

    pub fn log_dir(run_id: &str) -> Result<PathBuf> {
        let home = home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".quill").join("logs").join(run_id))
    }

    fn open_log_file() -> Result<(File, PathBuf)> {
        let log_dir = Self::log_dir(&Self::run_id())?;
        create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
        let log_path = log_dir.join("log");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;
        Ok((file, log_path))
    }

    /// Installs the logger. Returns the log file path when one is used.
    pub fn init(level: LevelFilter, to_file: bool) -> Result<Option<PathBuf>> {
        let (file, log_path) = if to_file {
            let (file, path) = Self::open_log_file()?;
            (Some(Mutex::new(file)), Some(path))
        } else {
            (None, None)
        };

        log::set_boxed_logger(Box::new(Self { level, file }))
            .map(|()| log::set_max_level(level))
            .map_err(|e| anyhow::anyhow!("Failed to set logger: {}", e))?;

        if let Some(path) = &log_path {
            log::info!("Log file: {}", path.display());
        }
        Ok(log_path)
    }
}

/// Maps `-v` repetitions to a level.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

impl Log for QuillLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let message = format!(
            "{} {} [{}] {}",
            timestamp,
            record.level(),
            record.target(),
            record.args()
        );

        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = writeln!(file, "{}", message);
            }
        }
        eprintln!("{}", message);
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(9), LevelFilter::Trace);
    }

    #[test]
    fn test_run_id_shape() {
        let run_id = QuillLogger::run_id();
        let (timestamp, short) = run_id.rsplit_once('_').unwrap();
        assert_eq!(timestamp.len(), 15);
        assert_eq!(short.len(), 8);
    }
}
