//! Logging setup for the binaries.
//!
//! Each binary logs to stderr and to its own file under the app `logs/`
//! directory, named `<program>_<local time>.log`. Stdout is left to the
//! program's report. Each program keeps its newest [`KEEP_PER_PROGRAM`]
//! files; pruning never touches another program's logs.
//!
//! `VIDTREND_LOG` takes an `EnvFilter` directive; the default is `info`.

use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::OnceLock,
};

use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs::{AppDir, AppDirError};

pub const KEEP_PER_PROGRAM: usize = 10;

/// Environment variable holding the log filter directive.
pub const LOG_FILTER_ENV: &str = "VIDTREND_LOG";

const NAME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid program name for log files: {0:?}")]
    ProgramName(String),
    #[error("Log directory unavailable: {0}")]
    Dir(#[from] AppDirError),
    #[error("Failed to access log files in {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to format log filename time: {0}")]
    FormatTime(#[from] time::error::Format),
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// The log files written by one binary.
#[derive(Debug, Clone)]
struct ProgramLogs {
    dir: PathBuf,
    program: String,
}

impl ProgramLogs {
    fn new(dir: PathBuf, program: &str) -> Result<Self, LoggingError> {
        let valid = !program.is_empty()
            && program
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid {
            return Err(LoggingError::ProgramName(program.to_string()));
        }
        Ok(Self {
            dir,
            program: program.to_string(),
        })
    }

    fn file_name(&self, now: OffsetDateTime) -> Result<String, LoggingError> {
        Ok(format!("{}_{}.log", self.program, now.format(NAME_FORMAT)?))
    }

    /// Whether `name` was written by this program. `vidtrend_*` never matches
    /// `vidtrend-train_*` because the separator differs.
    fn owns(&self, name: &str) -> bool {
        name.strip_prefix(self.program.as_str())
            .and_then(|rest| rest.strip_prefix('_'))
            .is_some_and(|rest| rest.ends_with(".log"))
    }

    fn create(&self, name: &str) -> Result<PathBuf, LoggingError> {
        let path = self.dir.join(name);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| self.io_error(source))?;
        Ok(path)
    }

    /// Delete this program's oldest files beyond `keep`. The timestamp in
    /// the name orders them, so file system times are not consulted.
    fn prune(&self, keep: usize) -> Result<usize, LoggingError> {
        let mut names: Vec<String> = fs::read_dir(&self.dir)
            .map_err(|source| self.io_error(source))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|ft| ft.is_file()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| self.owns(name))
            .collect();
        names.sort();
        let excess = names.len().saturating_sub(keep);
        for name in &names[..excess] {
            fs::remove_file(self.dir.join(name)).map_err(|source| self.io_error(source))?;
        }
        Ok(excess)
    }

    fn io_error(&self, source: std::io::Error) -> LoggingError {
        LoggingError::Io {
            path: self.dir.clone(),
            source,
        }
    }
}

/// Install the global subscriber for `program` and return its log file.
///
/// Later calls return `Ok(None)`. Callers keep running without logging when
/// this fails.
pub fn init(program: &str) -> Result<Option<PathBuf>, LoggingError> {
    if LOG_GUARD.get().is_some() {
        return Ok(None);
    }
    let logs = ProgramLogs::new(AppDir::Logs.ensure()?, program)?;
    let name = logs.file_name(now_local_or_utc())?;
    let path = logs.create(&name)?;
    let pruned = logs.prune(KEEP_PER_PROGRAM)?;

    let (file_writer, guard) = tracing_appender::non_blocking(rolling::never(&logs.dir, &name));
    let timer = build_timer();
    let console = fmt::layer()
        .with_timer(timer.clone())
        .with_writer(std::io::stderr);
    let file = fmt::layer()
        .with_ansi(false)
        .with_timer(timer)
        .with_writer(file_writer);
    let subscriber = Registry::default()
        .with(build_env_filter())
        .with(console)
        .with(file);
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = LOG_GUARD.set(guard);

    tracing::debug!(pruned, "Logging to {}", path.display());
    Ok(Some(path))
}

fn build_timer() -> fmt::time::OffsetTime<time::format_description::BorrowedFormatItem<'static>> {
    const DISPLAY_FORMAT: &[FormatItem<'static>] =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    fmt::time::OffsetTime::new(offset, DISPLAY_FORMAT.into())
}

fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn at(seconds: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000 + seconds).unwrap()
    }

    #[test]
    fn file_name_carries_program_and_time() {
        let logs = ProgramLogs::new(PathBuf::from("logs"), "vidtrend-train").unwrap();
        assert_eq!(
            logs.file_name(at(0)).unwrap(),
            "vidtrend-train_2023-11-14_22-13-20.log"
        );
    }

    #[test]
    fn program_names_are_restricted() {
        for bad in ["", "../up", "a b", "x_y"] {
            assert!(ProgramLogs::new(PathBuf::from("logs"), bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn ownership_does_not_leak_between_programs() {
        let predict = ProgramLogs::new(PathBuf::from("logs"), "vidtrend").unwrap();
        assert!(predict.owns("vidtrend_2025-05-16_10-00-00.log"));
        assert!(!predict.owns("vidtrend-train_2025-05-16_10-00-00.log"));
        assert!(!predict.owns("vidtrend_2025-05-16_10-00-00.txt"));
    }

    #[test]
    fn prune_keeps_newest_files_per_program() {
        let dir = tempdir().unwrap();
        let predict = ProgramLogs::new(dir.path().to_path_buf(), "vidtrend").unwrap();
        let train = ProgramLogs::new(dir.path().to_path_buf(), "vidtrend-train").unwrap();
        for idx in 0..12 {
            predict.create(&predict.file_name(at(idx)).unwrap()).unwrap();
        }
        for idx in 0..3 {
            train.create(&train.file_name(at(idx)).unwrap()).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

        assert_eq!(predict.prune(10).unwrap(), 2);
        assert_eq!(train.prune(10).unwrap(), 0);

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok()?.file_name().into_string().ok())
            .collect();
        assert_eq!(names.iter().filter(|name| predict.owns(name)).count(), 10);
        assert_eq!(names.iter().filter(|name| train.owns(name)).count(), 3);
        assert!(!dir.path().join(predict.file_name(at(0)).unwrap()).exists());
        assert!(!dir.path().join(predict.file_name(at(1)).unwrap()).exists());
        assert!(dir.path().join(predict.file_name(at(2)).unwrap()).exists());
        assert!(dir.path().join("notes.txt").exists());
    }
}
