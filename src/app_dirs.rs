//! Where vidtrend keeps its files.
//!
//! Everything lives below one `.vidtrend` folder in the OS config directory,
//! or below `$VIDTREND_CONFIG_HOME/.vidtrend` when that variable is set.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use thiserror::Error;

pub const APP_DIR_NAME: &str = ".vidtrend";

/// Environment variable replacing the OS config directory as the base.
pub const CONFIG_HOME_ENV: &str = "VIDTREND_CONFIG_HOME";

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("No suitable base config directory available for application files")]
    NoBaseDir,
    #[error("Failed to create application directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A directory inside the application root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppDir {
    /// The root itself; holds `config.toml`.
    Root,
    /// Per-launch log files of every binary.
    Logs,
    /// Default home of trained model pairs.
    Models,
}

impl AppDir {
    fn relative(self) -> Option<&'static str> {
        match self {
            AppDir::Root => None,
            AppDir::Logs => Some("logs"),
            AppDir::Models => Some("models"),
        }
    }

    /// Path of this directory for a given base, without touching the disk.
    pub fn under(self, base: &Path) -> PathBuf {
        let root = base.join(APP_DIR_NAME);
        match self.relative() {
            Some(name) => root.join(name),
            None => root,
        }
    }

    /// Resolve against the current base and create the directory if needed.
    pub fn ensure(self) -> Result<PathBuf, AppDirError> {
        let base = base_dir().ok_or(AppDirError::NoBaseDir)?;
        let path = self.under(&base);
        std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

fn base_dir() -> Option<PathBuf> {
    base_from_override(std::env::var_os(CONFIG_HOME_ENV).map(PathBuf::from))
        .or_else(|| BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf()))
}

// An empty override counts as unset.
fn base_from_override(value: Option<PathBuf>) -> Option<PathBuf> {
    value.filter(|path| !path.as_os_str().is_empty())
}
