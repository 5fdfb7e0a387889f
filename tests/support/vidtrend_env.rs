use std::{
    ffi::{OsStr, OsString},
    path::Path,
    sync::{Mutex, MutexGuard},
};

use vidtrend::app_dirs::CONFIG_HOME_ENV;
use vidtrend::config::DEFAULT_API_KEY_ENV;
use vidtrend::logging::LOG_FILTER_ENV;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serializes environment edits across tests and restores every touched
/// variable, newest edit first, when dropped.
pub struct EnvGuard {
    saved: Vec<(&'static str, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvGuard {
    pub fn lock() -> Self {
        Self {
            saved: Vec::new(),
            _lock: ENV_LOCK.lock().unwrap_or_else(|err| err.into_inner()),
        }
    }

    /// App root under `home`, with no API key or log filter leaking in from
    /// the developer's shell.
    pub fn isolated_home(home: &Path) -> Self {
        Self::lock()
            .set(CONFIG_HOME_ENV, home)
            .unset(DEFAULT_API_KEY_ENV)
            .unset(LOG_FILTER_ENV)
    }

    pub fn set(mut self, key: &'static str, value: impl AsRef<OsStr>) -> Self {
        self.saved.push((key, std::env::var_os(key)));
        // SAFETY: every edit happens while ENV_LOCK is held.
        unsafe { std::env::set_var(key, value) };
        self
    }

    pub fn unset(mut self, key: &'static str) -> Self {
        self.saved.push((key, std::env::var_os(key)));
        // SAFETY: every edit happens while ENV_LOCK is held.
        unsafe { std::env::remove_var(key) };
        self
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        while let Some((key, previous)) = self.saved.pop() {
            // SAFETY: the lock is released only after this loop.
            unsafe {
                match previous {
                    Some(value) => std::env::set_var(key, value),
                    None => std::env::remove_var(key),
                }
            }
        }
    }
}
