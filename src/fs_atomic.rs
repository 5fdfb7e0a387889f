//! Crash-safe file replacement shared by config and artifact persistence.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rand::TryRngCore;

/// Attempts at finding an unused temporary file name before giving up.
const TEMP_NAME_ATTEMPTS: usize = 5;

/// A file fully written and synced next to its destination, not yet visible.
#[derive(Debug)]
pub struct StagedFile {
    temp_path: PathBuf,
    target: PathBuf,
}

impl StagedFile {
    #[cfg(test)]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Rename the staged file over its destination and sync the directory.
    pub fn commit(self) -> io::Result<()> {
        if let Err(err) = replace_file(&self.temp_path, &self.target) {
            let _ = std::fs::remove_file(&self.temp_path);
            return Err(err);
        }
        if let Some(dir) = self.target.parent() {
            sync_dir(dir)?;
        }
        Ok(())
    }

    /// Remove the staged file without touching the destination.
    pub fn discard(self) {
        let _ = std::fs::remove_file(&self.temp_path);
    }
}

/// Write `data` to `path` so readers see either the old or the new contents.
pub fn write(path: &Path, data: &[u8]) -> io::Result<()> {
    stage(path, data)?.commit()
}

/// Write `data` to a synced temporary sibling of `path`.
pub fn stage(path: &Path, data: &[u8]) -> io::Result<StagedFile> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::other("path has no parent directory"))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("path has no file name"))?;

    let mut last_err = None;
    for _ in 0..TEMP_NAME_ATTEMPTS {
        let mut bytes = [0u8; 6];
        rand::rngs::OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|source| io::Error::other(format!("failed to generate temp suffix: {source}")))?;
        let suffix: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        let temp_path = dir.join(format!("{}.tmp-{suffix}", file_name.to_string_lossy()));

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path);
        let mut file = match file {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                last_err = Some(err);
                continue;
            }
            Err(err) => return Err(err),
        };

        if let Err(err) = file.write_all(data).and_then(|_| file.sync_all()) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(err);
        }
        return Ok(StagedFile {
            temp_path,
            target: path.to_path_buf(),
        });
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!(
            "failed to create temporary file for {}: {}",
            path.display(),
            last_err
                .map(|err| err.to_string())
                .unwrap_or_else(|| "unknown error".into())
        ),
    ))
}

fn replace_file(temp_path: &Path, path: &Path) -> io::Result<()> {
    match std::fs::rename(temp_path, path) {
        Ok(()) => Ok(()),
        Err(err) => {
            #[cfg(target_os = "windows")]
            if err.kind() == io::ErrorKind::AlreadyExists
                || err.kind() == io::ErrorKind::PermissionDenied
            {
                if let Err(inner) = std::fs::remove_file(path) {
                    if inner.kind() != io::ErrorKind::NotFound {
                        return Err(inner);
                    }
                }
                return std::fs::rename(temp_path, path);
            }
            Err(err)
        }
    }
}

fn sync_dir(dir: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        std::fs::File::open(dir)?.sync_all()?;
    }
    #[cfg(not(unix))]
    {
        let _ = dir;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_replaces_existing_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, b"old").unwrap();
        write(&path, b"new").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn discarded_stage_leaves_target_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"kept").unwrap();
        let staged = stage(&path, b"dropped").unwrap();
        assert_eq!(staged.target(), path.as_path());
        staged.discard();
        assert_eq!(std::fs::read(&path).unwrap(), b"kept");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
