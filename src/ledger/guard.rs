use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Exclusive hold on the refresh of one competition.
///
/// Backed by a `<ledger>.lock` file created with `create_new`, so a second
/// refresh fails fast instead of waiting. The file is removed on drop.
#[derive(Debug)]
pub struct RefreshGuard {
    path: PathBuf,
}

impl RefreshGuard {
    pub fn acquire(ledger_path: &Path) -> Result<Self> {
        let path = lock_path(ledger_path);
        crate::config::ensure_parent_dir(&path)?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                anyhow::bail!(
                    "Another refresh is in progress (remove {} if it is stale)",
                    path.display()
                );
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to create lock file at {}", path.display()));
            }
        };

        // Holder pid, for whoever has to clean up a stale lock
        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            log::debug!("Failed to write pid to {}: {}", path.display(), e);
        }

        log::debug!("Acquired refresh lock {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("Failed to remove lock file {}: {}", self.path.display(), e);
        }
    }
}

fn lock_path(ledger_path: &Path) -> PathBuf {
    let mut name: OsString = ledger_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("ledger"));
    name.push(".lock");
    ledger_path.with_file_name(name)
}
