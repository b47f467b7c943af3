use super::types::{Ledger, LEDGER_VERSION};
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Get the default ledger file path (~/.config/tri-duel/ledger.json)
pub fn get_ledger_path() -> Result<PathBuf> {
    Ok(crate::config::get_config_dir()?.join("ledger.json"))
}

/// Load the ledger from a JSON file
///
/// If the file doesn't exist, returns a new empty ledger.
/// If the file exists but has an unsupported version, returns an error.
pub fn load_ledger(path: &Path) -> Result<Ledger> {
    if !path.exists() {
        return Ok(Ledger::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open ledger file at {}", path.display()))?;

    let ledger: Ledger = serde_json::from_reader(file).context("Failed to load ledger")?;

    if ledger.version != LEDGER_VERSION {
        anyhow::bail!("Unsupported ledger version: {}", ledger.version);
    }

    log::debug!("Loaded {} locked blocks from {}", ledger.len(), path.display());
    Ok(ledger)
}

/// Save the ledger atomically, so a crash never leaves a half-written file.
pub fn save_ledger(path: &Path, ledger: &Ledger) -> Result<()> {
    crate::config::ensure_parent_dir(path)?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, ledger).context("Failed to serialize ledger")?;

    file.commit().context("Failed to save ledger")?;

    Ok(())
}
