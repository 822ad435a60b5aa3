use std::path::{Path, PathBuf};

use crate::errors::CoreError;
use crate::models::ledger::Ledger;
use crate::models::settings::Settings;

use super::format;

/// High-level storage operations: save/load the ledger and settings to/from
/// bytes or files.
pub struct StorageManager;

impl StorageManager {
    /// Flow: Ledger → JSON envelope bytes
    pub fn save_to_bytes(ledger: &Ledger) -> Result<Vec<u8>, CoreError> {
        format::write_ledger(ledger)
    }

    /// Flow: bytes → check envelope version → Ledger
    pub fn load_from_bytes(data: &[u8]) -> Result<Ledger, CoreError> {
        format::read_ledger(data)
    }

    /// Write the ledger to `path` in one step: the bytes go to a sibling
    /// temp file which is then renamed over the target.
    pub fn save_to_file(ledger: &Ledger, path: &Path) -> Result<(), CoreError> {
        let bytes = Self::save_to_bytes(ledger)?;
        Self::write_atomically(path, &bytes)
    }

    /// Load the ledger at `path`; a missing file is an empty ledger.
    pub fn load_from_file(path: &Path) -> Result<Ledger, CoreError> {
        match std::fs::read(path) {
            Ok(bytes) => Self::load_from_bytes(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Ledger::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Load settings from a JSON file; missing file or fields fall back to defaults.
    pub fn load_settings(path: &Path) -> Result<Settings, CoreError> {
        match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                CoreError::Deserialization(format!(
                    "Failed to parse settings {}: {e}",
                    path.display()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_settings(settings: &Settings, path: &Path) -> Result<(), CoreError> {
        let bytes = serde_json::to_vec_pretty(settings)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize settings: {e}")))?;
        Self::write_atomically(path, &bytes)
    }

    /// Write `bytes` to a sibling temp file, then rename it over `path`.
    /// Readers see either the old contents or the new ones, never a partial file.
    pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), CoreError> {
        let tmp = temp_path(path);
        std::fs::write(&tmp, bytes)?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "data".into());
    name.push(".tmp");
    path.with_file_name(name)
}
