use std::path::{Path, PathBuf};

use crate::errors::CoreError;
use crate::models::month::MonthKey;
use crate::storage::manager::StorageManager;

use super::traits::PromptMarker;

/// Marker kept for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryMarker {
    last_checked: Option<MonthKey>,
}

impl MemoryMarker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_month(month: MonthKey) -> Self {
        Self {
            last_checked: Some(month),
        }
    }
}

impl PromptMarker for MemoryMarker {
    fn last_checked(&self) -> Result<Option<MonthKey>, CoreError> {
        Ok(self.last_checked)
    }

    fn mark_checked(&mut self, month: MonthKey) -> Result<(), CoreError> {
        self.last_checked = Some(month);
        Ok(())
    }
}

/// Marker stored as a single `YYYY-MM` line in a text file.
#[derive(Debug, Clone)]
pub struct FileMarker {
    path: PathBuf,
}

impl FileMarker {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PromptMarker for FileMarker {
    fn last_checked(&self) -> Result<Option<MonthKey>, CoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        // An unreadable marker counts as "never checked".
        match text.parse::<MonthKey>() {
            Ok(month) => Ok(Some(month)),
            Err(_) => {
                tracing::warn!(
                    "Ignoring malformed archive-prompt marker {:?} in {}",
                    text,
                    self.path.display()
                );
                Ok(None)
            }
        }
    }

    fn mark_checked(&mut self, month: MonthKey) -> Result<(), CoreError> {
        StorageManager::write_atomically(&self.path, format!("{month}\n").as_bytes())
    }
}
