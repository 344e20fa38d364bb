use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::variants::error::StoreError;
use crate::variants::store::{StateBackend, StoreState};

/// Store backed by a single pretty-printed JSON file. The file is rewritten (via a sibling
/// temp file and rename) after every mutation; reads are served from memory.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl JsonFileStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                StoreState::default()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            StoreState::default()
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, state: &StoreState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StateBackend for JsonFileStore {
    fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> Result<R, StoreError> {
        let guard = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&guard))
    }

    fn write<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> Result<R, StoreError> {
        let mut guard = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        // Memory only moves forward once the file has the new state.
        let mut next = guard.clone();
        let result = f(&mut next);
        self.persist(&next)?;
        *guard = next;
        Ok(result)
    }
}
