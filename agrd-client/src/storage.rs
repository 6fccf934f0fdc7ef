//! Durable storage slot for the backlog
//!
//! One named slot maps to `<root_folder>/<slot>.json`. Writes replace the whole
//! snapshot atomically: temp file, fsync, rename. A reader sees either the
//! previous snapshot or the new one.

use agrd_common::Result;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A single named JSON document on disk
#[derive(Debug, Clone)]
pub struct StorageSlot {
    path: PathBuf,
}

impl StorageSlot {
    pub fn new(root_folder: &Path, slot_name: &str) -> Self {
        Self {
            path: root_folder.join(format!("{}.json", slot_name)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Slot contents, `None` when the slot has never been written
    pub fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the slot contents
    pub fn write(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        debug!(path = %self.path.display(), bytes = contents.len(), "Slot written");
        Ok(())
    }
}
