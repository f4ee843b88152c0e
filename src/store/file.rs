//! Directory-backed layout store: one `<layout_id>.json` file per record.

use chrono::Utc;
use parking_lot::Mutex;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::{resolve_existing, CreateOutcome, LayoutFilter, LayoutStore, StoreError};
use crate::identity::LayoutIdentity;
use crate::layout::DynamicLayout;

pub struct FileLayoutStore {
    dir: PathBuf,
    // Serializes read-modify-write updates inside this process.
    write_lock: Mutex<()>,
}

impl FileLayoutStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // Ids are checked before they become file names.
    fn record_path(&self, layout_id: &str) -> Option<PathBuf> {
        LayoutIdentity::is_valid(layout_id).then(|| self.dir.join(format!("{layout_id}.json")))
    }

    fn read_record(&self, path: &Path, layout_id: &str) -> Result<DynamicLayout, StoreError> {
        let content = fs::read_to_string(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => StoreError::NotFound(layout_id.to_string()),
            _ => StoreError::from(err),
        })?;
        serde_json::from_str(&content).map_err(|err| StoreError::Corrupt {
            id: layout_id.to_string(),
            reason: err.to_string(),
        })
    }

    /// Write `body` to a hidden temp file in the store directory. Records
    /// only become visible under their final name once fully written.
    fn stage(&self, body: &str) -> Result<NamedTempFile, StoreError> {
        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(body.as_bytes())?;
        staged.as_file().sync_all()?;
        Ok(staged)
    }

    fn write_replace(&self, path: &Path, layout: &DynamicLayout) -> Result<(), StoreError> {
        let staged = self.stage(&to_json(layout)?)?;
        staged.persist(path).map_err(|err| StoreError::from(err.error))?;
        Ok(())
    }
}

fn to_json(layout: &DynamicLayout) -> Result<String, StoreError> {
    serde_json::to_string_pretty(layout).map_err(|err| StoreError::Corrupt {
        id: layout.layout_id.clone(),
        reason: err.to_string(),
    })
}

impl LayoutStore for FileLayoutStore {
    fn create(&self, layout: DynamicLayout) -> Result<CreateOutcome, StoreError> {
        let path = self.record_path(&layout.layout_id).ok_or_else(|| StoreError::Corrupt {
            id: layout.layout_id.clone(),
            reason: "malformed layout id".to_string(),
        })?;
        let staged = self.stage(&to_json(&layout)?)?;

        // Atomic publish: exactly one writer across processes claims the name
        match staged.persist_noclobber(&path) {
            Ok(_) => Ok(CreateOutcome::Created(layout)),
            Err(err) if err.error.kind() == ErrorKind::AlreadyExists => {
                let existing = self.read_record(&path, &layout.layout_id)?;
                resolve_existing(existing, &layout)
            }
            Err(err) => Err(err.error.into()),
        }
    }

    fn get(&self, layout_id: &str) -> Result<DynamicLayout, StoreError> {
        let path = self
            .record_path(layout_id)
            .ok_or_else(|| StoreError::NotFound(layout_id.to_string()))?;
        self.read_record(&path, layout_id)
    }

    fn list(&self, filter: &LayoutFilter) -> Result<Vec<DynamicLayout>, StoreError> {
        let mut layouts = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().map_or(true, |e| e != "json") {
                continue;
            }
            let Some(layout_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.read_record(&path, layout_id) {
                Ok(layout) if filter.matches(&layout) => layouts.push(layout),
                Ok(_) => {}
                // Deleted between read_dir and read
                Err(StoreError::NotFound(_)) => {}
                Err(err) => tracing::warn!(path = %path.display(), error = %err, "skipping unreadable layout"),
            }
        }
        layouts.sort_by(|a, b| a.layout_id.cmp(&b.layout_id));
        Ok(layouts)
    }

    fn delete(&self, layout_id: &str) -> Result<(), StoreError> {
        let path = self
            .record_path(layout_id)
            .ok_or_else(|| StoreError::NotFound(layout_id.to_string()))?;
        let _guard = self.write_lock.lock();
        fs::remove_file(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => StoreError::NotFound(layout_id.to_string()),
            _ => StoreError::from(err),
        })
    }

    fn increment_usage(&self, layout_id: &str) -> Result<u64, StoreError> {
        let path = self
            .record_path(layout_id)
            .ok_or_else(|| StoreError::NotFound(layout_id.to_string()))?;
        let _guard = self.write_lock.lock();
        let mut layout = self.read_record(&path, layout_id)?;
        layout.usage_count += 1;
        layout.updated_at = Utc::now();
        self.write_replace(&path, &layout)?;
        Ok(layout.usage_count)
    }
}
