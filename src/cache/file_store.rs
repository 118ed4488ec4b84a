// File-backed implementation of the result cache

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use serde_json::Value;

use super::{CacheKey, ReplayStore};
use crate::RacelineError;

/// Stores each cache entry as a pretty-printed JSON file under one
/// directory, named after the key's file stem.
pub struct FileStore {
    storage_path: PathBuf,
}

impl FileStore {
    pub fn new(storage_path: PathBuf) -> Result<Self, RacelineError> {
        if !storage_path.exists() {
            fs::create_dir_all(&storage_path)
                .map_err(|e| RacelineError::StoreIOError { source: e })?;
        }
        Ok(Self { storage_path })
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    fn file_path(&self, key: &CacheKey) -> PathBuf {
        self.storage_path.join(format!("{}.json", key.file_stem()))
    }

    /// Write to a temporary file first, then rename into place, so a
    /// crashed write never leaves a truncated entry behind.
    fn write_atomically(&self, file_path: &Path, content: &str) -> Result<(), RacelineError> {
        let temp_path = file_path.with_extension("json.tmp");

        {
            let mut temp_file = fs::File::create(&temp_path)
                .map_err(|e| RacelineError::StoreIOError { source: e })?;
            temp_file
                .write_all(content.as_bytes())
                .map_err(|e| RacelineError::StoreIOError { source: e })?;
            temp_file
                .sync_all()
                .map_err(|e| RacelineError::StoreIOError { source: e })?;
        }

        fs::rename(&temp_path, file_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            RacelineError::StoreIOError { source: e }
        })
    }
}

impl ReplayStore for FileStore {
    fn load(&self, key: &CacheKey) -> Result<Option<Value>, RacelineError> {
        let file_path = self.file_path(key);
        if !file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&file_path)
            .map_err(|e| RacelineError::StoreIOError { source: e })?;
        let value = serde_json::from_str(&content)
            .map_err(|e| RacelineError::StoreSerializeError { source: e })?;

        debug!("Loaded cache entry from {:?}", file_path);
        Ok(Some(value))
    }

    fn save(&self, key: &CacheKey, entry: &Value) -> Result<(), RacelineError> {
        let file_path = self.file_path(key);
        let content = serde_json::to_string_pretty(entry)
            .map_err(|e| RacelineError::StoreSerializeError { source: e })?;

        self.write_atomically(&file_path, &content)?;
        debug!("Saved cache entry to {:?}", file_path);
        Ok(())
    }

    fn delete(&self, key: &CacheKey) -> Result<(), RacelineError> {
        let file_path = self.file_path(key);
        if file_path.exists() {
            fs::remove_file(&file_path).map_err(|e| RacelineError::StoreIOError { source: e })?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), RacelineError> {
        let entries = fs::read_dir(&self.storage_path)
            .map_err(|e| RacelineError::StoreIOError { source: e })?;

        for entry in entries {
            let entry = entry.map_err(|e| RacelineError::StoreIOError { source: e })?;
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
                fs::remove_file(&path).map_err(|e| RacelineError::StoreIOError { source: e })?;
            }
        }
        Ok(())
    }
}
