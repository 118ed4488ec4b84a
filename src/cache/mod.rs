// Result cache contract: previously computed replay and track documents
// wrapped in a timestamped envelope, keyed by (year, event, session-or-none),
// stored behind a pluggable backend.

pub mod file_store;
pub(crate) mod migrate;

pub use file_store::FileStore;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::RacelineError;

/// Current envelope schema version. Version 1 envelopes carried absolute
/// frame timestamps and no version field; version 2 frames use a relative
/// race clock.
pub const SCHEMA_VERSION: u32 = 2;

/// Entries older than this are rebuilt (catalog entries excepted)
pub const MAX_AGE_DAYS: u64 = 30;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Logical key of one cached document
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A full replay dataset for one session
    Replay {
        year: u16,
        event: String,
        session: String,
    },
    /// The normalized track shape for one event
    Track { year: u16, event: String },
    /// The list of retrievable races for one season
    Catalog { year: u16 },
}

impl CacheKey {
    /// Filesystem-safe stem used by file-backed stores
    pub fn file_stem(&self) -> String {
        match self {
            CacheKey::Replay {
                year,
                event,
                session,
            } => format!(
                "{}_{}_{}",
                year,
                normalize_event_name(event),
                session.to_lowercase()
            ),
            CacheKey::Track { year, event } => {
                format!("{}_{}_track", year, normalize_event_name(event))
            }
            CacheKey::Catalog { year } => format!("{}_available_races", year),
        }
    }

    /// Catalog entries are served regardless of age: a race list computed
    /// once stays useful, and rebuilding it means probing every candidate
    /// event upstream. Replay and track entries expire normally.
    pub fn is_expiry_exempt(&self) -> bool {
        matches!(self, CacheKey::Catalog { .. })
    }

    fn year(&self) -> u16 {
        match self {
            CacheKey::Replay { year, .. }
            | CacheKey::Track { year, .. }
            | CacheKey::Catalog { year } => *year,
        }
    }

    fn event(&self) -> Option<String> {
        match self {
            CacheKey::Replay { event, .. } | CacheKey::Track { event, .. } => {
                Some(event.clone())
            }
            CacheKey::Catalog { .. } => None,
        }
    }

    fn session(&self) -> Option<String> {
        match self {
            CacheKey::Replay { session, .. } => Some(session.clone()),
            _ => None,
        }
    }
}

/// Normalize an event name for consistent key and file naming
pub fn normalize_event_name(event: &str) -> String {
    event
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Envelope written around every persisted document
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StoredEntry<T> {
    /// Creation time, seconds since the Unix epoch
    pub cached_at: u64,
    pub year: u16,
    pub event: Option<String>,
    pub session: Option<String>,
    /// Absent on entries written before versioning was introduced
    #[serde(default)]
    pub schema_version: Option<u32>,
    pub data: T,
}

/// Key/value store of cached documents. Backends deal in raw JSON values;
/// the typed fetch/store helpers below own the envelope and validity rules.
pub trait ReplayStore {
    fn load(&self, key: &CacheKey) -> Result<Option<Value>, RacelineError>;
    fn save(&self, key: &CacheKey, entry: &Value) -> Result<(), RacelineError>;
    fn delete(&self, key: &CacheKey) -> Result<(), RacelineError>;
    fn clear(&self) -> Result<(), RacelineError>;
}

pub(crate) fn current_epoch_s() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Load a cached document, applying the age and format validity rules.
/// Any invalid entry is reported as a miss so callers rebuild.
pub fn fetch_valid<T: DeserializeOwned>(store: &dyn ReplayStore, key: &CacheKey) -> Option<T> {
    let value = match store.load(key) {
        Ok(Some(value)) => value,
        Ok(None) => return None,
        Err(e) => {
            warn!("Error loading cache entry {}: {}", key.file_stem(), e);
            return None;
        }
    };

    if let Err(e) = migrate::check_entry_format(key, &value) {
        info!("Rebuilding cache entry {}: {}", key.file_stem(), e);
        return None;
    }

    let entry: StoredEntry<T> = match serde_json::from_value(value) {
        Ok(entry) => entry,
        Err(e) => {
            warn!("Malformed cache entry {}: {}", key.file_stem(), e);
            return None;
        }
    };

    if !key.is_expiry_exempt() {
        let age_s = current_epoch_s().saturating_sub(entry.cached_at);
        if age_s >= MAX_AGE_DAYS * SECONDS_PER_DAY {
            debug!(
                "Cache entry {} is {} days old, rebuilding",
                key.file_stem(),
                age_s / SECONDS_PER_DAY
            );
            return None;
        }
    }

    Some(entry.data)
}

/// Wrap a document in the current envelope and persist it. Persistence
/// failures are returned for the caller to log; the freshly built document
/// must still be served either way.
pub fn store_entry<T: Serialize>(
    store: &dyn ReplayStore,
    key: &CacheKey,
    data: &T,
) -> Result<(), RacelineError> {
    let entry = StoredEntry {
        cached_at: current_epoch_s(),
        year: key.year(),
        event: key.event(),
        session: key.session(),
        schema_version: Some(SCHEMA_VERSION),
        data,
    };
    let value =
        serde_json::to_value(&entry).map_err(|e| RacelineError::StoreSerializeError { source: e })?;
    store.save(key, &value)
}

/// In-memory store, used by tests and as an ephemeral backend
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReplayStore for MemoryStore {
    fn load(&self, key: &CacheKey) -> Result<Option<Value>, RacelineError> {
        let entries = self.entries.lock().map_err(|_| RacelineError::StoreError {
            reason: "memory store poisoned".to_string(),
        })?;
        Ok(entries.get(&key.file_stem()).cloned())
    }

    fn save(&self, key: &CacheKey, entry: &Value) -> Result<(), RacelineError> {
        let mut entries = self.entries.lock().map_err(|_| RacelineError::StoreError {
            reason: "memory store poisoned".to_string(),
        })?;
        entries.insert(key.file_stem(), entry.clone());
        Ok(())
    }

    fn delete(&self, key: &CacheKey) -> Result<(), RacelineError> {
        let mut entries = self.entries.lock().map_err(|_| RacelineError::StoreError {
            reason: "memory store poisoned".to_string(),
        })?;
        entries.remove(&key.file_stem());
        Ok(())
    }

    fn clear(&self) -> Result<(), RacelineError> {
        let mut entries = self.entries.lock().map_err(|_| RacelineError::StoreError {
            reason: "memory store poisoned".to_string(),
        })?;
        entries.clear();
        Ok(())
    }
}
