// Application configuration. All process-wide choices (where session
// recordings live, where the result cache lives, which store backend to
// use) are made here once at startup and injected; nothing reads them
// ambiently afterwards.

use std::path::PathBuf;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::RacelineError;
use crate::cache::{FileStore, MemoryStore, ReplayStore};

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum StoreBackend {
    /// JSON files under `cache_dir`
    Local,
    /// Ephemeral, process-lifetime only
    Memory,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding recorded session dumps
    pub sessions_dir: PathBuf,
    /// Directory holding cached replay/track documents
    pub cache_dir: PathBuf,
    /// Season the race catalog enumerates
    pub season: u16,
    pub store_backend: StoreBackend,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("raceline");
        Self {
            sessions_dir: data_dir.join("sessions"),
            cache_dir: data_dir.join("data_cache"),
            season: 2025,
            store_backend: StoreBackend::Local,
        }
    }
}

impl AppConfig {
    pub fn from_local_file() -> Option<Self> {
        let config_path = dirs::config_dir()?.join("raceline").join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let file = std::fs::File::open(&config_path).ok()?;
            match serde_json::from_reader(file) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!("Could not parse {:?}, using defaults: {}", config_path, e);
                    None
                }
            }
        } else {
            None
        }
    }

    pub fn save(&self) -> Result<(), RacelineError> {
        let config_path = dirs::config_dir()
            .ok_or(RacelineError::NoConfigDir)?
            .join("raceline")
            .join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| RacelineError::ConfigIOError { source: e })?;
            }
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| RacelineError::ConfigIOError { source: e })?;
        serde_json::to_writer(file, self)
            .map_err(|e| RacelineError::ConfigSerializeError { source: e })
    }

    /// Instantiate the configured cache backend
    pub fn make_store(&self) -> Result<Box<dyn ReplayStore>, RacelineError> {
        match self.store_backend {
            StoreBackend::Local => Ok(Box::new(FileStore::new(self.cache_dir.clone())?)),
            StoreBackend::Memory => Ok(Box::new(MemoryStore::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.season, 2025);
        assert_eq!(config.store_backend, StoreBackend::Local);
        assert!(config.cache_dir.ends_with("data_cache"));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{ "season": 2024 }"#).unwrap();
        assert_eq!(config.season, 2024);
        assert_eq!(config.store_backend, StoreBackend::Local);
    }

    #[test]
    fn test_memory_backend_selection() {
        let config = AppConfig {
            store_backend: StoreBackend::Memory,
            ..Default::default()
        };
        // must not touch the filesystem
        config.make_store().unwrap();
    }
}
