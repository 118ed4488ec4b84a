// Library interface for raceline
// This allows the CLI and benchmarks to access internal modules

pub mod cache;
pub mod config;
pub mod errors;
pub mod provider;
pub mod replay;
pub mod track;

// Re-export commonly used types
pub use cache::{CacheKey, FileStore, MemoryStore, ReplayStore, StoredEntry};
pub use config::AppConfig;
pub use errors::RacelineError;
pub use provider::{LapHeader, LapSample, RawPoint, SessionData, TelemetrySource};
pub use replay::{DriverMeta, DriverSample, Frame, RaceCatalog, RaceSummary, ReplayBuilder, ReplayDocument};
pub use track::{TrackBounds, TrackBuilder, TrackGeometry, TrackPoint};
