// Abstraction over the upstream telemetry/session data source.
// The engine only ever sees these traits; concrete sources (recorded
// session dumps, in-memory fixtures) live behind them.

pub(crate) mod recorded;

pub use recorded::{InMemorySession, RecordedSessionProvider, SessionRecord};

use serde::{Deserialize, Serialize};

use crate::RacelineError;

/// Header information for one completed lap of one driver
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LapHeader {
    /// Lap number within the session, starting at 1
    pub number: u32,
    /// Offset of the lap start from the session start, in seconds
    pub start_offset_s: f64,
    /// Lap time in seconds, when the source recorded one
    pub duration_s: Option<f64>,
    /// Driver display name as reported on this lap
    pub driver_name: Option<String>,
    /// Team name as reported on this lap
    pub team_name: Option<String>,
    /// Official lap distance in meters, when the source reports one
    pub lap_distance_m: Option<f64>,
}

/// One raw telemetry measurement within a lap. Every channel is
/// independently optional; partial samples are valid.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LapSample {
    /// Offset from the lap start, in seconds
    pub time_offset_s: f64,
    pub x: Option<f64>,
    pub y: Option<f64>,
    /// Distance traveled along the track, in meters
    pub distance_m: Option<f64>,
    /// Speed in km/h
    pub speed_kmh: Option<f64>,
}

/// A raw 2D world coordinate from the source, in source units
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct RawPoint {
    pub x: f64,
    pub y: f64,
}

/// Resolves sessions for a (year, event, session type) triple.
pub trait TelemetrySource {
    /// Resolve a session or fail with `SessionNotFound`
    fn resolve_session(
        &self,
        year: u16,
        event: &str,
        session: &str,
    ) -> Result<Box<dyn SessionData>, RacelineError>;
}

/// Read access to one resolved session.
pub trait SessionData {
    /// Session date as reported by the source, if known
    fn date(&self) -> Option<String>;

    /// Participating driver identifiers, in source order
    fn drivers(&self) -> Vec<String>;

    /// Lap headers for one driver, ordered by lap number
    fn laps_for(&self, driver: &str) -> Result<Vec<LapHeader>, RacelineError>;

    /// Raw telemetry for one lap of one driver. An empty vector is a
    /// valid answer; an error means the fetch itself failed.
    fn lap_telemetry(&self, driver: &str, lap_number: u32)
    -> Result<Vec<LapSample>, RacelineError>;

    /// Track outline coordinates when the source carries them directly.
    /// Callers fall back to the first lap's positional trace otherwise.
    fn track_coordinates(&self) -> Option<Vec<RawPoint>>;
}
