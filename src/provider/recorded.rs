// Telemetry source backed by recorded session dumps on disk.
// A dump is a JSON-lines file named {year}_{event}_{session}.jsonl with one
// record per line; records are folded into an in-memory session the same
// way live data would arrive: a header, then lap headers and samples.

use std::collections::HashMap;
use std::path::PathBuf;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{LapHeader, LapSample, RawPoint, SessionData, TelemetrySource};
use crate::RacelineError;
use crate::cache::normalize_event_name;

/// One line of a recorded session dump
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SessionRecord {
    Header {
        date: Option<String>,
    },
    Lap {
        driver: String,
        header: LapHeader,
    },
    Sample {
        driver: String,
        lap_number: u32,
        sample: LapSample,
    },
    TrackOutline {
        points: Vec<RawPoint>,
    },
}

/// Fully materialized session, also used as the test fixture session
#[derive(Clone, Debug, Default)]
pub struct InMemorySession {
    date: Option<String>,
    driver_order: Vec<String>,
    laps: HashMap<String, Vec<LapHeader>>,
    telemetry: HashMap<(String, u32), Vec<LapSample>>,
    track_outline: Option<Vec<RawPoint>>,
}

impl InMemorySession {
    pub fn new(date: Option<String>) -> Self {
        Self {
            date,
            ..Default::default()
        }
    }

    /// Register a lap header for a driver, keeping driver insertion order
    pub fn add_lap(&mut self, driver: &str, header: LapHeader) {
        if !self.driver_order.iter().any(|d| d == driver) {
            self.driver_order.push(driver.to_string());
        }
        self.laps.entry(driver.to_string()).or_default().push(header);
    }

    pub fn add_sample(&mut self, driver: &str, lap_number: u32, sample: LapSample) {
        self.telemetry
            .entry((driver.to_string(), lap_number))
            .or_default()
            .push(sample);
    }

    pub fn set_track_outline(&mut self, points: Vec<RawPoint>) {
        self.track_outline = Some(points);
    }

    fn apply(&mut self, record: SessionRecord) {
        match record {
            SessionRecord::Header { date } => self.date = date,
            SessionRecord::Lap { driver, header } => self.add_lap(&driver, header),
            SessionRecord::Sample {
                driver,
                lap_number,
                sample,
            } => self.add_sample(&driver, lap_number, sample),
            SessionRecord::TrackOutline { points } => self.set_track_outline(points),
        }
    }
}

impl SessionData for InMemorySession {
    fn date(&self) -> Option<String> {
        self.date.clone()
    }

    fn drivers(&self) -> Vec<String> {
        self.driver_order.clone()
    }

    fn laps_for(&self, driver: &str) -> Result<Vec<LapHeader>, RacelineError> {
        Ok(self.laps.get(driver).cloned().unwrap_or_default())
    }

    fn lap_telemetry(
        &self,
        driver: &str,
        lap_number: u32,
    ) -> Result<Vec<LapSample>, RacelineError> {
        Ok(self
            .telemetry
            .get(&(driver.to_string(), lap_number))
            .cloned()
            .unwrap_or_default())
    }

    fn track_coordinates(&self) -> Option<Vec<RawPoint>> {
        self.track_outline.clone()
    }
}

/// Telemetry source reading session dumps from a directory
pub struct RecordedSessionProvider {
    sessions_dir: PathBuf,
}

impl RecordedSessionProvider {
    pub fn new(sessions_dir: PathBuf) -> Self {
        Self { sessions_dir }
    }

    fn recording_path(&self, year: u16, event: &str, session: &str) -> PathBuf {
        let filename = format!(
            "{}_{}_{}.jsonl",
            year,
            normalize_event_name(event),
            session.to_lowercase()
        );
        self.sessions_dir.join(filename)
    }
}

impl TelemetrySource for RecordedSessionProvider {
    fn resolve_session(
        &self,
        year: u16,
        event: &str,
        session: &str,
    ) -> Result<Box<dyn SessionData>, RacelineError> {
        let path = self.recording_path(year, event, session);
        if !path.exists() {
            debug!("No recording at {:?}", path);
            return Err(RacelineError::SessionNotFound {
                year,
                event: event.to_string(),
                session: session.to_string(),
            });
        }

        let records = serde_jsonlines::json_lines(&path)
            .map_err(|e| RacelineError::SessionRecordingIOError { source: e })?
            .collect::<Result<Vec<SessionRecord>, std::io::Error>>()
            .map_err(|_| RacelineError::InvalidSessionRecording {
                path: format!("{:?}", path),
            })?;

        let mut materialized = InMemorySession::default();
        for record in records {
            materialized.apply(record);
        }
        info!(
            "Loaded {:?}, found {} drivers",
            path,
            materialized.driver_order.len()
        );
        Ok(Box::new(materialized))
    }
}
