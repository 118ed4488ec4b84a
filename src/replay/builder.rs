// Assembles the replay document for one session: resolves driver identity,
// lays every lap's telemetry onto the session clock, runs the aligner and
// writes the result through the cache.

use std::collections::BTreeMap;

use log::{info, warn};

use super::colors::{FALLBACK_COLOR, team_color};
use super::{DriverMeta, DriverSeries, RawSample, ReplayDocument, aligner, format_race_clock};
use crate::RacelineError;
use crate::cache::{self, CacheKey, ReplayStore};
use crate::provider::{SessionData, TelemetrySource};

/// Replay clock resolution
pub const TICK_INTERVAL_S: f64 = 1.0;
/// Maximum distance between a tick and a driver's nearest raw sample for
/// that sample to appear in the frame
pub const SAMPLE_TOLERANCE_S: f64 = 2.0;

pub struct ReplayBuilder<'a> {
    source: &'a dyn TelemetrySource,
    store: &'a dyn ReplayStore,
}

impl<'a> ReplayBuilder<'a> {
    pub fn new(source: &'a dyn TelemetrySource, store: &'a dyn ReplayStore) -> Self {
        Self { source, store }
    }

    /// Build (or load from cache) the replay dataset for one session
    pub fn build(
        &self,
        year: u16,
        event: &str,
        session: &str,
    ) -> Result<ReplayDocument, RacelineError> {
        let key = CacheKey::Replay {
            year,
            event: event.to_string(),
            session: session.to_string(),
        };
        if let Some(document) = cache::fetch_valid::<ReplayDocument>(self.store, &key) {
            info!("Loaded replay from cache: {} {}", year, event);
            return Ok(document);
        }

        let session_data = self.source.resolve_session(year, event, session)?;
        let driver_ids = session_data.drivers();

        let mut drivers = BTreeMap::new();
        let mut series = BTreeMap::new();
        for driver in &driver_ids {
            drivers.insert(driver.clone(), resolve_driver_meta(&*session_data, driver));
            if let Some(driver_series) = build_driver_series(&*session_data, driver) {
                series.insert(driver.clone(), driver_series);
            }
        }
        if series.is_empty() {
            return Err(RacelineError::NoTelemetryAvailable);
        }

        let alignment = aligner::align(&series, TICK_INTERVAL_S, SAMPLE_TOLERANCE_S)?;
        let track_length_m = resolve_track_length(&*session_data, &driver_ids);

        let document = ReplayDocument {
            year,
            event: event.to_string(),
            session: session.to_string(),
            drivers,
            total_duration: format_race_clock(alignment.end_s - alignment.start_s),
            start_time_s: alignment.start_s,
            end_time_s: alignment.end_s,
            frames: alignment.frames,
            track_length_m,
        };

        // A failed write never fails the request; the document is rebuilt
        // on the next miss instead.
        if let Err(e) = cache::store_entry(self.store, &key, &document) {
            warn!("Could not persist replay for {} {}: {}", year, event, e);
        } else {
            info!("Saved replay to cache: {} {}", year, event);
        }
        Ok(document)
    }
}

/// Resolve display identity from the driver's first lap header. Any
/// failure yields a placeholder instead of propagating: a driver without
/// metadata still renders.
fn resolve_driver_meta(session: &dyn SessionData, driver: &str) -> DriverMeta {
    let first_lap = match session.laps_for(driver) {
        Ok(laps) => laps.into_iter().next(),
        Err(e) => {
            warn!("Could not read laps for driver {}: {}", driver, e);
            None
        }
    };
    match first_lap {
        Some(lap) => {
            let team = lap.team_name.unwrap_or_else(|| "Unknown".to_string());
            DriverMeta {
                name: lap
                    .driver_name
                    .unwrap_or_else(|| format!("Driver {}", driver)),
                color: team_color(&team).to_string(),
                team,
            }
        }
        None => DriverMeta {
            name: format!("Driver {}", driver),
            team: "Unknown".to_string(),
            color: FALLBACK_COLOR.to_string(),
        },
    }
}

/// Concatenate one driver's telemetry across all laps onto the session
/// clock. Laps that fail to yield telemetry are skipped with a warning;
/// a driver with no usable laps yields no series at all.
fn build_driver_series(session: &dyn SessionData, driver: &str) -> Option<DriverSeries> {
    let laps = match session.laps_for(driver) {
        Ok(laps) => laps,
        Err(e) => {
            warn!("Skipping driver {}: {}", driver, e);
            return None;
        }
    };

    let mut series = DriverSeries::default();
    for lap in &laps {
        let telemetry = match session.lap_telemetry(driver, lap.number) {
            Ok(telemetry) => telemetry,
            Err(e) => {
                warn!("Skipping lap {} of driver {}: {}", lap.number, driver, e);
                continue;
            }
        };
        for sample in telemetry {
            series.samples.push(RawSample {
                timestamp_s: lap.start_offset_s + sample.time_offset_s,
                x: sample.x,
                y: sample.y,
                distance_m: sample.distance_m,
                speed_kmh: sample.speed_kmh,
                lap: Some(lap.number),
            });
        }
    }
    if series.samples.is_empty() {
        return None;
    }
    series.sort_by_time();
    Some(series)
}

/// Track length from the first driver's first lap: the official lap
/// distance when present, else the largest recorded distance value in
/// that lap's telemetry. Absence is never an error.
fn resolve_track_length(session: &dyn SessionData, driver_ids: &[String]) -> Option<f64> {
    let driver = driver_ids.first()?;
    let first_lap = session.laps_for(driver).ok()?.into_iter().next()?;
    if let Some(distance) = first_lap.lap_distance_m {
        return Some(distance);
    }
    session
        .lap_telemetry(driver, first_lap.number)
        .ok()?
        .iter()
        .filter_map(|s| s.distance_m)
        .fold(None, |acc: Option<f64>, d| {
            Some(acc.map_or(d, |m| m.max(d)))
        })
}
