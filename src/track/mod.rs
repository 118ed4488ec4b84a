// Track shape normalization and the cached track build path.
//
// normalize() is a pure transform: raw world coordinates are centered on
// the bounding-box midpoint and scaled by the larger extent into roughly
// [-0.5, 0.5], with the x axis negated to correct the source coordinate
// orientation. The raw bounds, center and scale ride along so consumers
// can convert normalized coordinates back to meters.

use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::RacelineError;
use crate::cache::{self, CacheKey, ReplayStore};
use crate::provider::{RawPoint, SessionData, TelemetrySource};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TrackPoint {
    pub x: f64,
    pub y: f64,
}

/// Raw-coordinate bounding box of the track outline
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TrackBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// Normalized track overlay plus the raw-space parameters used to produce it
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TrackGeometry {
    /// Normalized points, in input order
    pub path: Vec<TrackPoint>,
    pub bounds: TrackBounds,
    /// Midpoint of the raw bounds
    pub center: TrackPoint,
    /// Larger of the raw width/height; multiply normalized coordinates by
    /// this to get back to source units
    pub scale: f64,
}

/// Normalize an ordered outline. Empty input yields an empty geometry with
/// all-zero bounds; a degenerate outline (all points identical, scale 0)
/// maps every point to the origin. No reordering, deduplication or
/// smoothing.
pub fn normalize(points: &[RawPoint]) -> TrackGeometry {
    let (Some((min_x, max_x)), Some((min_y, max_y))) = (
        points.iter().map(|p| p.x).minmax().into_option(),
        points.iter().map(|p| p.y).minmax().into_option(),
    ) else {
        return TrackGeometry::default();
    };

    let center_x = (min_x + max_x) / 2.0;
    let center_y = (min_y + max_y) / 2.0;
    let scale = (max_x - min_x).max(max_y - min_y);

    let path = points
        .iter()
        .map(|p| {
            if scale > 0.0 {
                TrackPoint {
                    // invert x to match the renderer's orientation
                    x: -(p.x - center_x) / scale,
                    y: (p.y - center_y) / scale,
                }
            } else {
                TrackPoint { x: 0.0, y: 0.0 }
            }
        })
        .collect();

    TrackGeometry {
        path,
        bounds: TrackBounds {
            min_x,
            max_x,
            min_y,
            max_y,
        },
        center: TrackPoint {
            x: center_x,
            y: center_y,
        },
        scale,
    }
}

/// Builds (or loads from cache) the normalized track overlay for one event
pub struct TrackBuilder<'a> {
    source: &'a dyn TelemetrySource,
    store: &'a dyn ReplayStore,
}

impl<'a> TrackBuilder<'a> {
    pub fn new(source: &'a dyn TelemetrySource, store: &'a dyn ReplayStore) -> Self {
        Self { source, store }
    }

    /// Track geometry from the event's race session: direct track
    /// coordinates when the source has them, else the positional trace of
    /// the first driver's first lap.
    pub fn build(&self, year: u16, event: &str) -> Result<TrackGeometry, RacelineError> {
        let key = CacheKey::Track {
            year,
            event: event.to_string(),
        };
        if let Some(geometry) = cache::fetch_valid::<TrackGeometry>(self.store, &key) {
            info!("Loaded track geometry from cache: {} {}", year, event);
            return Ok(geometry);
        }

        let session = self.source.resolve_session(year, event, "R")?;
        let points = match session.track_coordinates() {
            Some(points) if !points.is_empty() => points,
            _ => first_lap_trace(&*session)?,
        };
        let geometry = normalize(&points);

        if let Err(e) = cache::store_entry(self.store, &key, &geometry) {
            warn!("Could not persist track geometry for {} {}: {}", year, event, e);
        }
        Ok(geometry)
    }
}

/// Positional trace of the first driver's first lap, the fallback outline
/// when the source carries no explicit track coordinates
fn first_lap_trace(session: &dyn SessionData) -> Result<Vec<RawPoint>, RacelineError> {
    let driver = session
        .drivers()
        .into_iter()
        .next()
        .ok_or(RacelineError::NoTelemetryAvailable)?;
    let first_lap = session
        .laps_for(&driver)?
        .into_iter()
        .next()
        .ok_or(RacelineError::NoTelemetryAvailable)?;

    let points: Vec<RawPoint> = session
        .lap_telemetry(&driver, first_lap.number)?
        .iter()
        .filter_map(|sample| match (sample.x, sample.y) {
            (Some(x), Some(y)) => Some(RawPoint { x, y }),
            _ => None,
        })
        .collect();

    if points.is_empty() {
        return Err(RacelineError::NoTelemetryAvailable);
    }
    Ok(points)
}
