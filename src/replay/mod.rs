pub(crate) mod aligner;
pub(crate) mod builder;
pub(crate) mod catalog;
pub(crate) mod colors;

pub use aligner::{Alignment, align};
pub use builder::{ReplayBuilder, SAMPLE_TOLERANCE_S, TICK_INTERVAL_S};
pub use catalog::{RaceCatalog, RaceSummary, SEASON_EVENTS};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Display identity for one driver, resolved once per build
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DriverMeta {
    pub name: String,
    pub team: String,
    /// Hex display color derived from the team name
    pub color: String,
}

/// One driver's state at one tick. Channels are independently optional;
/// a driver with only position data still renders.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DriverSample {
    pub x: Option<f64>,
    pub y: Option<f64>,
    /// Distance traveled along the track, meters
    pub distance: Option<f64>,
    /// Speed in km/h
    pub speed: Option<f64>,
    pub lap: Option<u32>,
}

/// Multi-driver snapshot at one tick of the replay clock
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Frame {
    /// Elapsed race clock, "H:MM:SS"
    pub time: String,
    /// Offset from the session start in seconds, always a whole multiple
    /// of the tick interval
    pub tick_s: f64,
    /// Drivers with a qualifying sample at this tick. Drivers whose
    /// nearest sample missed the tolerance window are absent entirely.
    pub drivers: BTreeMap<String, DriverSample>,
}

/// The replay-ready dataset for one session: what gets cached and served
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReplayDocument {
    pub year: u16,
    pub event: String,
    pub session: String,
    pub drivers: BTreeMap<String, DriverMeta>,
    pub frames: Vec<Frame>,
    /// Session-time offset of the first sample, seconds
    pub start_time_s: f64,
    /// Session-time offset of the last sample, seconds
    pub end_time_s: f64,
    /// Total covered duration, "H:MM:SS"
    pub total_duration: String,
    /// Track length in meters, when the source data yields one
    pub track_length_m: Option<f64>,
}

/// One raw measurement placed on the session clock, ready for alignment
#[derive(Clone, Debug, PartialEq)]
pub struct RawSample {
    /// Seconds from the session start (lap start offset + intra-lap offset)
    pub timestamp_s: f64,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub distance_m: Option<f64>,
    pub speed_kmh: Option<f64>,
    pub lap: Option<u32>,
}

/// One driver's full session telemetry, ordered by timestamp
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DriverSeries {
    pub samples: Vec<RawSample>,
}

impl DriverSeries {
    /// Sort by timestamp; the sort is stable so samples sharing a
    /// timestamp keep their source order for nearest-neighbor tie-breaks.
    pub fn sort_by_time(&mut self) {
        self.samples.sort_by(|a, b| {
            a.timestamp_s
                .partial_cmp(&b.timestamp_s)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

/// Format elapsed seconds as a race clock: no leading zero on hours,
/// zero-padded minutes and seconds, sub-second part truncated.
pub fn format_race_clock(elapsed_s: f64) -> String {
    let total = if elapsed_s.is_finite() && elapsed_s > 0.0 {
        elapsed_s as u64
    } else {
        0
    };
    format!(
        "{}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_race_clock_formatting() {
        assert_eq!(format_race_clock(0.0), "0:00:00");
        assert_eq!(format_race_clock(5.0), "0:00:05");
        assert_eq!(format_race_clock(61.0), "0:01:01");
        assert_eq!(format_race_clock(3661.0), "1:01:01");
        assert_eq!(format_race_clock(3599.999), "0:59:59");
    }

    #[test]
    fn test_race_clock_has_no_day_component() {
        // 26 hours stays in hours
        assert_eq!(format_race_clock(26.0 * 3600.0), "26:00:00");
    }

    #[test]
    fn test_race_clock_truncates_subseconds() {
        assert_eq!(format_race_clock(5.9), "0:00:05");
    }

    #[test]
    fn test_race_clock_clamps_negative_input() {
        assert_eq!(format_race_clock(-1.0), "0:00:00");
    }

    #[test]
    fn test_series_sort_is_stable_for_equal_timestamps() {
        let mut series = DriverSeries {
            samples: vec![
                RawSample {
                    timestamp_s: 2.0,
                    x: Some(1.0),
                    y: None,
                    distance_m: None,
                    speed_kmh: None,
                    lap: None,
                },
                RawSample {
                    timestamp_s: 2.0,
                    x: Some(2.0),
                    y: None,
                    distance_m: None,
                    speed_kmh: None,
                    lap: None,
                },
                RawSample {
                    timestamp_s: 1.0,
                    x: Some(3.0),
                    y: None,
                    distance_m: None,
                    speed_kmh: None,
                    lap: None,
                },
            ],
        };
        series.sort_by_time();
        assert_eq!(series.samples[0].x, Some(3.0));
        assert_eq!(series.samples[1].x, Some(1.0));
        assert_eq!(series.samples[2].x, Some(2.0));
    }
}
