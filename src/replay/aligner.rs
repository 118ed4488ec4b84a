// The temporal resampling core: merges per-driver raw series recorded at
// irregular native rates onto one regularly spaced replay clock. Each tick
// carries, per driver, the nearest raw sample within the tolerance window.
//
// The nearest sample index for a time-sorted series never moves backwards
// as the tick cursor advances, so each driver gets one forward-only cursor
// instead of a full scan per tick. The observable result is identical to
// the scan: nearest sample by absolute time distance, earliest sample
// winning ties.

use std::collections::BTreeMap;

use log::debug;

use super::{DriverSample, DriverSeries, Frame, RawSample, format_race_clock};
use crate::RacelineError;

/// Output of one alignment pass
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    /// Session-time offset of the earliest sample across all drivers
    pub start_s: f64,
    /// Session-time offset of the latest sample across all drivers
    pub end_s: f64,
    pub frames: Vec<Frame>,
}

/// Align all driver series onto a common clock ticking every
/// `tick_interval_s` seconds from the earliest sample to the latest.
///
/// The tick at the session start is always emitted, even with no driver
/// within tolerance, so every replay starts at "0:00:00". Later ticks
/// where no driver qualifies are dropped entirely. The tick count is
/// bounded by the whole-second duration of the covered range.
pub fn align(
    series: &BTreeMap<String, DriverSeries>,
    tick_interval_s: f64,
    tolerance_s: f64,
) -> Result<Alignment, RacelineError> {
    let mut start_s = f64::INFINITY;
    let mut end_s = f64::NEG_INFINITY;
    for driver_series in series.values() {
        for sample in &driver_series.samples {
            start_s = start_s.min(sample.timestamp_s);
            end_s = end_s.max(sample.timestamp_s);
        }
    }
    if !start_s.is_finite() {
        return Err(RacelineError::NoTimeData);
    }

    let mut cursors: Vec<(&String, &[RawSample], usize)> = series
        .iter()
        .filter(|(_, s)| !s.samples.is_empty())
        .map(|(driver, s)| (driver, s.samples.as_slice(), 0usize))
        .collect();

    // Bound iteration to the actual session length: at one tick per second
    // this changes nothing, at finer intervals it caps the frame count.
    let max_tick_index = (end_s - start_s).floor() as u64;

    let mut frames = Vec::new();
    for tick_index in 0..=max_tick_index {
        let t = start_s + tick_index as f64 * tick_interval_s;
        if t > end_s {
            break;
        }

        let mut drivers = BTreeMap::new();
        for (driver, samples, cursor) in cursors.iter_mut() {
            // Advance to the nearest sample; strict improvement only, so
            // the earliest of two equidistant samples is kept.
            while *cursor + 1 < samples.len()
                && (samples[*cursor + 1].timestamp_s - t).abs()
                    < (samples[*cursor].timestamp_s - t).abs()
            {
                *cursor += 1;
            }

            let nearest = &samples[*cursor];
            if (nearest.timestamp_s - t).abs() <= tolerance_s {
                drivers.insert(driver.to_string(), to_driver_sample(nearest));
            }
        }

        // Tick 0 anchors the replay clock and is emitted unconditionally
        if tick_index == 0 || !drivers.is_empty() {
            frames.push(Frame {
                time: format_race_clock(t - start_s),
                tick_s: t - start_s,
                drivers,
            });
        }
    }

    debug!(
        "Aligned {} drivers over {:.1}s into {} frames",
        series.len(),
        end_s - start_s,
        frames.len()
    );
    Ok(Alignment {
        start_s,
        end_s,
        frames,
    })
}

fn to_driver_sample(sample: &RawSample) -> DriverSample {
    DriverSample {
        x: sample.x,
        y: sample.y,
        distance: sample.distance_m,
        speed: sample.speed_kmh,
        lap: sample.lap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_at(timestamp_s: f64) -> RawSample {
        RawSample {
            timestamp_s,
            x: Some(1.0),
            y: Some(2.0),
            distance_m: None,
            speed_kmh: None,
            lap: Some(1),
        }
    }

    fn series_of(timestamps: &[f64]) -> DriverSeries {
        DriverSeries {
            samples: timestamps.iter().copied().map(sample_at).collect(),
        }
    }

    #[test]
    fn test_no_samples_is_an_error() {
        let mut series = BTreeMap::new();
        series.insert("1".to_string(), DriverSeries::default());
        assert!(matches!(
            align(&series, 1.0, 2.0),
            Err(RacelineError::NoTimeData)
        ));
        assert!(matches!(
            align(&BTreeMap::new(), 1.0, 2.0),
            Err(RacelineError::NoTimeData)
        ));
    }

    #[test]
    fn test_first_frame_is_always_time_zero() {
        // Single sample far from any later tick still anchors the clock
        let mut series = BTreeMap::new();
        series.insert("1".to_string(), series_of(&[100.0]));
        let alignment = align(&series, 1.0, 2.0).unwrap();

        assert_eq!(alignment.start_s, 100.0);
        assert_eq!(alignment.end_s, 100.0);
        assert_eq!(alignment.frames.len(), 1);
        assert_eq!(alignment.frames[0].time, "0:00:00");
        assert_eq!(alignment.frames[0].tick_s, 0.0);
    }

    #[test]
    fn test_first_frame_survives_when_every_later_tick_is_empty() {
        // With a tight tolerance no tick after the first qualifies, so
        // the replay is exactly its mandatory opening frame.
        let mut series = BTreeMap::new();
        series.insert("1".to_string(), series_of(&[0.4, 5.0]));
        let alignment = align(&series, 1.0, 0.2).unwrap();

        assert_eq!(alignment.frames.len(), 1);
        assert_eq!(alignment.frames[0].time, "0:00:00");
        assert!(alignment.frames[0].drivers.contains_key("1"));
    }

    #[test]
    fn test_two_driver_scenario() {
        // Driver A sampled at t=0.0 and t=1.0, driver B only at t=5.0.
        let mut series = BTreeMap::new();
        series.insert(
            "A".to_string(),
            DriverSeries {
                samples: vec![
                    RawSample {
                        timestamp_s: 0.0,
                        x: Some(10.0),
                        y: Some(20.0),
                        distance_m: None,
                        speed_kmh: None,
                        lap: None,
                    },
                    RawSample {
                        timestamp_s: 1.0,
                        x: Some(11.0),
                        y: Some(21.0),
                        distance_m: None,
                        speed_kmh: None,
                        lap: None,
                    },
                ],
            },
        );
        series.insert("B".to_string(), series_of(&[5.0]));

        let alignment = align(&series, 1.0, 2.0).unwrap();

        let first = &alignment.frames[0];
        assert_eq!(first.time, "0:00:00");
        assert_eq!(first.drivers["A"].x, Some(10.0));
        assert!(!first.drivers.contains_key("B"));

        let last = alignment.frames.last().unwrap();
        assert_eq!(last.time, "0:00:05");
        assert!(last.drivers.contains_key("B"));
        assert!(!last.drivers.contains_key("A"));
    }

    #[test]
    fn test_empty_middle_ticks_are_dropped() {
        let mut series = BTreeMap::new();
        series.insert("1".to_string(), series_of(&[0.0, 10.0]));
        let alignment = align(&series, 1.0, 1.0).unwrap();

        let times: Vec<&str> = alignment.frames.iter().map(|f| f.time.as_str()).collect();
        assert_eq!(times, vec!["0:00:00", "0:00:01", "0:00:09", "0:00:10"]);
    }

    #[test]
    fn test_tick_offsets_are_interval_multiples_and_increase() {
        let mut series = BTreeMap::new();
        series.insert("1".to_string(), series_of(&[0.0, 3.0, 7.0, 12.0]));
        let alignment = align(&series, 1.0, 2.0).unwrap();

        for window in alignment.frames.windows(2) {
            assert!(window[1].tick_s > window[0].tick_s);
        }
        for frame in &alignment.frames {
            assert_eq!(frame.tick_s % 1.0, 0.0);
        }
    }

    #[test]
    fn test_equidistant_samples_take_the_earlier_one() {
        // Samples at 0.5 and 1.5 are both 0.5s from the tick at t=1.0
        let mut series = BTreeMap::new();
        series.insert(
            "1".to_string(),
            DriverSeries {
                samples: vec![
                    RawSample {
                        timestamp_s: 0.0,
                        x: Some(0.0),
                        y: None,
                        distance_m: None,
                        speed_kmh: None,
                        lap: None,
                    },
                    RawSample {
                        timestamp_s: 0.5,
                        x: Some(1.0),
                        y: None,
                        distance_m: None,
                        speed_kmh: None,
                        lap: None,
                    },
                    RawSample {
                        timestamp_s: 1.5,
                        x: Some(2.0),
                        y: None,
                        distance_m: None,
                        speed_kmh: None,
                        lap: None,
                    },
                ],
            },
        );
        let alignment = align(&series, 1.0, 2.0).unwrap();

        let frame = &alignment.frames[1];
        assert_eq!(frame.tick_s, 1.0);
        assert_eq!(frame.drivers["1"].x, Some(1.0));
    }

    #[test]
    fn test_partial_channels_carry_through() {
        let mut series = BTreeMap::new();
        series.insert(
            "1".to_string(),
            DriverSeries {
                samples: vec![RawSample {
                    timestamp_s: 0.0,
                    x: None,
                    y: Some(4.0),
                    distance_m: Some(100.0),
                    speed_kmh: None,
                    lap: Some(3),
                }],
            },
        );
        let alignment = align(&series, 1.0, 2.0).unwrap();

        let driver = &alignment.frames[0].drivers["1"];
        assert_eq!(driver.x, None);
        assert_eq!(driver.y, Some(4.0));
        assert_eq!(driver.distance, Some(100.0));
        assert_eq!(driver.speed, None);
        assert_eq!(driver.lap, Some(3));
    }

    #[test]
    fn test_final_tick_on_exact_interval_boundary() {
        // Duration exactly 5.0s: the tick at t=5 must still be emitted
        let mut series = BTreeMap::new();
        series.insert("1".to_string(), series_of(&[0.0, 5.0]));
        let alignment = align(&series, 1.0, 2.0).unwrap();

        assert_eq!(alignment.frames.last().unwrap().time, "0:00:05");
    }

    proptest! {
        #[test]
        fn prop_first_frame_always_time_zero(
            timestamps in proptest::collection::vec(0.0f64..500.0, 1..50)
        ) {
            let mut series = BTreeMap::new();
            let mut driver_series = series_of(&timestamps);
            driver_series.sort_by_time();
            series.insert("1".to_string(), driver_series);

            let alignment = align(&series, 1.0, 2.0).unwrap();
            prop_assert_eq!(alignment.frames[0].time.as_str(), "0:00:00");
            prop_assert_eq!(alignment.frames[0].tick_s, 0.0);
        }

        #[test]
        fn prop_included_samples_respect_tolerance(
            a in proptest::collection::vec(0.0f64..200.0, 1..40),
            b in proptest::collection::vec(0.0f64..200.0, 1..40),
            tolerance in 0.1f64..5.0,
        ) {
            let mut series = BTreeMap::new();
            for (driver, timestamps) in [("A", &a), ("B", &b)] {
                let mut driver_series = series_of(timestamps);
                driver_series.sort_by_time();
                series.insert(driver.to_string(), driver_series);
            }

            let alignment = align(&series, 1.0, tolerance).unwrap();
            for frame in &alignment.frames {
                let t = alignment.start_s + frame.tick_s;
                for driver in frame.drivers.keys() {
                    let nearest = series[driver]
                        .samples
                        .iter()
                        .map(|s| (s.timestamp_s - t).abs())
                        .fold(f64::INFINITY, f64::min);
                    prop_assert!(nearest <= tolerance + 1e-9);
                }
            }
        }

        #[test]
        fn prop_frame_offsets_strictly_increase(
            timestamps in proptest::collection::vec(0.0f64..300.0, 1..60)
        ) {
            let mut series = BTreeMap::new();
            let mut driver_series = series_of(&timestamps);
            driver_series.sort_by_time();
            series.insert("1".to_string(), driver_series);

            let alignment = align(&series, 1.0, 2.0).unwrap();
            for window in alignment.frames.windows(2) {
                prop_assert!(window[1].tick_s > window[0].tick_s);
            }
        }
    }
}
