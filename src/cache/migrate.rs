// Migration adapter for cache entries written before envelope versioning.
// Detection is by shape-sniffing the raw JSON value: version 1 replay
// documents carried absolute datetime strings in their frames, while the
// current format uses a relative race clock ("0:00:00"). Entries that carry
// a schema_version field never go through the heuristic.

use serde_json::Value;

use super::{CacheKey, SCHEMA_VERSION};
use crate::RacelineError;

/// Check whether a raw cache entry is in the current format. Returns
/// `LegacyCacheFormat` when the entry must be rebuilt.
pub(crate) fn check_entry_format(key: &CacheKey, entry: &Value) -> Result<(), RacelineError> {
    match entry.get("schema_version").and_then(Value::as_u64) {
        Some(version) if version == u64::from(SCHEMA_VERSION) => Ok(()),
        Some(_) => Err(RacelineError::LegacyCacheFormat),
        // No version field: only replay payloads ever changed shape, so
        // only they need the heuristic. Track and catalog entries from
        // before versioning deserialize unchanged.
        None => match key {
            CacheKey::Replay { .. } if is_legacy_replay_payload(entry) => {
                Err(RacelineError::LegacyCacheFormat)
            }
            _ => Ok(()),
        },
    }
}

/// Sniff an unversioned replay envelope for the legacy frame time format:
/// an absolute ISO datetime (contains 'T') or a pandas Timedelta rendering
/// ("0 days 00:01:23", longer than any relative clock string).
fn is_legacy_replay_payload(entry: &Value) -> bool {
    let first_frame_time = entry
        .get("data")
        .and_then(|data| data.get("frames").or_else(|| data.get("telemetry")))
        .and_then(Value::as_array)
        .and_then(|frames| frames.first())
        .and_then(|frame| frame.get("time"))
        .and_then(Value::as_str);

    match first_frame_time {
        Some(time) => time.contains('T') || time.len() > 19,
        None => false,
    }
}
