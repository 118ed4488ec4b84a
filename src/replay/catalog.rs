// Season race catalog: which (year, event) combinations actually have
// retrievable data. An event makes the list only when its race session
// resolves; everything else is silently "not yet available".

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::RacelineError;
use crate::cache::{self, CacheKey, ReplayStore};
use crate::provider::TelemetrySource;

/// Grand Prix candidates for the target season, in calendar order
pub const SEASON_EVENTS: &[&str] = &[
    "Bahrain",
    "Saudi Arabia",
    "Australia",
    "Japan",
    "China",
    "Miami",
    "Emilia Romagna",
    "Monaco",
    "Canada",
    "Spain",
    "Austria",
    "Great Britain",
    "Hungary",
    "Belgium",
    "Netherlands",
    "Italy",
    "Azerbaijan",
    "Singapore",
    "United States",
    "Mexico",
    "Brazil",
    "Qatar",
    "Abu Dhabi",
];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RaceSummary {
    pub year: u16,
    pub event: String,
    /// Display name, e.g. "Monaco Grand Prix"
    pub name: String,
    pub date: Option<String>,
}

pub struct RaceCatalog<'a> {
    source: &'a dyn TelemetrySource,
    store: &'a dyn ReplayStore,
    season: u16,
}

impl<'a> RaceCatalog<'a> {
    pub fn new(source: &'a dyn TelemetrySource, store: &'a dyn ReplayStore, season: u16) -> Self {
        Self {
            source,
            store,
            season,
        }
    }

    /// List the races with retrievable data. The result is cached and,
    /// unlike every other entry, served regardless of age (see DESIGN.md).
    pub fn list(&self) -> Result<Vec<RaceSummary>, RacelineError> {
        let key = CacheKey::Catalog { year: self.season };
        if let Some(races) = cache::fetch_valid::<Vec<RaceSummary>>(self.store, &key) {
            info!("Loaded race list from cache: {} races", races.len());
            return Ok(races);
        }

        let mut races = Vec::new();
        for event in SEASON_EVENTS {
            match self.source.resolve_session(self.season, event, "R") {
                Ok(session) => races.push(RaceSummary {
                    year: self.season,
                    event: event.to_string(),
                    name: format!("{} Grand Prix", event),
                    date: session.date(),
                }),
                Err(e) => {
                    debug!("Skipping {} {}: {}", self.season, event, e);
                }
            }
        }

        if let Err(e) = cache::store_entry(self.store, &key, &races) {
            warn!("Could not persist race list: {}", e);
        }
        Ok(races)
    }
}
