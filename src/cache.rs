//! Memo tables shared by the parser, propagation adapter, crossing search
//! and track builders.
//!
//! One [`TleCache`] is one session: every geometry function takes it
//! explicitly, so tests and independent callers never share state unless
//! they share the instance. Tables are unbounded; call [`TleCache::clear`]
//! to release memory.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;
use serde::Serialize;

use crate::checksum::is_valid_record;
use crate::config::{CoordFormat, Observer};
use crate::error::{PropagationCause, Result};
use crate::parser::{ParsedTle, TleInput};
use crate::propagation::{SatelliteInfo, Sgp4Record};
use crate::track::OrbitTrack;

/// Crossing times discovered for one TLE, or the verdict that it never
/// crosses the antemeridian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Crossings {
    Found(Vec<i64>),
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct InfoKey {
    tle: String,
    timestamp_ms: i64,
    observer: [u64; 3],
}

impl InfoKey {
    pub(crate) fn new(tle: &ParsedTle, timestamp_ms: i64, observer: &Observer) -> Self {
        Self {
            tle: identity(tle),
            timestamp_ms,
            observer: [
                observer.lat.to_bits(),
                observer.lng.to_bits(),
                observer.height_km.to_bits(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct TrackKey {
    tle: String,
    start: i64,
    step_ms: i64,
    max_time_ms: i64,
    format: CoordFormat,
}

impl TrackKey {
    pub(crate) fn new(
        tle: &ParsedTle,
        start: i64,
        step_ms: i64,
        max_time_ms: i64,
        format: CoordFormat,
    ) -> Self {
        Self {
            tle: identity(tle),
            start,
            step_ms,
            max_time_ms,
            format,
        }
    }
}

/// Entry counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheSizes {
    pub parsed: usize,
    pub validity: usize,
    pub records: usize,
    pub satellite_info: usize,
    pub crossings: usize,
    pub orbit_tracks: usize,
    pub ground_tracks: usize,
}

#[derive(Debug, Default)]
pub struct TleCache {
    parsed: Mutex<HashMap<String, Arc<ParsedTle>>>,
    validity: Mutex<HashMap<String, bool>>,
    records: Mutex<HashMap<String, std::result::Result<Arc<Sgp4Record>, PropagationCause>>>,
    satellite_info: Mutex<HashMap<InfoKey, SatelliteInfo>>,
    crossings: Mutex<HashMap<String, Crossings>>,
    orbit_tracks: Mutex<HashMap<TrackKey, OrbitTrack>>,
    ground_tracks: Mutex<HashMap<TrackKey, Vec<OrbitTrack>>>,
}

/// Identity of a TLE for memo keys: both data lines.
pub(crate) fn identity(tle: &ParsedTle) -> String {
    format!("{}\n{}", tle.lines[0], tle.lines[1])
}

// A panic while holding a lock cannot leave a half-written HashMap entry,
// so a poisoned table is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn lookup<K: Eq + Hash, V: Clone>(table: &Mutex<HashMap<K, V>>, key: &K) -> Option<V> {
    lock(table).get(key).cloned()
}

fn store<K: Eq + Hash, V>(table: &Mutex<HashMap<K, V>>, key: K, value: V) {
    lock(table).insert(key, value);
}

impl TleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memoized [`ParsedTle::parse`]. Already-parsed input is returned as
    /// the same `Arc`.
    pub fn parse<'a>(&self, input: impl Into<TleInput<'a>>) -> Result<Arc<ParsedTle>> {
        let input = input.into();
        let Some(key) = input.cache_key() else {
            return ParsedTle::parse(input);
        };
        if let Some(tle) = lookup(&self.parsed, &key) {
            return Ok(tle);
        }
        let tle = ParsedTle::parse(input)?;
        store(&self.parsed, key, Arc::clone(&tle));
        Ok(tle)
    }

    /// Memoized [`crate::is_valid_tle`].
    pub fn is_valid<'a>(&self, input: impl Into<TleInput<'a>>) -> bool {
        let Ok(tle) = self.parse(input) else {
            return false;
        };
        let key = identity(&tle);
        if let Some(valid) = lookup(&self.validity, &key) {
            return valid;
        }
        let valid = is_valid_record(&tle);
        store(&self.validity, key, valid);
        valid
    }

    pub fn sizes(&self) -> CacheSizes {
        CacheSizes {
            parsed: lock(&self.parsed).len(),
            validity: lock(&self.validity).len(),
            records: lock(&self.records).len(),
            satellite_info: lock(&self.satellite_info).len(),
            crossings: lock(&self.crossings).len(),
            orbit_tracks: lock(&self.orbit_tracks).len(),
            ground_tracks: lock(&self.ground_tracks).len(),
        }
    }

    /// Empties every table.
    pub fn clear(&self) {
        debug!("[TleCache::clear] sizes before clear: {:?}", self.sizes());
        self.clear_parse_cache();
        lock(&self.records).clear();
        lock(&self.satellite_info).clear();
        lock(&self.crossings).clear();
        lock(&self.orbit_tracks).clear();
        lock(&self.ground_tracks).clear();
    }

    /// Empties the parse and validity tables only.
    pub fn clear_parse_cache(&self) {
        lock(&self.parsed).clear();
        lock(&self.validity).clear();
    }

    pub(crate) fn record(
        &self,
        tle: &ParsedTle,
    ) -> Option<std::result::Result<Arc<Sgp4Record>, PropagationCause>> {
        lookup(&self.records, &identity(tle))
    }

    pub(crate) fn store_record(
        &self,
        tle: &ParsedTle,
        record: std::result::Result<Arc<Sgp4Record>, PropagationCause>,
    ) {
        store(&self.records, identity(tle), record);
    }

    pub(crate) fn satellite_info(&self, key: &InfoKey) -> Option<SatelliteInfo> {
        lookup(&self.satellite_info, key)
    }

    pub(crate) fn store_satellite_info(&self, key: InfoKey, info: SatelliteInfo) {
        store(&self.satellite_info, key, info);
    }

    pub(crate) fn crossings(&self, tle: &ParsedTle) -> Option<Crossings> {
        lookup(&self.crossings, &identity(tle))
    }

    /// Adds a found crossing time, or marks the TLE as never crossing when
    /// `time_ms` is `None`.
    pub(crate) fn record_crossing(&self, tle: &ParsedTle, time_ms: Option<i64>) {
        let mut crossings = lock(&self.crossings);
        let entry = crossings
            .entry(identity(tle))
            .or_insert_with(|| Crossings::Found(Vec::new()));
        match (entry, time_ms) {
            (Crossings::Found(times), Some(t)) => {
                if !times.contains(&t) {
                    times.push(t);
                }
            }
            // Earlier crossings stay valid for the reference times they cover.
            (Crossings::Found(times), None) if !times.is_empty() => {}
            (entry, None) => *entry = Crossings::Never,
            (Crossings::Never, Some(_)) => {}
        }
    }

    pub(crate) fn orbit_track(&self, key: &TrackKey) -> Option<OrbitTrack> {
        lookup(&self.orbit_tracks, key)
    }

    pub(crate) fn store_orbit_track(&self, key: TrackKey, track: OrbitTrack) {
        store(&self.orbit_tracks, key, track);
    }

    pub(crate) fn ground_tracks(&self, key: &TrackKey) -> Option<Vec<OrbitTrack>> {
        lookup(&self.ground_tracks, key)
    }

    pub(crate) fn store_ground_tracks(&self, key: TrackKey, tracks: Vec<OrbitTrack>) {
        store(&self.ground_tracks, key, tracks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS1: &str = "1 25544U 98067A   17206.18396726  .00001961  00000-0  36771-4 0  9993";
    const ISS2: &str = "2 25544  51.6400 208.9163 0006317  69.9862  25.2906 15.54225995 67660";

    #[test]
    fn parse_is_memoized_and_idempotent() {
        let cache = TleCache::new();
        let first = cache.parse([ISS1, ISS2]).unwrap();
        let second = cache.parse([ISS1, ISS2]).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let reparsed = cache.parse(&first).unwrap();
        assert!(Arc::ptr_eq(&first, &reparsed));
        assert_eq!(cache.sizes().parsed, 1);
    }

    #[test]
    fn names_do_not_collide_in_parse_cache() {
        let cache = TleCache::new();
        let a = cache.parse(["A", ISS1, ISS2]).unwrap();
        let b = cache.parse(["B", ISS1, ISS2]).unwrap();
        assert_eq!(a.name.as_deref(), Some("A"));
        assert_eq!(b.name.as_deref(), Some("B"));
    }

    #[test]
    fn validity_is_memoized() {
        let cache = TleCache::new();
        assert!(cache.is_valid([ISS1, ISS2]));
        assert!(cache.is_valid([ISS1, ISS2]));
        assert_eq!(cache.sizes().validity, 1);
        assert!(!cache.is_valid(ISS1));
    }

    #[test]
    fn crossing_list_and_never() {
        let cache = TleCache::new();
        let tle = cache.parse([ISS1, ISS2]).unwrap();
        assert_eq!(cache.crossings(&tle), None);

        cache.record_crossing(&tle, Some(10));
        cache.record_crossing(&tle, Some(20));
        cache.record_crossing(&tle, Some(10));
        assert_eq!(cache.crossings(&tle), Some(Crossings::Found(vec![10, 20])));

        // A failed search does not erase crossings already found.
        cache.record_crossing(&tle, None);
        assert_eq!(cache.crossings(&tle), Some(Crossings::Found(vec![10, 20])));

        cache.clear();
        cache.record_crossing(&tle, None);
        assert_eq!(cache.crossings(&tle), Some(Crossings::Never));
    }

    #[test]
    fn clear_empties_everything() {
        let cache = TleCache::new();
        let tle = cache.parse([ISS1, ISS2]).unwrap();
        cache.is_valid(&tle);
        cache.record_crossing(&tle, Some(1));
        assert_ne!(cache.sizes(), CacheSizes::default());

        cache.clear_parse_cache();
        assert_eq!(cache.sizes().parsed, 0);
        assert_eq!(cache.sizes().crossings, 1);

        cache.clear();
        assert_eq!(cache.sizes(), CacheSizes::default());
    }
}
