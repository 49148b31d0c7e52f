use std::sync::Arc;

use log::debug;
use serde::Serialize;

use crate::cache::TleCache;
use crate::config::Observer;
use crate::parser::{ParsedTle, TleInput};
use crate::propagation::{satellite_info, SatelliteInfo};

/// A satellite above the elevation threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleSatellite {
    /// Position of the TLE in the caller's list.
    pub index: usize,
    pub tle: Arc<ParsedTle>,
    pub info: SatelliteInfo,
}

/// TLEs whose elevation seen from `observer` is at least
/// `elevation_threshold` degrees at `timestamp_ms`, in input order.
///
/// Entries that fail to parse or propagate are skipped.
pub fn visible_satellites<'a, I, T>(
    cache: &TleCache,
    observer: &Observer,
    tles: I,
    elevation_threshold: f64,
    timestamp_ms: i64,
) -> Vec<VisibleSatellite>
where
    I: IntoIterator<Item = T>,
    T: Into<TleInput<'a>>,
{
    let mut visible = Vec::new();
    for (index, input) in tles.into_iter().enumerate() {
        let tle = match cache.parse(input) {
            Ok(tle) => tle,
            Err(e) => {
                debug!("[visible_satellites] skipping #{index}: {e}");
                continue;
            }
        };
        let info = match satellite_info(cache, &tle, timestamp_ms, observer) {
            Ok(info) => info,
            Err(e) => {
                debug!(
                    "[visible_satellites] skipping #{index} {:?}: {e}",
                    tle.catalog_number()
                );
                continue;
            }
        };
        if info.elevation >= elevation_threshold {
            visible.push(VisibleSatellite { index, tle, info });
        }
    }
    visible
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS_EPOCH_MS: i64 = 1_500_956_694_771;

    fn catalog() -> Vec<[&'static str; 3]> {
        vec![
            [
                "ISS (ZARYA)",
                "1 25544U 98067A   17206.18396726  .00001961  00000-0  36771-4 0  9993",
                "2 25544  51.6400 208.9163 0006317  69.9862  25.2906 15.54225995 67660",
            ],
            [
                "TOO FAST",
                "1 99999U 98067A   17206.18396726  .00001961  00000-0  36771-4 0  9998",
                "2 99999  51.6400 208.9163 0006317  69.9862  25.2906 17.50000000 67661",
            ],
            [
                "GEO 1",
                "1 37481U 11019A   17206.18396726 -.00000009  00000-0  00000+0 0  9992",
                "2 37481   2.3847  40.6385 0001640  70.7486  43.7146  1.00272292 44578",
            ],
        ]
    }

    #[test]
    fn everything_is_above_minus_ninety() {
        let cache = TleCache::new();
        let all = visible_satellites(&cache, &Observer::default(), catalog(), -90.0, ISS_EPOCH_MS);
        // The sub-orbital entry is dropped, order is kept.
        let indices: Vec<_> = all.iter().map(|v| v.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(all[0].tle.satellite_name(), Some("ISS (ZARYA)"));
    }

    #[test]
    fn raising_the_threshold_never_adds_satellites() {
        let cache = TleCache::new();
        let observer = Observer::new(0.0, 65.0, 0.0);
        let mut previous = usize::MAX;
        for threshold in [-90.0, -30.0, 0.0, 30.0, 60.0, 90.1] {
            let visible = visible_satellites(&cache, &observer, catalog(), threshold, ISS_EPOCH_MS);
            assert!(visible.len() <= previous);
            assert!(visible.iter().all(|v| v.info.elevation >= threshold));
            previous = visible.len();
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn unparsable_entries_are_skipped() {
        let cache = TleCache::new();
        let inputs = ["not a tle", "1 25544U\n2 25544\nextra\nlines"];
        assert!(visible_satellites(&cache, &Observer::default(), inputs, -90.0, ISS_EPOCH_MS).is_empty());
    }
}
