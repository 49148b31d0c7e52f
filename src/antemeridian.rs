//! Search for the most recent time a ground track crossed ±180° longitude.

use log::{debug, warn};

use crate::cache::{Crossings, TleCache};
use crate::error::Result;
use crate::parser::TleInput;
use crate::propagation::lng_lat;

/// Two consecutive longitudes only count as an antemeridian crossing when
/// one of them is farther than this from the prime meridian.
pub const ANTEMERIDIAN_THRESHOLD_DEG: f64 = 100.0;

/// Returned when no crossing was found within the iteration budget, e.g.
/// for geosynchronous orbits.
pub const NO_CROSSING: i64 = -1;

const INITIAL_STEP_MS: i64 = 3 * 60_000;
const MIN_STEP_MS: i64 = 500;
const MAX_ITERATIONS: usize = 1000;

/// True when moving from `previous` to `current` longitude (degrees) passes
/// through the antemeridian rather than the prime meridian.
pub fn crosses_antemeridian(previous: Option<f64>, current: f64) -> bool {
    let Some(previous) = previous else {
        return false;
    };
    if previous == 0.0 || current == 0.0 || previous.is_nan() || current.is_nan() {
        return false;
    }
    let opposite_signs = (previous > 0.0) != (current > 0.0);
    opposite_signs
        && (previous.abs() > ANTEMERIDIAN_THRESHOLD_DEG
            || current.abs() > ANTEMERIDIAN_THRESHOLD_DEG)
}

/// Unix milliseconds of the last antemeridian crossing at or before
/// `reference_ms`, located to within half a second, or [`NO_CROSSING`].
///
/// Walks backwards in 3 minute steps until the longitude flips across
/// ±180°, then bisects. Found crossings are remembered per TLE and reused
/// for any later reference time less than one orbit after them; a TLE that
/// never crosses is remembered as such and not searched again.
pub fn last_antemeridian_crossing_ms<'a>(
    cache: &TleCache,
    input: impl Into<TleInput<'a>>,
    reference_ms: i64,
) -> Result<i64> {
    let tle = cache.parse(input)?;
    let orbit_ms = tle.average_orbit_time_ms().unwrap_or(0);

    match cache.crossings(&tle) {
        Some(Crossings::Never) => return Ok(NO_CROSSING),
        Some(Crossings::Found(times)) => {
            let recent = times.into_iter().find(|&t| {
                let since = reference_ms - t;
                since > 0 && since < orbit_ms
            });
            if let Some(t) = recent {
                return Ok(t);
            }
        }
        None => {}
    }

    let found = search_crossing(reference_ms, MAX_ITERATIONS, |t| {
        lng_lat(cache, &tle, t).map(|[lng, _]| lng)
    })?;
    match found {
        Some(t) => debug!(
            "[last_antemeridian_crossing_ms] {:?} crossed at {}",
            tle.catalog_number(),
            t
        ),
        None => warn!(
            "[last_antemeridian_crossing_ms] no crossing for {:?} within {} steps",
            tle.catalog_number(),
            MAX_ITERATIONS
        ),
    }
    cache.record_crossing(&tle, found);
    Ok(found.unwrap_or(NO_CROSSING))
}

/// Backward step then bisection over `longitude_at`. Running out of
/// iterations after a crossing has been bracketed still yields the best
/// estimate so far; `None` means no crossing was seen at all.
fn search_crossing(
    reference_ms: i64,
    max_iterations: usize,
    mut longitude_at: impl FnMut(i64) -> Result<f64>,
) -> Result<Option<i64>> {
    let mut step_ms = INITIAL_STEP_MS;
    let mut cur_ms = reference_ms;
    let mut last_lng = None;
    let mut found = false;

    for _ in 0..max_iterations {
        if step_ms < MIN_STEP_MS {
            break;
        }
        let lng = longitude_at(cur_ms)?;
        if crosses_antemeridian(last_lng, lng) {
            // Overshot: go back to the last sample on this side and refine.
            found = true;
            cur_ms += step_ms;
            step_ms /= 2;
        } else {
            cur_ms -= step_ms;
            last_lng = Some(lng);
        }
    }

    Ok(found.then_some(cur_ms))
}
