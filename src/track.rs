//! Orbit tracks (one revolution between antemeridian crossings) and ground
//! tracks (previous, current and next revolution).

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::antemeridian::{crosses_antemeridian, last_antemeridian_crossing_ms, NO_CROSSING};
use crate::cache::{TleCache, TrackKey};
use crate::config::{ChunkOptions, CoordFormat, TrackOptions};
use crate::error::{Result, TleError};
use crate::getters::{MS_IN_A_DAY, MS_IN_A_MINUTE};
use crate::parser::{ParsedTle, TleInput};
use crate::propagation::{lat_lng, LatLng};

/// Points of one revolution, ordered per [`CoordFormat`].
pub type OrbitTrack = Vec<[f64; 2]>;

pub const DEFAULT_MAX_TIME_MS: i64 = 6_000_000;

/// One position along a track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time_ms: i64,
    pub lng: f64,
    pub lat: f64,
}

/// Lazily samples a ground track forward from a start time.
///
/// Ends before the first sample on the far side of the antemeridian, or once
/// more than `max_time_ms` has elapsed. A propagation error is yielded once
/// and ends the sequence. Dropping the sampler is the only way to stop it
/// early.
#[derive(Debug, Clone)]
pub struct OrbitSampler<'c> {
    cache: &'c TleCache,
    tle: Arc<ParsedTle>,
    start_ms: i64,
    step_ms: i64,
    max_time_ms: i64,
    cur_ms: i64,
    last_lng: Option<f64>,
    done: bool,
}

impl<'c> OrbitSampler<'c> {
    pub fn new(cache: &'c TleCache, tle: Arc<ParsedTle>, options: &TrackOptions) -> Result<Self> {
        validate(options)?;
        Ok(Self {
            cache,
            tle,
            start_ms: options.start_time_ms,
            step_ms: options.step_ms,
            max_time_ms: options.max_time_ms,
            cur_ms: options.start_time_ms,
            last_lng: None,
            done: false,
        })
    }

    /// Rewinds to the start time.
    pub fn restart(&mut self) {
        self.cur_ms = self.start_ms;
        self.last_lng = None;
        self.done = false;
    }
}

impl Iterator for OrbitSampler<'_> {
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.cur_ms - self.start_ms > self.max_time_ms {
            self.done = true;
            return None;
        }

        let LatLng { lat, lng } = match lat_lng(self.cache, &self.tle, self.cur_ms) {
            Ok(point) => point,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        if crosses_antemeridian(self.last_lng, lng) {
            self.done = true;
            return None;
        }

        let sample = Sample {
            time_ms: self.cur_ms,
            lng,
            lat,
        };
        self.last_lng = Some(lng);
        self.cur_ms += self.step_ms;
        Some(Ok(sample))
    }
}

fn validate(options: &TrackOptions) -> Result<()> {
    if options.step_ms <= 0 {
        return Err(TleError::InvalidOption(format!(
            "step_ms must be positive, got {}",
            options.step_ms
        )));
    }
    if options.max_time_ms <= 0 {
        return Err(TleError::InvalidOption(format!(
            "max_time_ms must be positive, got {}",
            options.max_time_ms
        )));
    }
    Ok(())
}

fn track_key(tle: &ParsedTle, options: &TrackOptions) -> TrackKey {
    let start_s = (options.start_time_ms as f64 / 1000.0).round() as i64;
    TrackKey::new(
        tle,
        start_s,
        options.step_ms,
        options.max_time_ms,
        options.format,
    )
}

/// Samples one revolution starting at `options.start_time_ms`.
///
/// Cached per TLE, start second, step, ceiling and coordinate order.
pub fn orbit_track<'a>(
    cache: &TleCache,
    input: impl Into<TleInput<'a>>,
    options: &TrackOptions,
) -> Result<OrbitTrack> {
    let tle = cache.parse(input)?;
    let key = track_key(&tle, options);
    if let Some(track) = cache.orbit_track(&key) {
        return Ok(track);
    }

    let track = OrbitSampler::new(cache, Arc::clone(&tle), options)?
        .map(|sample| sample.map(|s| options.format.point(s.lng, s.lat)))
        .collect::<Result<OrbitTrack>>()?;
    debug!(
        "[orbit_track] {:?}: {} points from {}",
        tle.catalog_number(),
        track.len(),
        options.start_time_ms
    );
    cache.store_orbit_track(key, track.clone());
    Ok(track)
}

async fn pause(sleep_ms: u64) {
    if sleep_ms > 0 {
        tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
    } else {
        tokio::task::yield_now().await;
    }
}

/// Same output as [`orbit_track`], yielding to the scheduler every
/// `chunk.job_chunk_size` samples.
pub async fn orbit_track_async<'a>(
    cache: &TleCache,
    input: impl Into<TleInput<'a>>,
    options: &TrackOptions,
    chunk: &ChunkOptions,
) -> Result<OrbitTrack> {
    let tle = cache.parse(input)?;
    let key = track_key(&tle, options);
    if let Some(track) = cache.orbit_track(&key) {
        return Ok(track);
    }

    let chunk_size = chunk.job_chunk_size.max(1);
    let mut track = OrbitTrack::new();
    for (index, sample) in OrbitSampler::new(cache, Arc::clone(&tle), options)?.enumerate() {
        let sample = sample?;
        track.push(options.format.point(sample.lng, sample.lat));
        if (index + 1) % chunk_size == 0 {
            pause(chunk.sleep_ms).await;
        }
    }
    cache.store_orbit_track(key, track.clone());
    Ok(track)
}

/// Start times of the tracks making up a ground track.
fn plan_ground_tracks(
    cache: &TleCache,
    tle: &Arc<ParsedTle>,
    start_ms: i64,
    step_ms: i64,
    format: CoordFormat,
) -> Result<Vec<TrackOptions>> {
    let partial = || {
        vec![TrackOptions {
            start_time_ms: start_ms,
            step_ms: MS_IN_A_MINUTE,
            max_time_ms: MS_IN_A_DAY / 4,
            format,
        }]
    };

    let cur_orbit_ms = last_antemeridian_crossing_ms(cache, tle, start_ms)?;
    if cur_orbit_ms == NO_CROSSING {
        info!(
            "[ground_tracks] {:?} never crosses the antemeridian, returning a partial track",
            tle.catalog_number()
        );
        return Ok(partial());
    }

    let orbit_ms = tle.average_orbit_time_ms().unwrap_or(0);
    let buffer_ms = orbit_ms / 5;
    let last_orbit_ms = last_antemeridian_crossing_ms(cache, tle, cur_orbit_ms - buffer_ms)?;
    let next_orbit_ms =
        last_antemeridian_crossing_ms(cache, tle, cur_orbit_ms + orbit_ms + buffer_ms)?;
    if last_orbit_ms == NO_CROSSING || next_orbit_ms == NO_CROSSING {
        return Ok(partial());
    }

    Ok([last_orbit_ms, cur_orbit_ms, next_orbit_ms]
        .into_iter()
        .map(|start_time_ms| TrackOptions {
            start_time_ms,
            step_ms,
            max_time_ms: DEFAULT_MAX_TIME_MS,
            format,
        })
        .collect())
}

/// Previous, current and next revolution around `start_ms`, each running
/// from one antemeridian crossing to the next. Orbits that never cross get
/// a single quarter-day track at 1 minute resolution instead.
pub fn ground_tracks<'a>(
    cache: &TleCache,
    input: impl Into<TleInput<'a>>,
    start_ms: i64,
    step_ms: i64,
    format: CoordFormat,
) -> Result<Vec<OrbitTrack>> {
    let tle = cache.parse(input)?;
    let key = TrackKey::new(&tle, start_ms, step_ms, 0, format);
    if let Some(tracks) = cache.ground_tracks(&key) {
        return Ok(tracks);
    }

    let tracks = plan_ground_tracks(cache, &tle, start_ms, step_ms, format)?
        .iter()
        .map(|options| orbit_track(cache, &tle, options))
        .collect::<Result<Vec<_>>>()?;
    cache.store_ground_tracks(key, tracks.clone());
    Ok(tracks)
}

/// [`ground_tracks`] with the three revolutions sampled concurrently.
pub async fn ground_tracks_async<'a>(
    cache: &TleCache,
    input: impl Into<TleInput<'a>>,
    start_ms: i64,
    step_ms: i64,
    format: CoordFormat,
    chunk: &ChunkOptions,
) -> Result<Vec<OrbitTrack>> {
    let tle = cache.parse(input)?;
    let key = TrackKey::new(&tle, start_ms, step_ms, 0, format);
    if let Some(tracks) = cache.ground_tracks(&key) {
        return Ok(tracks);
    }

    let plan = plan_ground_tracks(cache, &tle, start_ms, step_ms, format)?;
    let tracks = match plan.as_slice() {
        [last, cur, next] => {
            let (last, cur, next) = tokio::join!(
                orbit_track_async(cache, &tle, last, chunk),
                orbit_track_async(cache, &tle, cur, chunk),
                orbit_track_async(cache, &tle, next, chunk),
            );
            vec![last?, cur?, next?]
        }
        _ => {
            let mut tracks = Vec::with_capacity(plan.len());
            for options in &plan {
                tracks.push(orbit_track_async(cache, &tle, options, chunk).await?);
            }
            tracks
        }
    };
    cache.store_ground_tracks(key, tracks.clone());
    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS: [&str; 2] = [
        "1 25544U 98067A   17206.18396726  .00001961  00000-0  36771-4 0  9993",
        "2 25544  51.6400 208.9163 0006317  69.9862  25.2906 15.54225995 67660",
    ];
    const ISS_EPOCH_MS: i64 = 1_500_956_694_771;

    #[test]
    fn sampler_respects_ceiling() {
        let cache = TleCache::new();
        let tle = cache.parse(ISS).unwrap();
        let options = TrackOptions {
            start_time_ms: ISS_EPOCH_MS,
            step_ms: 1000,
            max_time_ms: 10_000,
            format: CoordFormat::LngLat,
        };
        let samples: Vec<_> = OrbitSampler::new(&cache, tle, &options)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        // 0..=10 s inclusive, unless a crossing happens in the first 10 s.
        assert!(samples.len() <= 11);
        assert!(samples.windows(2).all(|w| w[1].time_ms - w[0].time_ms == 1000));
    }

    #[test]
    fn sampler_restarts_from_the_beginning() {
        let cache = TleCache::new();
        let tle = cache.parse(ISS).unwrap();
        let options = TrackOptions {
            start_time_ms: ISS_EPOCH_MS,
            step_ms: 60_000,
            max_time_ms: 600_000,
            format: CoordFormat::LngLat,
        };
        let mut sampler = OrbitSampler::new(&cache, tle, &options).unwrap();
        let first: Vec<_> = sampler.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(sampler.next().map(|s| s.is_ok()), None);
        sampler.restart();
        let second: Vec<_> = sampler.collect::<Result<_>>().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn non_positive_step_is_rejected() {
        let cache = TleCache::new();
        let options = TrackOptions {
            step_ms: 0,
            ..TrackOptions::starting_at(ISS_EPOCH_MS)
        };
        assert!(matches!(
            orbit_track(&cache, ISS, &options),
            Err(TleError::InvalidOption(_))
        ));
    }

    #[test]
    fn lat_lng_format_swaps_points() {
        let cache = TleCache::new();
        let base = TrackOptions {
            start_time_ms: ISS_EPOCH_MS,
            step_ms: 60_000,
            max_time_ms: 300_000,
            format: CoordFormat::LngLat,
        };
        let lng_lat = orbit_track(&cache, ISS, &base).unwrap();
        let lat_lng = orbit_track(
            &cache,
            ISS,
            &TrackOptions {
                format: CoordFormat::LatLng,
                ..base
            },
        )
        .unwrap();
        assert_eq!(lng_lat.len(), lat_lng.len());
        for (a, b) in lng_lat.iter().zip(&lat_lng) {
            assert_eq!([a[1], a[0]], *b);
        }
        assert_eq!(cache.sizes().orbit_tracks, 2);
    }

    #[tokio::test]
    async fn chunked_track_matches_blocking_track() {
        let options = TrackOptions {
            start_time_ms: ISS_EPOCH_MS,
            step_ms: 20_000,
            ..TrackOptions::starting_at(ISS_EPOCH_MS)
        };
        let chunk = ChunkOptions {
            job_chunk_size: 7,
            sleep_ms: 1,
        };
        let blocking = orbit_track(&TleCache::new(), ISS, &options).unwrap();
        let chunked = orbit_track_async(&TleCache::new(), ISS, &options, &chunk)
            .await
            .unwrap();
        assert!(!blocking.is_empty());
        assert_eq!(blocking, chunked);
    }

    #[test]
    fn geosynchronous_ground_track_is_one_partial_track() {
        let cache = TleCache::new();
        let geo = [
            "1 37481U 11019A   23190.45078927 -.00000009  00000-0  00000+0 0  9991",
            "2 37481   2.3847  40.6385 0001640  70.7486  43.7146  1.00272292 44578",
        ];
        let start_ms = 1_688_899_748_192;
        let tracks = ground_tracks(&cache, geo, start_ms, 1000, CoordFormat::LngLat).unwrap();
        assert_eq!(tracks.len(), 1);
        // Quarter day at one point per minute.
        assert_eq!(tracks[0].len(), 361);
        assert_eq!(cache.sizes().ground_tracks, 1);
    }
}
