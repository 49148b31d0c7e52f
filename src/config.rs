use chrono::Utc;
use serde::{Deserialize, Serialize};

// Geodetic degrees, height in km
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Observer {
    pub lat: f64,
    pub lng: f64,
    pub height_km: f64,
}

impl Observer {
    pub fn new(lat: f64, lng: f64, height_km: f64) -> Self {
        Self { lat, lng, height_km }
    }
}

impl Default for Observer {
    fn default() -> Self {
        Self {
            lat: 36.9613422,
            lng: -122.0308,
            height_km: 0.37,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CoordFormat {
    // GeoJSON order
    #[default]
    LngLat,
    LatLng,
}

impl CoordFormat {
    pub fn point(self, lng: f64, lat: f64) -> [f64; 2] {
        match self {
            CoordFormat::LngLat => [lng, lat],
            CoordFormat::LatLng => [lat, lng],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackOptions {
    pub start_time_ms: i64, // unix ms
    pub step_ms: i64,
    /// Sampling stops once this much time has elapsed without a crossing.
    pub max_time_ms: i64,
    pub format: CoordFormat,
}

impl TrackOptions {
    pub fn starting_at(start_time_ms: i64) -> Self {
        Self {
            start_time_ms,
            ..Self::default()
        }
    }
}

impl Default for TrackOptions {
    fn default() -> Self {
        Self {
            start_time_ms: Utc::now().timestamp_millis(),
            step_ms: 1000,
            max_time_ms: 6_000_000,
            format: CoordFormat::LngLat,
        }
    }
}

/// Cooperative scheduling knobs for the async track builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkOptions {
    pub job_chunk_size: usize,
    /// Pause at each yield; 0 just yields to the scheduler.
    pub sleep_ms: u64,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            job_chunk_size: 1000,
            sleep_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let observer = Observer::default();
        assert_eq!(observer.lat, 36.9613422);
        assert_eq!(observer.height_km, 0.37);

        let track = TrackOptions::starting_at(42);
        assert_eq!(track.start_time_ms, 42);
        assert_eq!(track.step_ms, 1000);
        assert_eq!(track.max_time_ms, 6_000_000);
        assert_eq!(track.format, CoordFormat::LngLat);

        assert_eq!(ChunkOptions::default().job_chunk_size, 1000);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let options: TrackOptions =
            serde_json::from_str(r#"{"start_time_ms": 1000, "format": "LatLng"}"#).unwrap();
        assert_eq!(options.step_ms, 1000);
        assert_eq!(options.format, CoordFormat::LatLng);
        assert_eq!(options.format.point(1.0, 2.0), [2.0, 1.0]);
    }
}
