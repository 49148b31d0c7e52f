//! Two-line element set parsing and validation, plus SGP4-backed ground
//! geometry: sub-satellite points, look angles, orbit and ground tracks,
//! and visibility from a ground observer.
//!
//! Geometry functions take an explicit [`TleCache`]; the C ABI in [`ffi`]
//! shares one process-wide instance.

use std::sync::Once;

pub mod antemeridian;
pub mod cache;
pub mod checksum;
pub mod config;
pub mod decode;
pub mod error;
pub mod ffi;
pub mod fields;
pub mod frames;
pub mod getters;
pub mod parser;
pub mod propagation;
pub mod track;
pub mod visibility;

pub use antemeridian::{
    crosses_antemeridian, last_antemeridian_crossing_ms, ANTEMERIDIAN_THRESHOLD_DEG, NO_CROSSING,
};
pub use cache::{CacheSizes, Crossings, TleCache};
pub use checksum::{compute_checksum, is_valid_tle, line_checksum_digit};
pub use config::{ChunkOptions, CoordFormat, Observer, TrackOptions};
pub use decode::FieldValue;
pub use error::{PropagationCause, Result, TleError};
pub use ffi::free_json;
pub use fields::{Field, FieldDef, FieldKind};
pub use getters::{get_field, get_field_from, MS_IN_A_DAY, MS_IN_A_MINUTE};
pub use parser::{ParsedTle, TleInput};
pub use propagation::{
    lat_lng, lng_lat, lng_lat_at_epoch, satellite_info, sgp4_record, LatLng, SatelliteInfo,
    Sgp4Record,
};
pub use track::{
    ground_tracks, ground_tracks_async, orbit_track, orbit_track_async, OrbitSampler, OrbitTrack,
    Sample,
};
pub use visibility::{visible_satellites, VisibleSatellite};

static INIT_LOGGER: Once = Once::new();

#[cfg(target_os = "android")]
pub fn init_logger() {
    use android_logger::Config;
    use log::LevelFilter;
    INIT_LOGGER.call_once(|| {
        android_logger::init_once(
            Config::default()
                .with_max_level(LevelFilter::Debug)
                .with_tag("tletrack"),
        );
    });
}

/// Installs `env_logger` once; `RUST_LOG` overrides the info default.
#[cfg(not(target_os = "android"))]
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::Builder::new()
            .filter_level(log::LevelFilter::Info)
            .parse_default_env()
            .try_init();
    });
}
