//! SGP4 propagation and observer-relative geometry.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sgp4::{Classification, Constants, Elements, MinutesSinceEpoch};

use crate::cache::{InfoKey, TleCache};
use crate::config::Observer;
use crate::error::{PropagationCause, Result, TleError};
use crate::frames::{
    degrees_lat, degrees_long, ecf_to_look_angles, eci_to_ecf, eci_to_geodetic, norm,
    sidereal_time, Geodetic,
};
use crate::getters::full_year;
use crate::parser::{ParsedTle, TleInput};

// SGP4 is fitted to WGS-72; these constants only judge whether elements
// describe an orbit at all, independent of the geodetic figure in `frames`.
const SGP4_EARTH_RADIUS_KM: f64 = 6378.135;
const SGP4_MU_KM3_S2: f64 = 398_600.8;

/// Position of a satellite as seen from a ground observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SatelliteInfo {
    /// Sub-satellite longitude, degrees.
    pub lng: f64,
    /// Sub-satellite latitude, degrees.
    pub lat: f64,
    /// Degrees above the observer's horizon.
    pub elevation: f64,
    /// Degrees clockwise from north.
    pub azimuth: f64,
    /// Slant range from the observer, km.
    pub range: f64,
    /// Height above the ellipsoid, km.
    pub height: f64,
    /// Inertial speed, km/s.
    pub velocity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Inertial (TEME) state, km and km/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub position: [f64; 3],
    pub velocity: [f64; 3],
}

/// Initialized SGP4 model for one element set.
#[derive(Debug)]
pub struct Sgp4Record {
    elements: Elements,
    constants: Constants,
}

impl Sgp4Record {
    /// Builds the model from the record's decoded fields. Checksums and line
    /// markers are not looked at; only the orbit itself can be rejected.
    pub fn from_tle(tle: &ParsedTle) -> std::result::Result<Self, PropagationCause> {
        Self::from_elements(elements_of(tle)?)
    }

    pub fn from_elements(elements: Elements) -> std::result::Result<Self, PropagationCause> {
        let bound = elements.mean_motion > 0.0 && (0.0..1.0).contains(&elements.eccentricity);
        if bound && perigee_radius_km(elements.mean_motion, elements.eccentricity) < SGP4_EARTH_RADIUS_KM
        {
            return Err(PropagationCause::SubOrbital);
        }

        let constants = Constants::from_elements(&elements)?;
        Ok(Self {
            elements,
            constants,
        })
    }

    pub fn elements(&self) -> &Elements {
        &self.elements
    }

    pub fn propagate(&self, at: DateTime<Utc>) -> std::result::Result<StateVector, PropagationCause> {
        let elapsed = at.naive_utc() - self.elements.datetime;
        let minutes = elapsed.num_milliseconds() as f64 / 60_000.0;
        let prediction = self.constants.propagate(MinutesSinceEpoch(minutes))?;

        if norm(prediction.position) < SGP4_EARTH_RADIUS_KM {
            return Err(PropagationCause::Decayed);
        }
        Ok(StateVector {
            position: prediction.position,
            velocity: prediction.velocity,
        })
    }
}

/// Perigee distance from the centre of the Earth implied by Kepler's third
/// law for `mean_motion` revolutions per day.
fn perigee_radius_km(mean_motion: f64, eccentricity: f64) -> f64 {
    let n = mean_motion * std::f64::consts::TAU / 86_400.0;
    let semi_major_axis = (SGP4_MU_KM3_S2 / (n * n)).cbrt();
    semi_major_axis * (1.0 - eccentricity)
}

fn epoch_of(tle: &ParsedTle) -> Option<NaiveDateTime> {
    let year = i32::try_from(full_year(tle.epoch_year()?)).ok()?;
    let day = tle.epoch_day();
    if !day.is_finite() || day < 1.0 {
        return None;
    }
    let seconds = day.fract() * 86_400.0;
    let mut nanos = (seconds.fract() * 1e9).round() as u32;
    let mut whole = seconds as u32;
    if nanos >= 1_000_000_000 {
        nanos -= 1_000_000_000;
        whole += 1;
    }
    let date = NaiveDate::from_yo_opt(year, day as u32)?;
    Some(date.and_time(NaiveTime::from_num_seconds_from_midnight_opt(whole, nanos)?))
}

/// `sgp4` elements from the decoded TLE fields.
pub fn elements_of(tle: &ParsedTle) -> std::result::Result<Elements, PropagationCause> {
    let datetime =
        epoch_of(tle).ok_or_else(|| PropagationCause::Unknown("unreadable epoch".to_string()))?;
    let elements = Elements {
        object_name: tle.name.clone(),
        international_designator: tle.cospar_id(),
        norad_id: tle
            .catalog_number()
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0),
        classification: match tle.classification().as_str() {
            "C" => Classification::Classified,
            "S" => Classification::Secret,
            _ => Classification::Unclassified,
        },
        datetime,
        mean_motion_dot: tle.first_time_derivative(),
        mean_motion_ddot: tle.second_time_derivative(),
        drag_term: tle.bstar_drag(),
        element_set_number: tle
            .tle_set_number()
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0),
        inclination: tle.inclination(),
        right_ascension: tle.right_ascension(),
        eccentricity: tle.eccentricity(),
        argument_of_perigee: tle.perigee(),
        mean_anomaly: tle.mean_anomaly(),
        mean_motion: tle.mean_motion(),
        revolution_number: tle
            .rev_number_at_epoch()
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0),
        ephemeris_type: tle
            .orbit_model()
            .and_then(|n| u8::try_from(n).ok())
            .unwrap_or(0),
    };

    let required = [
        elements.drag_term,
        elements.inclination,
        elements.right_ascension,
        elements.eccentricity,
        elements.argument_of_perigee,
        elements.mean_anomaly,
        elements.mean_motion,
    ];
    if required.iter().any(|v| !v.is_finite()) {
        return Err(PropagationCause::Unknown(
            "unreadable orbital elements".to_string(),
        ));
    }
    Ok(elements)
}

/// Cached SGP4 record for `tle`; construction failures are cached too.
pub fn sgp4_record(cache: &TleCache, tle: &ParsedTle) -> Result<Arc<Sgp4Record>> {
    if let Some(record) = cache.record(tle) {
        return record.map_err(TleError::from);
    }
    let record = Sgp4Record::from_tle(tle).map(Arc::new);
    match &record {
        Ok(_) => debug!("[sgp4_record] initialized {:?}", tle.catalog_number()),
        Err(cause) => warn!(
            "[sgp4_record] rejected {:?} ({}): {}",
            tle.catalog_number(),
            tle.satellite_name_or("unnamed"),
            cause
        ),
    }
    cache.store_record(tle, record.clone());
    record.map_err(TleError::from)
}

pub(crate) fn instant(timestamp_ms: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms).ok_or(TleError::InvalidTimestamp(timestamp_ms))
}

/// Propagates `input` to `timestamp_ms` and describes the satellite as seen
/// from `observer`. Results are cached per TLE, instant and observer.
pub fn satellite_info<'a>(
    cache: &TleCache,
    input: impl Into<TleInput<'a>>,
    timestamp_ms: i64,
    observer: &Observer,
) -> Result<SatelliteInfo> {
    let tle = cache.parse(input)?;
    let key = InfoKey::new(&tle, timestamp_ms, observer);
    if let Some(info) = cache.satellite_info(&key) {
        return Ok(info);
    }

    let record = sgp4_record(cache, &tle)?;
    let at = instant(timestamp_ms)?;
    let state = record.propagate(at)?;

    let gmst = sidereal_time(at);
    let position_ecf = eci_to_ecf(state.position, gmst);
    let position_gd = eci_to_geodetic(state.position, gmst);
    let observer_gd = Geodetic::from_degrees(observer.lat, observer.lng, observer.height_km);
    let look = ecf_to_look_angles(observer_gd, position_ecf);

    let info = SatelliteInfo {
        lng: degrees_long(position_gd.longitude),
        lat: degrees_lat(position_gd.latitude),
        elevation: look.elevation.to_degrees(),
        azimuth: look.azimuth.to_degrees(),
        range: look.range_km,
        height: position_gd.height,
        velocity: norm(state.velocity),
    };
    cache.store_satellite_info(key, info);
    Ok(info)
}

/// Sub-satellite point at `timestamp_ms`.
pub fn lat_lng<'a>(
    cache: &TleCache,
    input: impl Into<TleInput<'a>>,
    timestamp_ms: i64,
) -> Result<LatLng> {
    let info = satellite_info(cache, input, timestamp_ms, &Observer::default())?;
    Ok(LatLng {
        lat: info.lat,
        lng: info.lng,
    })
}

/// Sub-satellite point as `[lng, lat]`.
pub fn lng_lat<'a>(
    cache: &TleCache,
    input: impl Into<TleInput<'a>>,
    timestamp_ms: i64,
) -> Result<[f64; 2]> {
    let LatLng { lat, lng } = lat_lng(cache, input, timestamp_ms)?;
    Ok([lng, lat])
}

/// Sub-satellite point at the TLE's own epoch, as `[lng, lat]`.
pub fn lng_lat_at_epoch<'a>(cache: &TleCache, input: impl Into<TleInput<'a>>) -> Result<[f64; 2]> {
    let tle = cache.parse(input)?;
    let epoch_ms = tle
        .epoch_timestamp_ms()
        .ok_or_else(|| TleError::Format("unreadable epoch".to_string()))?;
    lng_lat(cache, &tle, epoch_ms)
}
