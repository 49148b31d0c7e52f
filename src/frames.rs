//! Frame conversions between the SGP4 inertial frame (TEME), Earth-fixed
//! cartesian coordinates and geodetic latitude/longitude/height.

use chrono::{DateTime, Utc};

#[cfg(not(feature = "wgs72"))]
pub const EARTH_RADIUS_KM: f64 = 6378.137; // WGS-84 equatorial
#[cfg(not(feature = "wgs72"))]
pub const EARTH_FLATTENING: f64 = 1.0 / 298.257_223_563; // WGS-84

#[cfg(feature = "wgs72")]
pub const EARTH_RADIUS_KM: f64 = 6378.135; // WGS-72 equatorial
#[cfg(feature = "wgs72")]
pub const EARTH_FLATTENING: f64 = 1.0 / 298.26; // WGS-72

const GEODETIC_ITERATIONS: usize = 20;

/// Geodetic position, radians and kilometres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geodetic {
    pub longitude: f64,
    pub latitude: f64,
    pub height: f64,
}

impl Geodetic {
    pub fn from_degrees(lat_deg: f64, lng_deg: f64, height_km: f64) -> Self {
        Self {
            longitude: lng_deg.to_radians(),
            latitude: lat_deg.to_radians(),
            height: height_km,
        }
    }
}

/// Azimuth and elevation in radians, range in kilometres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngles {
    pub azimuth: f64,
    pub elevation: f64,
    pub range_km: f64,
}

/// Greenwich sidereal time in radians.
pub fn sidereal_time(t: DateTime<Utc>) -> f64 {
    sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&t.naive_utc()))
}

pub fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

fn eccentricity_squared() -> f64 {
    EARTH_FLATTENING * (2.0 - EARTH_FLATTENING)
}

/// Rotates an inertial position into the Earth-fixed frame.
pub fn eci_to_ecf(eci: [f64; 3], gmst: f64) -> [f64; 3] {
    let (st, ct) = gmst.sin_cos();
    [
        ct * eci[0] + st * eci[1],
        -st * eci[0] + ct * eci[1],
        eci[2],
    ]
}

/// Inertial position to geodetic coordinates, longitude in [-pi, pi].
pub fn eci_to_geodetic(eci: [f64; 3], gmst: f64) -> Geodetic {
    let a = EARTH_RADIUS_KM;
    let e2 = eccentricity_squared();
    let r = (eci[0] * eci[0] + eci[1] * eci[1]).sqrt();

    let longitude = wrap_pi(eci[1].atan2(eci[0]) - gmst);

    let mut latitude = eci[2].atan2(r);
    let mut c = 1.0;
    for _ in 0..GEODETIC_ITERATIONS {
        let sin_lat = latitude.sin();
        c = 1.0 / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        latitude = (eci[2] + a * c * e2 * sin_lat).atan2(r);
    }
    let height = r / latitude.cos() - a * c;

    Geodetic {
        longitude,
        latitude,
        height,
    }
}

pub fn geodetic_to_ecf(gd: Geodetic) -> [f64; 3] {
    let a = EARTH_RADIUS_KM;
    let e2 = eccentricity_squared();

    let (sin_lat, cos_lat) = gd.latitude.sin_cos();
    let (sin_lon, cos_lon) = gd.longitude.sin_cos();
    let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();

    [
        (n + gd.height) * cos_lat * cos_lon,
        (n + gd.height) * cos_lat * sin_lon,
        (n * (1.0 - e2) + gd.height) * sin_lat,
    ]
}

/// Look angles of an Earth-fixed target from a geodetic observer, using
/// the south-east-zenith topocentric frame.
pub fn ecf_to_look_angles(observer: Geodetic, target_ecf: [f64; 3]) -> LookAngles {
    let obs = geodetic_to_ecf(observer);
    let (rx, ry, rz) = (
        target_ecf[0] - obs[0],
        target_ecf[1] - obs[1],
        target_ecf[2] - obs[2],
    );

    let (sin_lat, cos_lat) = observer.latitude.sin_cos();
    let (sin_lon, cos_lon) = observer.longitude.sin_cos();

    let south = sin_lat * cos_lon * rx + sin_lat * sin_lon * ry - cos_lat * rz;
    let east = -sin_lon * rx + cos_lon * ry;
    let zenith = cos_lat * cos_lon * rx + cos_lat * sin_lon * ry + sin_lat * rz;

    let range_km = (south * south + east * east + zenith * zenith).sqrt();
    let elevation = if range_km > 0.0 {
        (zenith / range_km).clamp(-1.0, 1.0).asin()
    } else {
        std::f64::consts::FRAC_PI_2
    };
    let azimuth = (-east).atan2(south) + std::f64::consts::PI;

    LookAngles {
        azimuth,
        elevation,
        range_km,
    }
}

/// Longitude in degrees, [-180, 180].
pub fn degrees_long(radians: f64) -> f64 {
    let deg = radians.to_degrees();
    if deg > 180.0 || deg < -180.0 {
        (deg + 180.0).rem_euclid(360.0) - 180.0
    } else {
        deg
    }
}

/// Latitude in degrees, clamped to [-90, 90].
pub fn degrees_lat(radians: f64) -> f64 {
    radians.to_degrees().clamp(-90.0, 90.0)
}

fn wrap_pi(mut x: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    while x < -PI {
        x += TAU;
    }
    while x > PI {
        x -= TAU;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn geodetic_round_trip_through_ecf() {
        let gd = Geodetic::from_degrees(36.9613422, -122.0308, 0.37);
        let ecf = geodetic_to_ecf(gd);
        // With zero sidereal angle the inertial and fixed frames coincide.
        let back = eci_to_geodetic(ecf, 0.0);
        assert_relative_eq!(back.latitude, gd.latitude, epsilon = 1e-9);
        assert_relative_eq!(back.longitude, gd.longitude, epsilon = 1e-9);
        assert_relative_eq!(back.height, gd.height, epsilon = 1e-6);
    }

    #[test]
    fn eci_to_ecf_rotates_about_z() {
        let ecf = eci_to_ecf([7000.0, 0.0, 100.0], std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(ecf[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(ecf[1], -7000.0, epsilon = 1e-9);
        assert_eq!(ecf[2], 100.0);
    }

    #[test]
    fn target_overhead_has_ninety_degree_elevation() {
        let observer = Geodetic::from_degrees(10.0, 20.0, 0.0);
        let overhead = geodetic_to_ecf(Geodetic { height: 500.0, ..observer });
        let look = ecf_to_look_angles(observer, overhead);
        assert_relative_eq!(look.elevation.to_degrees(), 90.0, epsilon = 1e-6);
        assert_relative_eq!(look.range_km, 500.0, epsilon = 1e-6);
    }

    #[test]
    fn target_due_north_has_zero_azimuth() {
        let observer = Geodetic::from_degrees(0.0, 0.0, 0.0);
        let north = geodetic_to_ecf(Geodetic::from_degrees(5.0, 0.0, 400.0));
        let look = ecf_to_look_angles(observer, north);
        let az = look.azimuth.to_degrees().rem_euclid(360.0);
        assert!(az < 1e-6 || az > 360.0 - 1e-6, "azimuth {az}");
        assert!(look.elevation > 0.0);
    }

    #[test]
    fn longitude_normalization() {
        assert_relative_eq!(degrees_long(std::f64::consts::PI * 1.5), -90.0, epsilon = 1e-9);
        assert_relative_eq!(degrees_long(-0.5), -0.5f64.to_degrees());
        assert_eq!(degrees_lat(2.0), 90.0);
    }
}
