use chrono::{DateTime, NaiveDate, Utc};

use crate::decode::{decode, FieldValue};
use crate::error::Result;
use crate::fields::Field;
use crate::parser::{ParsedTle, TleInput};

pub const MS_IN_A_DAY: i64 = 86_400_000;
pub const MS_IN_A_MINUTE: i64 = 60_000;

/// Slices a field's columns out of an already-parsed record and decodes it.
///
/// Lines shorter than the field yield whatever columns exist.
pub fn get_field(tle: &ParsedTle, field: Field) -> FieldValue {
    let def = field.definition();
    let line = &tle.lines[def.line];
    let end = (def.start + def.length).min(line.len());
    let raw = line.get(def.start..end).unwrap_or("");
    decode(raw, def.kind)
}

/// Parses `input` (uncached) and extracts one field.
pub fn get_field_from<'a>(input: impl Into<TleInput<'a>>, field: Field) -> Result<FieldValue> {
    let tle = ParsedTle::parse(input)?;
    Ok(get_field(&tle, field))
}

/// Two-digit TLE years: 57..=99 are 19xx, 00..=56 are 20xx.
pub fn full_year(two_digit: i64) -> i64 {
    if two_digit <= 56 {
        2000 + two_digit
    } else {
        1900 + two_digit
    }
}

impl ParsedTle {
    fn int(&self, field: Field) -> Option<i64> {
        get_field(self, field).as_i64()
    }

    fn float(&self, field: Field) -> f64 {
        get_field(self, field).as_f64()
    }

    fn text(&self, field: Field) -> String {
        match get_field(self, field) {
            FieldValue::Text(text) => text,
            _ => String::new(),
        }
    }

    // ---------- Line 1 ----------

    pub fn line_number1(&self) -> Option<i64> {
        self.int(Field::LineNumber1)
    }

    pub fn catalog_number(&self) -> Option<i64> {
        self.int(Field::SatelliteNumber)
    }

    pub fn classification(&self) -> String {
        self.text(Field::Classification)
    }

    pub fn int_designator_year(&self) -> Option<i64> {
        self.int(Field::IntDesignatorYear)
    }

    pub fn int_designator_launch_number(&self) -> Option<i64> {
        self.int(Field::IntDesignatorLaunchNumber)
    }

    pub fn int_designator_piece_of_launch(&self) -> String {
        self.text(Field::IntDesignatorPieceOfLaunch)
    }

    pub fn epoch_year(&self) -> Option<i64> {
        self.int(Field::EpochYear)
    }

    /// Fractional day of year, 1-based.
    pub fn epoch_day(&self) -> f64 {
        self.float(Field::EpochDay)
    }

    pub fn first_time_derivative(&self) -> f64 {
        self.float(Field::FirstTimeDerivative)
    }

    pub fn second_time_derivative(&self) -> f64 {
        self.float(Field::SecondTimeDerivative)
    }

    pub fn bstar_drag(&self) -> f64 {
        self.float(Field::BstarDrag)
    }

    pub fn orbit_model(&self) -> Option<i64> {
        self.int(Field::OrbitModel)
    }

    pub fn tle_set_number(&self) -> Option<i64> {
        self.int(Field::TleSetNumber)
    }

    pub fn checksum1(&self) -> Option<i64> {
        self.int(Field::Checksum1)
    }

    // ---------- Line 2 ----------

    pub fn line_number2(&self) -> Option<i64> {
        self.int(Field::LineNumber2)
    }

    pub fn catalog_number2(&self) -> Option<i64> {
        self.int(Field::SatelliteNumber2)
    }

    pub fn inclination(&self) -> f64 {
        self.float(Field::Inclination)
    }

    pub fn right_ascension(&self) -> f64 {
        self.float(Field::RightAscension)
    }

    pub fn eccentricity(&self) -> f64 {
        self.float(Field::Eccentricity)
    }

    // argument of perigee, degrees
    pub fn perigee(&self) -> f64 {
        self.float(Field::Perigee)
    }

    pub fn mean_anomaly(&self) -> f64 {
        self.float(Field::MeanAnomaly)
    }

    // revolutions per day
    pub fn mean_motion(&self) -> f64 {
        self.float(Field::MeanMotion)
    }

    pub fn rev_number_at_epoch(&self) -> Option<i64> {
        self.int(Field::RevNumberAtEpoch)
    }

    pub fn checksum2(&self) -> Option<i64> {
        self.int(Field::Checksum2)
    }

    // ---------- Derived ----------

    pub fn satellite_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn satellite_name_or<'a>(&'a self, unknown: &'a str) -> &'a str {
        self.satellite_name().unwrap_or(unknown)
    }

    /// International designator, e.g. `1998-067A`.
    pub fn cospar_id(&self) -> Option<String> {
        let year = full_year(self.int_designator_year()?);
        let launch = self.int_designator_launch_number()?;
        Some(format!(
            "{year}-{launch:03}{}",
            self.int_designator_piece_of_launch()
        ))
    }

    /// Unix milliseconds of the element epoch, floored to the millisecond.
    pub fn epoch_timestamp_ms(&self) -> Option<i64> {
        let year = i32::try_from(full_year(self.epoch_year()?)).ok()?;
        let day = self.epoch_day();
        if !day.is_finite() {
            return None;
        }
        let jan_first = NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)?;
        let jan_first_ms =
            DateTime::<Utc>::from_naive_utc_and_offset(jan_first, Utc).timestamp_millis();
        Some(jan_first_ms + ((day - 1.0) * MS_IN_A_DAY as f64).floor() as i64)
    }

    pub fn epoch_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.epoch_timestamp_ms()?)
    }

    /// Average orbital period from mean motion, truncated to whole
    /// milliseconds. `None` when mean motion is not a positive number.
    pub fn average_orbit_time_ms(&self) -> Option<i64> {
        let mean_motion = self.mean_motion();
        if mean_motion.is_nan() || mean_motion <= 0.0 {
            return None;
        }
        Some((MS_IN_A_DAY as f64 / mean_motion).trunc() as i64)
    }

    pub fn average_orbit_time_mins(&self) -> Option<f64> {
        self.average_orbit_time_ms()
            .map(|ms| ms as f64 / MS_IN_A_MINUTE as f64)
    }

    pub fn average_orbit_time_secs(&self) -> Option<f64> {
        self.average_orbit_time_ms().map(|ms| ms as f64 / 1000.0)
    }
}
