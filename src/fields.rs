//! Fixed-column layout of the two TLE data lines.
//!
//! Offsets are 0-based character positions into a trimmed line, lengths in
//! characters. The layout follows the NORAD/CelesTrak distribution format.

use serde::Serialize;

/// How the raw column text of a field is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    Int,
    Float,
    Char,
    /// Digits with an implied leading `0.` (eccentricity).
    DecimalAssumed,
    /// Implied-decimal mantissa followed by a signed exponent digit (`36771-4`).
    DecimalAssumedE,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    /// 0 for line 1, 1 for line 2.
    pub line: usize,
    pub start: usize,
    pub length: usize,
    pub kind: FieldKind,
}

impl FieldDef {
    const fn new(line: usize, start: usize, length: usize, kind: FieldKind) -> Self {
        Self { line, start, length, kind }
    }
}

/// Every element stored verbatim in a TLE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    LineNumber1,
    SatelliteNumber,
    Classification,
    IntDesignatorYear,
    IntDesignatorLaunchNumber,
    IntDesignatorPieceOfLaunch,
    EpochYear,
    EpochDay,
    FirstTimeDerivative,
    SecondTimeDerivative,
    BstarDrag,
    OrbitModel,
    TleSetNumber,
    Checksum1,

    LineNumber2,
    SatelliteNumber2,
    Inclination,
    RightAscension,
    Eccentricity,
    Perigee,
    MeanAnomaly,
    MeanMotion,
    RevNumberAtEpoch,
    Checksum2,
}

pub const LINE1_FIELDS: [Field; 14] = [
    Field::LineNumber1,
    Field::SatelliteNumber,
    Field::Classification,
    Field::IntDesignatorYear,
    Field::IntDesignatorLaunchNumber,
    Field::IntDesignatorPieceOfLaunch,
    Field::EpochYear,
    Field::EpochDay,
    Field::FirstTimeDerivative,
    Field::SecondTimeDerivative,
    Field::BstarDrag,
    Field::OrbitModel,
    Field::TleSetNumber,
    Field::Checksum1,
];

pub const LINE2_FIELDS: [Field; 10] = [
    Field::LineNumber2,
    Field::SatelliteNumber2,
    Field::Inclination,
    Field::RightAscension,
    Field::Eccentricity,
    Field::Perigee,
    Field::MeanAnomaly,
    Field::MeanMotion,
    Field::RevNumberAtEpoch,
    Field::Checksum2,
];

impl Field {
    pub const fn definition(self) -> FieldDef {
        use FieldKind::*;
        match self {
            Field::LineNumber1 => FieldDef::new(0, 0, 1, Int),
            Field::SatelliteNumber => FieldDef::new(0, 2, 5, Int),
            Field::Classification => FieldDef::new(0, 7, 1, Char),
            Field::IntDesignatorYear => FieldDef::new(0, 9, 2, Int),
            Field::IntDesignatorLaunchNumber => FieldDef::new(0, 11, 3, Int),
            Field::IntDesignatorPieceOfLaunch => FieldDef::new(0, 14, 3, Char),
            Field::EpochYear => FieldDef::new(0, 18, 2, Int),
            Field::EpochDay => FieldDef::new(0, 20, 12, Float),
            Field::FirstTimeDerivative => FieldDef::new(0, 33, 10, Float),
            Field::SecondTimeDerivative => FieldDef::new(0, 44, 8, DecimalAssumedE),
            Field::BstarDrag => FieldDef::new(0, 53, 8, DecimalAssumedE),
            Field::OrbitModel => FieldDef::new(0, 62, 1, Int),
            Field::TleSetNumber => FieldDef::new(0, 64, 4, Int),
            Field::Checksum1 => FieldDef::new(0, 68, 1, Int),

            Field::LineNumber2 => FieldDef::new(1, 0, 1, Int),
            Field::SatelliteNumber2 => FieldDef::new(1, 2, 5, Int),
            Field::Inclination => FieldDef::new(1, 8, 8, Float),
            Field::RightAscension => FieldDef::new(1, 17, 8, Float),
            Field::Eccentricity => FieldDef::new(1, 26, 7, DecimalAssumed),
            Field::Perigee => FieldDef::new(1, 34, 8, Float),
            Field::MeanAnomaly => FieldDef::new(1, 43, 8, Float),
            Field::MeanMotion => FieldDef::new(1, 52, 11, Float),
            Field::RevNumberAtEpoch => FieldDef::new(1, 63, 5, Int),
            Field::Checksum2 => FieldDef::new(1, 68, 1, Int),
        }
    }

    /// Both tables, line 1 first.
    pub fn all() -> impl Iterator<Item = Field> {
        LINE1_FIELDS.into_iter().chain(LINE2_FIELDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_fit_inside_a_69_column_line() {
        for field in Field::all() {
            let def = field.definition();
            assert!(def.start + def.length <= 69, "{field:?} overruns the line");
        }
    }

    #[test]
    fn tables_are_grouped_by_line() {
        assert!(LINE1_FIELDS.iter().all(|f| f.definition().line == 0));
        assert!(LINE2_FIELDS.iter().all(|f| f.definition().line == 1));
    }

    #[test]
    fn fields_on_a_line_do_not_overlap() {
        for table in [&LINE1_FIELDS[..], &LINE2_FIELDS[..]] {
            for pair in table.windows(2) {
                let (a, b) = (pair[0].definition(), pair[1].definition());
                assert!(a.start + a.length <= b.start, "{:?} overlaps {:?}", pair[0], pair[1]);
            }
        }
    }
}
