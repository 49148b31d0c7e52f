use thiserror::Error;

pub type Result<T> = std::result::Result<T, TleError>;

/// Errors surfaced by parsing, checksumming and propagation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TleError {
    /// Input could not be shaped into a name plus two element lines.
    #[error("TLE format error: {0}")]
    Format(String),

    /// A line was empty once its checksum digit was removed.
    #[error("cannot compute checksum of an empty line")]
    ChecksumEmptyLine,

    /// The propagator rejected the orbital elements.
    #[error("propagation error: {0}")]
    Propagation(#[from] PropagationCause),

    /// Millisecond timestamp outside the representable UTC range.
    #[error("timestamp out of range: {0} ms")]
    InvalidTimestamp(i64),

    /// Track parameters that would never terminate.
    #[error("invalid option: {0}")]
    InvalidOption(String),
}

/// Reasons SGP4 refuses a set of elements, numbered after the classic
/// propagator error codes 1 to 6.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropagationCause {
    #[error("mean elements, ecc >= 1.0 or ecc < -0.001 or a < 0.95 er")]
    InvalidEccentricity,
    #[error("mean motion less than 0.0")]
    NegativeMeanMotion,
    #[error("pert elements, ecc < 0.0  or  ecc > 1.0")]
    PerturbedEccentricity,
    #[error("semi-latus rectum < 0.0")]
    NegativeSemiLatusRectum,
    #[error("epoch elements are sub-orbital")]
    SubOrbital,
    #[error("satellite has decayed")]
    Decayed,
    #[error("unknown propagation error: {0}")]
    Unknown(String),
}

impl PropagationCause {
    /// Classic numeric code, `None` for causes outside the six known ones.
    pub fn code(&self) -> Option<u8> {
        match self {
            Self::InvalidEccentricity => Some(1),
            Self::NegativeMeanMotion => Some(2),
            Self::PerturbedEccentricity => Some(3),
            Self::NegativeSemiLatusRectum => Some(4),
            Self::SubOrbital => Some(5),
            Self::Decayed => Some(6),
            Self::Unknown(_) => None,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::InvalidEccentricity,
            2 => Self::NegativeMeanMotion,
            3 => Self::PerturbedEccentricity,
            4 => Self::NegativeSemiLatusRectum,
            5 => Self::SubOrbital,
            6 => Self::Decayed,
            other => Self::Unknown(format!("error code {other}")),
        }
    }
}

impl From<sgp4::ElementsError> for PropagationCause {
    fn from(err: sgp4::ElementsError) -> Self {
        match err {
            sgp4::ElementsError::KozaiElementsError(
                sgp4::KozaiElementsError::NegativeKozaiMeanMotion
                | sgp4::KozaiElementsError::NegativeBrouwerMeanMotion,
            ) => Self::NegativeMeanMotion,
            sgp4::ElementsError::OutOfRangeEpochEccentricity(_) => Self::InvalidEccentricity,
        }
    }
}

impl From<sgp4::Error> for PropagationCause {
    fn from(err: sgp4::Error) -> Self {
        match err {
            sgp4::Error::OutOfRangeEccentricity { .. } => Self::InvalidEccentricity,
            sgp4::Error::OutOfRangePerturbedEccentricity { .. } => Self::PerturbedEccentricity,
            sgp4::Error::NegativeSemiLatusRectum { .. } => Self::NegativeSemiLatusRectum,
        }
    }
}
