use crate::decode::decode_int;
use crate::error::{Result, TleError};
use crate::parser::{ParsedTle, TleInput};

/// Checksum of a full TLE line: digits count at face value, each `-`
/// counts as 1, everything else as 0. The final character (the embedded
/// checksum digit) is excluded.
pub fn compute_checksum(line: &str) -> Result<u8> {
    let mut chars = line.chars();
    chars.next_back();
    let body = chars.as_str();
    if body.is_empty() {
        return Err(TleError::ChecksumEmptyLine);
    }

    let sum: u32 = body
        .chars()
        .map(|c| match c {
            '-' => 1,
            c => c.to_digit(10).unwrap_or(0),
        })
        .sum();
    Ok((sum % 10) as u8)
}

/// The checksum digit embedded as the last character of a line.
pub fn line_checksum_digit(line: &str) -> Option<u8> {
    line.chars()
        .next_back()
        .and_then(|c| c.to_digit(10))
        .map(|d| d as u8)
}

/// Line-number markers and both checksums of an already-parsed record.
pub fn is_valid_record(tle: &ParsedTle) -> bool {
    tle.lines.iter().enumerate().all(|(index, line)| {
        let marker_ok = line.get(0..1).and_then(decode_int) == Some(index as i64 + 1);
        let checksum_ok = matches!(
            (compute_checksum(line), line_checksum_digit(line)),
            (Ok(computed), Some(embedded)) if computed == embedded
        );
        marker_ok && checksum_ok
    })
}

/// Parses (uncached) and validates; any parse failure is reported as
/// invalid rather than as an error.
pub fn is_valid_tle<'a>(input: impl Into<TleInput<'a>>) -> bool {
    ParsedTle::parse(input).is_ok_and(|tle| is_valid_record(&tle))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS1: &str = "1 25544U 98067A   17206.18396726  .00001961  00000-0  36771-4 0  9993";
    const ISS2: &str = "2 25544  51.6400 208.9163 0006317  69.9862  25.2906 15.54225995 67660";

    #[test]
    fn checksum_of_known_line() {
        let line = "1 37820U 11053A   17206.57682878  .00025514  00000-0  13004-3 0  9995";
        assert_eq!(compute_checksum(line).unwrap(), 5);
    }

    #[test]
    fn checksum_matches_embedded_digit() {
        for line in [ISS1, ISS2] {
            assert_eq!(Some(compute_checksum(line).unwrap()), line_checksum_digit(line));
        }
    }

    #[test]
    fn minus_signs_count_as_one() {
        assert_eq!(compute_checksum("--0").unwrap(), 2);
        assert_eq!(compute_checksum("9+.A 9X").unwrap(), 8);
    }

    #[test]
    fn empty_body_is_an_error() {
        assert_eq!(compute_checksum("5"), Err(TleError::ChecksumEmptyLine));
        assert_eq!(compute_checksum(""), Err(TleError::ChecksumEmptyLine));
    }

    #[test]
    fn iss_is_valid() {
        assert!(is_valid_tle([ISS1, ISS2]));
        assert!(is_valid_tle(format!("ISS (ZARYA)\n{ISS1}\n{ISS2}").as_str()));
    }

    #[test]
    fn altered_checksum_digit_is_invalid() {
        let bad1 = format!("{}4", &ISS1[..68]);
        let bad2 = format!("{}1", &ISS2[..68]);
        assert!(!is_valid_tle([bad1.as_str(), ISS2]));
        assert!(!is_valid_tle([ISS1, bad2.as_str()]));
    }

    #[test]
    fn swapped_lines_are_invalid() {
        assert!(!is_valid_tle([ISS2, ISS1]));
    }

    #[test]
    fn wrong_line_count_is_invalid_not_an_error() {
        assert!(!is_valid_tle(ISS1));
    }
}
