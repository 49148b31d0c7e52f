//! Normalizes TLE text, line lists and already-parsed records into a
//! canonical [`ParsedTle`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TleError};

/// A TLE as a name (when the input had one) plus its two element lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedTle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub lines: [String; 2],
}

/// Anything the parser accepts.
#[derive(Debug, Clone)]
pub enum TleInput<'a> {
    /// Newline-delimited text, two or three lines.
    Text(&'a str),
    /// Individual lines, two or three of them.
    Lines(Vec<&'a str>),
    /// A record that has already been parsed.
    Parsed(Arc<ParsedTle>),
}

impl<'a> From<&'a str> for TleInput<'a> {
    fn from(text: &'a str) -> Self {
        TleInput::Text(text)
    }
}

impl<'a> From<&'a String> for TleInput<'a> {
    fn from(text: &'a String) -> Self {
        TleInput::Text(text)
    }
}

impl<'a> From<&'a [&'a str]> for TleInput<'a> {
    fn from(lines: &'a [&'a str]) -> Self {
        TleInput::Lines(lines.to_vec())
    }
}

impl<'a, const N: usize> From<[&'a str; N]> for TleInput<'a> {
    fn from(lines: [&'a str; N]) -> Self {
        TleInput::Lines(lines.to_vec())
    }
}

impl<'a> From<&'a [String]> for TleInput<'a> {
    fn from(lines: &'a [String]) -> Self {
        TleInput::Lines(lines.iter().map(String::as_str).collect())
    }
}

impl<'a> From<&'a Vec<String>> for TleInput<'a> {
    fn from(lines: &'a Vec<String>) -> Self {
        TleInput::from(lines.as_slice())
    }
}

impl From<Arc<ParsedTle>> for TleInput<'_> {
    fn from(tle: Arc<ParsedTle>) -> Self {
        TleInput::Parsed(tle)
    }
}

impl From<&Arc<ParsedTle>> for TleInput<'_> {
    fn from(tle: &Arc<ParsedTle>) -> Self {
        TleInput::Parsed(Arc::clone(tle))
    }
}

// Identity is only kept for `Arc` input; an owned record gets a fresh `Arc`.
impl From<ParsedTle> for TleInput<'_> {
    fn from(tle: ParsedTle) -> Self {
        TleInput::Parsed(Arc::new(tle))
    }
}

impl TleInput<'_> {
    /// Memo key for the parse cache, `None` for already-parsed input.
    ///
    /// Line lists key on the data lines ahead of the name so two satellites
    /// sharing a name never share an entry.
    pub(crate) fn cache_key(&self) -> Option<String> {
        match self {
            TleInput::Text(text) => Some(format!("text:{text}")),
            TleInput::Lines(lines) => {
                let mut key = format!("lines{}", lines.len());
                for line in lines.iter().rev() {
                    key.push('\u{1f}');
                    key.push_str(line);
                }
                Some(key)
            }
            TleInput::Parsed(_) => None,
        }
    }
}

impl ParsedTle {
    /// Builds a record from two lines and an optional name, trimming each.
    pub fn new(name: Option<&str>, line1: &str, line2: &str) -> Self {
        Self {
            name: name.map(clean_name),
            lines: [line1.trim().to_string(), line2.trim().to_string()],
        }
    }

    /// Parses without memoization; see [`crate::TleCache::parse`] for the
    /// cached variant.
    pub fn parse<'a>(input: impl Into<TleInput<'a>>) -> Result<Arc<ParsedTle>> {
        match input.into() {
            TleInput::Parsed(tle) => Ok(tle),
            TleInput::Text(text) => {
                let lines: Vec<&str> = text
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect();
                from_lines(&lines).map(Arc::new)
            }
            TleInput::Lines(lines) => from_lines(&lines).map(Arc::new),
        }
    }

    /// Canonical object form, `{"name": "...", "lines": ["1 ...", "2 ..."]}`.
    pub fn from_json(json: &str) -> Result<Arc<ParsedTle>> {
        let tle: ParsedTle = serde_json::from_str(json)
            .map_err(|e| TleError::Format(format!("not a parsed TLE object: {e}")))?;
        Ok(Arc::new(tle))
    }

    pub fn line1(&self) -> &str {
        &self.lines[0]
    }

    pub fn line2(&self) -> &str {
        &self.lines[1]
    }
}

fn from_lines(lines: &[&str]) -> Result<ParsedTle> {
    match lines {
        [name, line1, line2] => Ok(ParsedTle::new(Some(*name), line1, line2)),
        [line1, line2] => Ok(ParsedTle::new(None, line1, line2)),
        _ => Err(TleError::Format(format!(
            "expected 2 or 3 lines, got {}",
            lines.len()
        ))),
    }
}

fn clean_name(name: &str) -> String {
    let name = name.trim_start();
    name.strip_prefix("0 ").unwrap_or(name).trim().to_string()
}
