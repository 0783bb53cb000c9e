//! ISO-8601 duration parsing (`P[T[nH][nM][nS]]`)

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::error::{AnalyzerError, Result};

fn iso_8601() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^P(?:T(?:(?P<hours>\d+)H)?(?:(?P<minutes>\d+)M)?(?:(?P<seconds>\d+)S)?)?")
            .expect("ISO-8601 duration pattern is valid")
    })
}

/// Converts ISO-8601 time spans into whole seconds.
///
/// The default parser only anchors the match at the start of the input and
/// ignores whatever follows the recognized prefix, so `"PT5M30S junk"` parses
/// as 330 and `"P1DT2H"` parses as 0. [`DurationParser::strict`] rejects any
/// input the pattern does not consume entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurationParser {
    strict: bool,
}

impl DurationParser {
    /// Create a lenient (prefix-matching) parser
    pub fn new() -> Self {
        Self { strict: false }
    }

    /// Create a parser that requires the whole input to match
    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Parse a duration string into seconds
    pub fn parse(&self, text: &str) -> Result<u64> {
        let captures = iso_8601()
            .captures(text)
            .ok_or_else(|| AnalyzerError::format(text, "expected leading 'P'"))?;

        if self.strict {
            // Group 0 always exists on a successful match
            let consumed = captures.get(0).map(|m| m.end()).unwrap_or(0);
            if consumed != text.len() {
                return Err(AnalyzerError::format(
                    text,
                    format!("unexpected trailing input '{}'", &text[consumed..]),
                ));
            }
        }

        let hours = component(&captures, "hours", text)?;
        let minutes = component(&captures, "minutes", text)?;
        let seconds = component(&captures, "seconds", text)?;

        hours
            .checked_mul(3600)
            .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(seconds))
            .ok_or_else(|| AnalyzerError::format(text, "duration overflows u64 seconds"))
    }
}

fn component(captures: &Captures<'_>, name: &str, text: &str) -> Result<u64> {
    match captures.name(name) {
        Some(m) => m
            .as_str()
            .parse::<u64>()
            .map_err(|e| AnalyzerError::format(text, format!("{} component: {}", name, e))),
        None => Ok(0),
    }
}

/// Parse with the default lenient parser
pub fn parse_duration(text: &str) -> Result<u64> {
    DurationParser::new().parse(text)
}

/// Canonical encoding of a number of seconds, e.g. `3723` -> `PT1H2M3S`
pub fn format_iso8601(total_seconds: u64) -> String {
    if total_seconds == 0 {
        return "PT0S".to_string();
    }

    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let mut encoded = String::from("PT");
    if hours > 0 {
        encoded.push_str(&format!("{}H", hours));
    }
    if minutes > 0 {
        encoded.push_str(&format!("{}M", minutes));
    }
    if seconds > 0 {
        encoded.push_str(&format!("{}S", seconds));
    }
    encoded
}
