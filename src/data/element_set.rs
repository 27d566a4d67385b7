//! Element set records and the three-line catalog parser

use std::fmt;
use std::sync::Arc;

use super::regime::{classify, OrbitalRegime};
use crate::error::{Error, Result};

const ELEMENT_LINE_LEN: usize = 69;

/// Mean orbital elements of one object, parsed from two element lines.
///
/// Only the propagation engine interprets the underlying TLE; everything
/// else goes through the accessors.
#[derive(Clone)]
pub struct Elements {
    tle: satkit::TLE,
    catalog_number: u32,
}

impl Elements {
    /// Parse and validate a pair of fixed-width element lines.
    pub fn from_lines(
        line1: &str,
        line2: &str,
    ) -> std::result::Result<Self, ElementLineError> {
        validate_element_line(line1, b'1').map_err(|reason| ElementLineError::new(1, reason))?;
        validate_element_line(line2, b'2').map_err(|reason| ElementLineError::new(2, reason))?;

        let catalog_1 = &line1[2..7];
        let catalog_2 = &line2[2..7];
        if catalog_1 != catalog_2 {
            return Err(ElementLineError::new(
                2,
                format!(
                    "catalog number mismatch between lines ({} vs {})",
                    catalog_1.trim(),
                    catalog_2.trim()
                ),
            ));
        }
        let catalog_number = catalog_1.trim().parse::<u32>().map_err(|_| {
            ElementLineError::new(1, format!("invalid catalog number {:?}", catalog_1))
        })?;

        let tle = satkit::TLE::load_2line(line1, line2)
            .map_err(|e| ElementLineError::new(1, e.to_string()))?;
        if !tle.mean_motion.is_finite() || !tle.eccen.is_finite() {
            return Err(ElementLineError::new(
                2,
                "non-finite mean motion or eccentricity",
            ));
        }

        Ok(Self {
            tle,
            catalog_number,
        })
    }

    pub fn catalog_number(&self) -> u32 {
        self.catalog_number
    }

    /// Mean motion, revolutions per day
    pub fn mean_motion_rev_per_day(&self) -> f64 {
        self.tle.mean_motion
    }

    pub fn eccentricity(&self) -> f64 {
        self.tle.eccen
    }

    /// Inclination, degrees
    pub fn inclination_deg(&self) -> f64 {
        self.tle.inclination
    }

    /// Reference epoch of the element set
    pub fn epoch(&self) -> satkit::Instant {
        self.tle.epoch
    }

    pub(crate) fn tle(&self) -> &satkit::TLE {
        &self.tle
    }
}

/// Rejection of an element line pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementLineError {
    /// Offending element line, 1 or 2
    pub line: usize,
    pub reason: String,
}

impl ElementLineError {
    fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ElementLineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element line {}: {}", self.line, self.reason)
    }
}

impl fmt::Debug for Elements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Elements")
            .field("catalog_number", &self.catalog_number)
            .field("mean_motion_rev_per_day", &self.tle.mean_motion)
            .field("eccentricity", &self.tle.eccen)
            .field("inclination_deg", &self.tle.inclination)
            .finish_non_exhaustive()
    }
}

/// One catalog object: display name, immutable elements and their regime
#[derive(Debug, Clone)]
pub struct ElementSet {
    name: Arc<str>,
    elements: Elements,
    regime: OrbitalRegime,
}

impl ElementSet {
    /// Build an element set, classifying its regime once.
    pub fn new(name: impl Into<Arc<str>>, elements: Elements) -> Self {
        let regime = classify(&elements);
        Self {
            name: name.into(),
            elements,
            regime,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the name, reused by propagation samples
    pub fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub fn elements(&self) -> &Elements {
        &self.elements
    }

    pub fn regime(&self) -> OrbitalRegime {
        self.regime
    }
}

/// Parse newline-delimited three-line records (name + two element lines).
///
/// Leading and trailing blank lines are ignored. The whole parse is
/// aborted on the first invalid record: a partial catalog would skew the
/// regime statistics without anyone noticing.
pub fn parse_element_sets(text: &str) -> Result<Vec<ElementSet>> {
    let lines: Vec<&str> = text.trim().lines().map(str::trim_end).collect();

    if lines.len() % 3 != 0 {
        return Err(Error::malformed(
            lines.len() - lines.len() % 3 + 1,
            format!(
                "{} lines is not a whole number of three-line records",
                lines.len()
            ),
        ));
    }

    let mut sets = Vec::with_capacity(lines.len() / 3);
    for (index, record) in lines.chunks_exact(3).enumerate() {
        let name_line = index * 3 + 1;
        let elements = Elements::from_lines(record[1], record[2])
            .map_err(|e| Error::malformed(name_line + e.line, e.reason))?;
        let name = display_name(record[0], elements.catalog_number());
        sets.push(ElementSet::new(name, elements));
    }

    log::debug!("Parsed {} element sets", sets.len());
    Ok(sets)
}

/// Name line with the optional `0 ` title-line prefix removed
fn display_name(line: &str, catalog_number: u32) -> String {
    let name = line.trim();
    let name = name.strip_prefix("0 ").unwrap_or(name).trim();
    if name.is_empty() {
        format!("NORAD {}", catalog_number)
    } else {
        name.to_string()
    }
}

fn validate_element_line(line: &str, number: u8) -> std::result::Result<(), String> {
    let bytes = line.as_bytes();
    if !line.is_ascii() || bytes.len() != ELEMENT_LINE_LEN {
        return Err(format!(
            "line {} must be {} ASCII columns, got {}",
            number as char,
            ELEMENT_LINE_LEN,
            line.chars().count()
        ));
    }
    if bytes[0] != number || bytes[1] != b' ' {
        return Err(format!("expected line number {}", number as char));
    }

    let expected = checksum(&line[..ELEMENT_LINE_LEN - 1]);
    let found = bytes[ELEMENT_LINE_LEN - 1];
    if !found.is_ascii_digit() || found - b'0' != expected {
        return Err(format!(
            "checksum mismatch on line {}: expected {}, found {}",
            number as char, expected, found as char
        ));
    }
    Ok(())
}

/// Modulo-10 checksum: digits count at face value, minus signs as one
fn checksum(columns: &str) -> u8 {
    let sum: u32 = columns
        .bytes()
        .map(|b| match b {
            b'0'..=b'9' => (b - b'0') as u32,
            b'-' => 1,
            _ => 0,
        })
        .sum();
    (sum % 10) as u8
}
