//! Temporal input range entities.
//!
//! A [`TemporalRange`] belongs to one gene and holds one [`InputTimeRange`] per
//! input; each input lists the [`RegionAndRange`] intervals during which that
//! input acts on the gene, in declaration order.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Result, TimecourseError};
use crate::keys::normalize_key;

lazy_static! {
    static ref RANGE_SPEC: Regex = Regex::new(r"^\s*(-?\d+)(?:\s+(-?\d+))?\s*$").unwrap();
}

// ------------- Sign -------------
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Sign {
    #[default]
    Promoter,
    Repressor,
    Undefined,
}

impl Sign {
    pub fn tag(self) -> &'static str {
        match self {
            Sign::Promoter => "+",
            Sign::Repressor => "-",
            Sign::Undefined => "?",
        }
    }
}
impl FromStr for Sign {
    type Err = TimecourseError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "+" | "promoter" => Ok(Sign::Promoter),
            "-" | "repressor" => Ok(Sign::Repressor),
            "?" | "undefined" => Ok(Sign::Undefined),
            other => Err(TimecourseError::format(format!("Unknown input sign '{other}'"))),
        }
    }
}
impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

// blank text reads back as absent, so it is stored that way
fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

// ------------- RegionAndRange -------------
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegionAndRange {
    region: Option<String>,
    min_time: i32,
    max_time: i32,
    sign: Sign,
    note: Option<String>,
}

impl RegionAndRange {
    pub fn new(
        region: Option<String>,
        min_time: i32,
        max_time: i32,
        sign: Sign,
        note: Option<String>,
    ) -> Result<Self> {
        if min_time > max_time {
            return Err(TimecourseError::format(format!(
                "Time range {min_time}..{max_time} starts after it ends"
            )));
        }
        Ok(Self { region: non_blank(region), min_time, max_time, sign, note: non_blank(note) })
    }
    /// Builds one interval from a `start [end]` specification.
    pub fn from_spec(
        region: Option<String>,
        spec: &str,
        sign: Sign,
        note: Option<String>,
    ) -> Result<Self> {
        let (min_time, max_time) = parse_range_spec(spec)?;
        Self::new(region, min_time, max_time, sign, note)
    }
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
    pub fn min_time(&self) -> i32 {
        self.min_time
    }
    pub fn max_time(&self) -> i32 {
        self.max_time
    }
    pub fn sign(&self) -> Sign {
        self.sign
    }
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
    pub fn contains(&self, time: i32) -> bool {
        (self.min_time..=self.max_time).contains(&time)
    }
}
impl fmt::Display for RegionAndRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let region = self.region.as_deref().unwrap_or("*");
        if self.min_time == self.max_time {
            write!(f, "{}{} @ {}", self.sign, region, self.min_time)
        } else {
            write!(f, "{}{} @ {}-{}", self.sign, region, self.min_time, self.max_time)
        }
    }
}

// ------------- InputTimeRange -------------
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputTimeRange {
    name: String,
    ranges: Vec<RegionAndRange>,
}

impl InputTimeRange {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TimecourseError::format("Input time range name may not be empty"));
        }
        Ok(Self { name, ranges: Vec::new() })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn ranges(&self) -> &[RegionAndRange] {
        &self.ranges
    }
    pub fn add(&mut self, range: RegionAndRange) {
        self.ranges.push(range);
    }
}

// ------------- TemporalRange -------------
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemporalRange {
    name: String,
    note: Option<String>,
    internal_only: bool,
    time_ranges: Vec<InputTimeRange>,
}

impl TemporalRange {
    pub fn new(name: impl Into<String>, note: Option<String>, internal_only: bool) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TimecourseError::format("Temporal range name may not be empty"));
        }
        Ok(Self { name, note: non_blank(note), internal_only, time_ranges: Vec::new() })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
    pub fn internal_only(&self) -> bool {
        self.internal_only
    }
    pub fn time_ranges(&self) -> &[InputTimeRange] {
        &self.time_ranges
    }
    pub fn time_range(&self, name: &str) -> Option<&InputTimeRange> {
        let key = normalize_key(name);
        self.time_ranges.iter().find(|r| normalize_key(r.name()) == key)
    }
    pub fn add_time_range(&mut self, range: InputTimeRange) -> Result<()> {
        if self.time_range(range.name()).is_some() {
            return Err(TimecourseError::format(format!(
                "Temporal range '{}' already has an input named '{}'",
                self.name,
                range.name()
            )));
        }
        self.time_ranges.push(range);
        Ok(())
    }
}

/// Splits a whitespace separated list of time markers into one string per range.
///
/// One or two tokens form a single range; an even number of tokens beyond two is
/// taken pairwise. Any other token count cannot be assigned unambiguously.
pub fn split_ranges(spec: &str) -> Result<Vec<String>> {
    let tokens: Vec<&str> = spec.split_whitespace().collect();
    match tokens.len() {
        0 => Err(TimecourseError::IllegalArgument(String::from(
            "split_ranges called with no time tokens",
        ))),
        1 | 2 => Ok(vec![tokens.join(" ")]),
        n if n % 2 == 0 => Ok(tokens.chunks(2).map(|pair| pair.join(" ")).collect()),
        n => Err(TimecourseError::IllegalArgument(format!(
            "split_ranges cannot pair {n} time tokens in '{}'",
            spec.trim()
        ))),
    }
}

/// Parses `start [end]` into an inclusive `(min, max)` pair.
pub fn parse_range_spec(spec: &str) -> Result<(i32, i32)> {
    let captures = RANGE_SPEC.captures(spec).ok_or_else(|| {
        TimecourseError::format(format!("Malformed time range '{}'", spec.trim()))
    })?;
    let bound = |text: &str| {
        text.parse::<i32>().map_err(|_| {
            TimecourseError::format(format!("Time '{text}' in range '{}' is out of bounds", spec.trim()))
        })
    };
    let min = bound(&captures[1])?;
    let max = match captures.get(2) {
        Some(m) => bound(m.as_str())?,
        None => min,
    };
    Ok((min, max))
}
