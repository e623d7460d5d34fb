//! Time-indexed region topology: which regions exist during a time range, the
//! directed transitions between them, and where each region is drawn.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{Result, TimecourseError};

// ------------- TopoTimeRange -------------
// Ordering is by start time, then end time; topologies are kept sorted on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopoTimeRange {
    min_time: i32,
    max_time: i32,
}

impl TopoTimeRange {
    pub fn new(min_time: i32, max_time: i32) -> Result<Self> {
        if min_time > max_time {
            return Err(TimecourseError::format(format!(
                "Topology time range {min_time}..{max_time} starts after it ends"
            )));
        }
        Ok(Self { min_time, max_time })
    }
    pub fn min_time(&self) -> i32 {
        self.min_time
    }
    pub fn max_time(&self) -> i32 {
        self.max_time
    }
    pub fn contains(&self, time: i32) -> bool {
        (self.min_time..=self.max_time).contains(&time)
    }
}
impl fmt::Display for TopoTimeRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {}]", self.min_time, self.max_time)
    }
}

// ------------- TopoLink -------------
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopoLink {
    source: String,
    target: String,
}

impl TopoLink {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self { source: source.into(), target: target.into() }
    }
    pub fn source(&self) -> &str {
        &self.source
    }
    pub fn target(&self) -> &str {
        &self.target
    }
}
impl fmt::Display for TopoLink {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

// ------------- RegionTopology -------------
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionTopology {
    time_range: TopoTimeRange,
    regions: BTreeSet<String>,
    links: BTreeSet<TopoLink>,
}

impl RegionTopology {
    pub fn new(time_range: TopoTimeRange) -> Self {
        Self { time_range, regions: BTreeSet::new(), links: BTreeSet::new() }
    }
    pub fn time_range(&self) -> TopoTimeRange {
        self.time_range
    }
    pub fn regions(&self) -> &BTreeSet<String> {
        &self.regions
    }
    pub fn links(&self) -> &BTreeSet<TopoLink> {
        &self.links
    }
    pub fn has_region(&self, region: &str) -> bool {
        self.regions.contains(region)
    }
    /// Returns false when the region was already declared.
    pub fn add_region(&mut self, region: impl Into<String>) -> bool {
        self.regions.insert(region.into())
    }
    /// Links only ever reference regions declared earlier in the same topology.
    pub fn add_link(&mut self, link: TopoLink) -> Result<()> {
        for end in [link.source(), link.target()] {
            if !self.has_region(end) {
                return Err(TimecourseError::format(format!(
                    "Topology link {link} references region '{end}' not declared for time range {}",
                    self.time_range
                )));
            }
        }
        self.links.insert(link);
        Ok(())
    }
}

// ------------- TopoRegionLoc -------------
#[derive(Clone, Debug, PartialEq)]
pub struct TopoRegionLoc {
    region: String,
    x: f64,
    y: f64,
}

impl TopoRegionLoc {
    pub fn new(region: impl Into<String>, x: f64, y: f64) -> Self {
        Self { region: region.into(), x, y }
    }
    pub fn region(&self) -> &str {
        &self.region
    }
    pub fn x(&self) -> f64 {
        self.x
    }
    pub fn y(&self) -> f64 {
        self.y
    }
}

// ------------- TopoRegionLocator -------------
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TopoRegionLocator {
    locations: BTreeMap<TopoTimeRange, Vec<TopoRegionLoc>>,
}

impl TopoRegionLocator {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
    pub fn has_range(&self, range: &TopoTimeRange) -> bool {
        self.locations.contains_key(range)
    }
    pub fn open_range(&mut self, range: TopoTimeRange) {
        self.locations.entry(range).or_default();
    }
    /// A later location for the same region replaces the earlier one.
    pub fn set_region_location(&mut self, range: TopoTimeRange, location: TopoRegionLoc) {
        let locations = self.locations.entry(range).or_default();
        match locations.iter_mut().find(|l| l.region == location.region) {
            Some(existing) => *existing = location,
            None => locations.push(location),
        }
    }
    pub fn locations_for(&self, range: &TopoTimeRange) -> &[TopoRegionLoc] {
        self.locations.get(range).map(Vec::as_slice).unwrap_or(&[])
    }
    pub fn region_location(&self, range: &TopoTimeRange, region: &str) -> Option<&TopoRegionLoc> {
        self.locations_for(range).iter().find(|l| l.region == region)
    }
    pub fn iter(&self) -> impl Iterator<Item = (&TopoTimeRange, &Vec<TopoRegionLoc>)> {
        self.locations.iter()
    }
}
