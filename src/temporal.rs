//! The temporal input range dataset: one [`TemporalRange`] per target gene plus
//! the legacy entry and source name maps.

use std::collections::BTreeSet;
use std::fmt;

use crate::attributes::yes_no;
use crate::error::{Result, TimecourseError};
use crate::keys::normalize_key;
use crate::maps::{write_map_table, DataMapping, MapTable};
use crate::markup::MarkupWriter;
use crate::range::TemporalRange;
use crate::temporal_format::{
    RangeElement, TemporalInputElement as E, TEMPORAL_ENTRY_MAP, TEMPORAL_SOURCE_MAP,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemporalInputRangeData {
    entries: Vec<TemporalRange>,
    entry_maps: MapTable,
    source_maps: MapTable,
}

impl TemporalInputRangeData {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn entries(&self) -> &[TemporalRange] {
        &self.entries
    }
    /// Looks an entry up by name, ignoring case and spacing.
    pub fn range(&self, name: &str) -> Option<&TemporalRange> {
        self.range_position(name).map(|i| &self.entries[i])
    }
    pub fn range_position(&self, name: &str) -> Option<usize> {
        let key = normalize_key(name);
        self.entries.iter().position(|e| normalize_key(e.name()) == key)
    }
    pub fn entry_maps(&self) -> &MapTable {
        &self.entry_maps
    }
    pub fn source_maps(&self) -> &MapTable {
        &self.source_maps
    }
    pub fn entry_map(&self, key: &str) -> Option<&[DataMapping]> {
        self.entry_maps.get(key).map(Vec::as_slice)
    }
    pub fn source_map(&self, key: &str) -> Option<&[DataMapping]> {
        self.source_maps.get(key).map(Vec::as_slice)
    }

    pub fn add_entry(&mut self, entry: TemporalRange) -> Result<usize> {
        if self.range_position(entry.name()).is_some() {
            return Err(TimecourseError::format(format!(
                "Temporal input data already has an entry named '{}'",
                entry.name()
            )));
        }
        self.entries.push(entry);
        Ok(self.entries.len() - 1)
    }

    /// Both ends of every interval.
    pub fn all_times(&self) -> BTreeSet<i32> {
        self.entries
            .iter()
            .flat_map(TemporalRange::time_ranges)
            .flat_map(|input| input.ranges())
            .flat_map(|r| [r.min_time(), r.max_time()])
            .collect()
    }
    pub fn all_regions(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .flat_map(TemporalRange::time_ranges)
            .flat_map(|input| input.ranges())
            .filter_map(|r| r.region().map(str::to_owned))
            .collect()
    }

    pub(crate) fn entry_at_mut(&mut self, position: usize) -> Option<&mut TemporalRange> {
        self.entries.get_mut(position)
    }
    pub(crate) fn attach_entry_map(&mut self, key: String, entries: Vec<DataMapping>) {
        self.entry_maps.insert(key, entries);
    }
    pub(crate) fn attach_source_map(&mut self, key: String, entries: Vec<DataMapping>) {
        self.source_maps.insert(key, entries);
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut out = MarkupWriter::new();
        out.open(E::Dataset.tag(), vec![])?;
        for entry in &self.entries {
            out.open(E::Entry.tag(), vec![
                ("name", Some(entry.name().to_owned())),
                ("note", entry.note().map(str::to_owned)),
                ("internalOnly", Some(yes_no(entry.internal_only()).to_owned())),
            ])?;
            for input in entry.time_ranges() {
                let tag = E::Range(RangeElement::InputTimeRange).tag();
                out.open(tag, vec![("name", Some(input.name().to_owned()))])?;
                for range in input.ranges() {
                    out.empty(E::Range(RangeElement::Range).tag(), vec![
                        ("region", range.region().map(str::to_owned)),
                        ("sign", Some(range.sign().tag().to_owned())),
                        ("note", range.note().map(str::to_owned)),
                        ("min", Some(range.min_time().to_string())),
                        ("max", Some(range.max_time().to_string())),
                    ])?;
                }
                out.close(tag)?;
            }
            out.close(E::Entry.tag())?;
        }
        write_map_table(&mut out, TEMPORAL_ENTRY_MAP, &self.entry_maps)?;
        write_map_table(&mut out, TEMPORAL_SOURCE_MAP, &self.source_maps)?;
        out.close(E::Dataset.tag())?;
        out.finish()
    }
}

impl fmt::Display for TemporalInputRangeData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "temporal input ranges ({} entries)", self.entries.len())
    }
}
