//! Legacy name maps and the reusable sub-builder that reads them.
//!
//! Older documents let one entry redirect to the data of other entries by name
//! (`<tcMap key="..."><useEntry name="..."/></tcMap>`). Modern documents may not
//! contain them at all; [`LegacyMapWorker`] enforces that and otherwise
//! accumulates one `(key, list)` pair per map element.

use std::collections::BTreeMap;

use tracing::debug;

use crate::attributes::Attributes;
use crate::error::{Result, TimecourseError};
use crate::markup::MarkupWriter;

pub const USE_ENTRY: &str = "useEntry";

// ------------- DataMapping -------------
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataMapping {
    name: String,
    channel: Option<String>,
}

impl DataMapping {
    pub fn new(name: impl Into<String>, channel: Option<String>) -> Self {
        Self { name: name.into(), channel }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }
}

pub type MapTable = BTreeMap<String, Vec<DataMapping>>;

/// The auxiliary maps object published alongside datasets read from legacy documents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataMaps {
    pub time_course: MapTable,
    pub temporal_entry: MapTable,
    pub temporal_source: MapTable,
    pub copies_per_embryo: MapTable,
}

impl DataMaps {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn is_empty(&self) -> bool {
        self.time_course.is_empty()
            && self.temporal_entry.is_empty()
            && self.temporal_source.is_empty()
            && self.copies_per_embryo.is_empty()
    }
}

/// A map element that has been closed and is ready to be glued into its owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedMap {
    pub tag: &'static str,
    pub key: String,
    pub entries: Vec<DataMapping>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MapElement {
    Map(&'static str),
    UseEntry,
}

// ------------- LegacyMapWorker -------------
#[derive(Debug)]
pub struct LegacyMapWorker {
    map_tag: &'static str,
    allowed: bool,
    current: Option<(String, Vec<DataMapping>)>,
}

impl LegacyMapWorker {
    pub fn new(map_tag: &'static str, allowed: bool) -> Self {
        Self { map_tag, allowed, current: None }
    }
    pub fn map_tag(&self) -> &'static str {
        self.map_tag
    }
    pub fn keywords(&self) -> [&'static str; 2] {
        [self.map_tag, USE_ENTRY]
    }
    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }
    /// Whether this worker should see the element; `useEntry` goes to the worker
    /// whose map is currently open.
    pub fn handles(&self, name: &str) -> bool {
        name == self.map_tag || (name == USE_ENTRY && self.is_open())
    }
    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn process_element(&mut self, name: &str, attrs: &Attributes) -> Result<Option<MapElement>> {
        if name == self.map_tag {
            if !self.allowed {
                return Err(TimecourseError::format(format!(
                    "Legacy <{}> maps are not allowed in this document format",
                    self.map_tag
                )));
            }
            if self.current.is_some() {
                return Err(TimecourseError::format(format!("<{}> elements may not nest", self.map_tag)));
            }
            let key = attrs.required(self.map_tag, "key")?.to_owned();
            self.current = Some((key, Vec::new()));
            return Ok(Some(MapElement::Map(self.map_tag)));
        }
        if name == USE_ENTRY {
            let Some((_, entries)) = self.current.as_mut() else {
                return Err(TimecourseError::format(format!(
                    "<{USE_ENTRY}> appears outside of a <{}> map",
                    self.map_tag
                )));
            };
            let entry = DataMapping::new(
                attrs.required(USE_ENTRY, "name")?,
                attrs.optional_string("channel"),
            );
            entries.push(entry);
            return Ok(Some(MapElement::UseEntry));
        }
        Ok(None)
    }

    /// Closing the map element hands back the finished pair for the owner to glue.
    pub fn finish_element(&mut self, name: &str) -> Option<CompletedMap> {
        if name != self.map_tag {
            return None;
        }
        self.current.take().map(|(key, entries)| {
            debug!(map = self.map_tag, %key, entries = entries.len(), "legacy map closed");
            CompletedMap { tag: self.map_tag, key, entries }
        })
    }
}

/// Re-emits a map table as `<tag key=..><useEntry .../></tag>` elements.
pub fn write_map_table(out: &mut MarkupWriter, tag: &str, table: &MapTable) -> Result<()> {
    for (key, entries) in table {
        out.open(tag, vec![("key", Some(key.clone()))])?;
        for entry in entries {
            out.empty(USE_ENTRY, vec![
                ("name", Some(entry.name.clone())),
                ("channel", entry.channel.clone()),
            ])?;
        }
        out.close(tag)?;
    }
    Ok(())
}
