//! Streaming builder for temporal input range documents, and the reusable
//! [`RangeWorker`] that reads `inputTimeRange` / `range` blocks.

use std::sync::Arc;

use tracing::{debug, info};

use crate::attributes::Attributes;
use crate::error::{Result, TimecourseError};
use crate::factory::{FactoryOptions, FormatFactory, Glue};
use crate::keys::{keyword_set, KeywordSet};
use crate::maps::{CompletedMap, LegacyMapWorker, MapElement};
use crate::range::{split_ranges, InputTimeRange, RegionAndRange, Sign, TemporalRange};
use crate::store::DataStore;
use crate::temporal::TemporalInputRangeData;

pub const TEMPORAL_ENTRY_MAP: &str = "timEntryMap";
pub const TEMPORAL_SOURCE_MAP: &str = "timSourceMap";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RangeElement {
    InputTimeRange,
    Range,
}

impl RangeElement {
    pub fn tag(self) -> &'static str {
        match self {
            RangeElement::InputTimeRange => "inputTimeRange",
            RangeElement::Range => "range",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TemporalInputElement {
    Dataset,
    Entry,
    Range(RangeElement),
    Map(MapElement),
}

impl TemporalInputElement {
    pub fn tag(self) -> &'static str {
        match self {
            TemporalInputElement::Dataset => "temporalInputs",
            TemporalInputElement::Entry => "temporalRange",
            TemporalInputElement::Range(range) => range.tag(),
            TemporalInputElement::Map(MapElement::Map(tag)) => tag,
            TemporalInputElement::Map(MapElement::UseEntry) => crate::maps::USE_ENTRY,
        }
    }
}

use TemporalInputElement as E;

// ------------- RangeWorker -------------
/// Builds one [`InputTimeRange`] from an `inputTimeRange` element and the
/// `range` elements inside it, handing it back when the block closes.
#[derive(Debug, Default)]
pub struct RangeWorker {
    current: Option<InputTimeRange>,
}

impl RangeWorker {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn keywords(&self) -> [&'static str; 2] {
        [RangeElement::InputTimeRange.tag(), RangeElement::Range.tag()]
    }
    pub fn handles(&self, name: &str) -> bool {
        self.keywords().contains(&name)
    }
    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn process_element(&mut self, name: &str, attrs: &Attributes) -> Result<Option<RangeElement>> {
        if name == RangeElement::InputTimeRange.tag() {
            if self.current.is_some() {
                return Err(TimecourseError::format(format!("<{name}> elements may not nest")));
            }
            self.current = Some(InputTimeRange::new(attrs.required(name, "name")?)?);
            return Ok(Some(RangeElement::InputTimeRange));
        }
        if name == RangeElement::Range.tag() {
            let Some(current) = self.current.as_mut() else {
                return Err(TimecourseError::format(format!(
                    "<{name}> appears outside of an <{}>",
                    RangeElement::InputTimeRange.tag()
                )));
            };
            for range in read_ranges(name, attrs)? {
                current.add(range);
            }
            return Ok(Some(RangeElement::Range));
        }
        Ok(None)
    }

    pub fn finish_element(&mut self, name: &str) -> Option<InputTimeRange> {
        if name != RangeElement::InputTimeRange.tag() {
            return None;
        }
        self.current.take()
    }
}

// one `range` element; a `times` list can describe several intervals at once
fn read_ranges(element: &str, attrs: &Attributes) -> Result<Vec<RegionAndRange>> {
    let region = attrs.optional_string("region");
    let sign: Option<Sign> = attrs.optional("sign").map(str::parse).transpose()?;
    let sign = sign.unwrap_or_default();
    let note = attrs.optional_string("note");
    match (attrs.optional("min"), attrs.optional("times")) {
        (Some(_), None) => {
            let min = attrs.required_int(element, "min")?;
            let max = attrs.optional_int(element, "max")?.unwrap_or(min);
            Ok(vec![RegionAndRange::new(region, min, max, sign, note)?])
        }
        (None, Some(times)) => {
            let pieces = split_ranges(times).map_err(|e| match e {
                TimecourseError::IllegalArgument(message) => TimecourseError::format(message),
                other => other,
            })?;
            pieces
                .iter()
                .map(|piece| RegionAndRange::from_spec(region.clone(), piece, sign, note.clone()))
                .collect()
        }
        _ => Err(TimecourseError::format(format!(
            "<{element}> needs exactly one of 'min' or 'times'"
        ))),
    }
}

#[derive(Debug, Default)]
struct Session {
    data: Option<TemporalInputRangeData>,
    entry: Option<usize>,
}

// ------------- TemporalInputRangeFormatFactory -------------
pub struct TemporalInputRangeFormatFactory {
    store: Arc<DataStore>,
    keywords: KeywordSet,
    ranges: RangeWorker,
    entry_maps: LegacyMapWorker,
    source_maps: LegacyMapWorker,
    session: Session,
}

impl TemporalInputRangeFormatFactory {
    pub fn new(store: Arc<DataStore>, options: FactoryOptions) -> Self {
        let ranges = RangeWorker::new();
        let entry_maps = LegacyMapWorker::new(TEMPORAL_ENTRY_MAP, options.legacy_maps_allowed);
        let source_maps = LegacyMapWorker::new(TEMPORAL_SOURCE_MAP, options.legacy_maps_allowed);
        let mut names = vec![E::Dataset.tag(), E::Entry.tag()];
        names.extend(ranges.keywords());
        names.extend(entry_maps.keywords());
        names.extend(source_maps.keywords());
        Self {
            store,
            keywords: keyword_set(&names),
            ranges,
            entry_maps,
            source_maps,
            session: Session::default(),
        }
    }

    fn data_mut(&mut self, element: E) -> Result<&mut TemporalInputRangeData> {
        self.session.data.as_mut().ok_or_else(|| {
            TimecourseError::format(format!(
                "<{}> appears outside of a <{}> dataset",
                element.tag(),
                E::Dataset.tag()
            ))
        })
    }

    fn process_map(&mut self, name: &str, attrs: &Attributes) -> Result<Option<E>> {
        let worker = if self.entry_maps.handles(name) { &mut self.entry_maps } else { &mut self.source_maps };
        let element = worker.process_element(name, attrs)?;
        if self.session.data.is_none() || self.session.entry.is_some() {
            return Err(TimecourseError::format(format!("<{name}> is not allowed here")));
        }
        Ok(element.map(E::Map))
    }

    fn start_entry(&mut self, attrs: &Attributes) -> Result<()> {
        let element = E::Entry.tag();
        if self.session.entry.is_some() {
            return Err(TimecourseError::format(format!("<{element}> elements may not nest")));
        }
        let entry = TemporalRange::new(
            attrs.required(element, "name")?,
            attrs.optional_string("note"),
            attrs.yes_no(element, "internalOnly", false)?,
        )?;
        let position = self.data_mut(E::Entry)?.add_entry(entry)?;
        self.session.entry = Some(position);
        Ok(())
    }

    fn finish_dataset(&mut self) -> Result<()> {
        let Some(data) = self.session.data.take() else {
            return Ok(());
        };
        self.reset();
        let entry_maps = data.entry_maps().clone();
        let source_maps = data.source_maps().clone();
        info!(entries = data.entries().len(), "temporal input range dataset registered");
        self.store.set(data)?;
        if !entry_maps.is_empty() || !source_maps.is_empty() {
            self.store.merge_data_maps(|all| {
                all.temporal_entry.extend(entry_maps);
                all.temporal_source.extend(source_maps);
            })?;
        }
        Ok(())
    }
}

impl Glue<InputTimeRange> for TemporalInputRangeFormatFactory {
    fn glue(&mut self, built: InputTimeRange) -> Result<()> {
        let element = E::Range(RangeElement::InputTimeRange);
        let position = self.session.entry.ok_or_else(|| {
            TimecourseError::format(format!(
                "<{}> appears outside of a <{}>",
                element.tag(),
                E::Entry.tag()
            ))
        })?;
        let entry = self
            .data_mut(element)?
            .entry_at_mut(position)
            .ok_or_else(|| TimecourseError::format("Temporal range closed before its inputs"))?;
        debug!(entry = entry.name(), input = built.name(), ranges = built.ranges().len(), "input time range closed");
        entry.add_time_range(built)
    }
}

impl Glue<CompletedMap> for TemporalInputRangeFormatFactory {
    fn glue(&mut self, built: CompletedMap) -> Result<()> {
        let data = self.data_mut(E::Map(MapElement::Map(built.tag)))?;
        if built.tag == TEMPORAL_ENTRY_MAP {
            data.attach_entry_map(built.key, built.entries);
        } else {
            data.attach_source_map(built.key, built.entries);
        }
        Ok(())
    }
}

impl FormatFactory for TemporalInputRangeFormatFactory {
    type Element = TemporalInputElement;

    fn keywords_of_interest(&self) -> &KeywordSet {
        &self.keywords
    }

    fn process_element(&mut self, name: &str, attrs: &Attributes) -> Result<Option<E>> {
        if name.is_empty() || !self.keywords.contains(name) {
            return Ok(None);
        }
        if self.entry_maps.handles(name) || self.source_maps.handles(name) {
            return self.process_map(name, attrs);
        }
        if self.entry_maps.is_open() || self.source_maps.is_open() {
            return Err(TimecourseError::format(format!("<{name}> may not appear inside a legacy map")));
        }
        if self.ranges.handles(name) {
            if self.session.entry.is_none() {
                return Err(TimecourseError::format(format!(
                    "<{name}> appears outside of a <{}>",
                    E::Entry.tag()
                )));
            }
            return Ok(self.ranges.process_element(name, attrs)?.map(E::Range));
        }
        if name == E::Dataset.tag() {
            if self.session.data.is_some() {
                return Err(TimecourseError::format(format!("<{name}> may not nest")));
            }
            self.reset();
            self.session.data = Some(TemporalInputRangeData::new());
            return Ok(Some(E::Dataset));
        }
        if name == E::Entry.tag() {
            self.start_entry(attrs)?;
            return Ok(Some(E::Entry));
        }
        // only a stray useEntry is left
        Err(TimecourseError::format(format!("<{name}> appears outside of a legacy map")))
    }

    fn finish_element(&mut self, name: &str) -> Result<bool> {
        if !self.keywords.contains(name) {
            return Ok(false);
        }
        if let Some(map) = self.entry_maps.finish_element(name) {
            self.glue(map)?;
        } else if let Some(map) = self.source_maps.finish_element(name) {
            self.glue(map)?;
        } else if let Some(input) = self.ranges.finish_element(name) {
            self.glue(input)?;
        } else if name == E::Entry.tag() {
            self.session.entry = None;
        } else if name == E::Dataset.tag() {
            self.finish_dataset()?;
        }
        Ok(true)
    }

    fn reset(&mut self) {
        self.session = Session::default();
        self.ranges.reset();
        self.entry_maps.reset();
        self.source_maps.reset();
    }
}
