//! Drives a [`FormatFactory`] from XML text.
//!
//! Only elements in the factory's interest set are forwarded; everything else is
//! skipped, along with its attributes and character data. An empty element
//! produces a start and an end event. The first error aborts the read and the factory is reset, so no
//! half-built dataset ever reaches the store.

use std::str;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use tracing::{debug, warn};

use crate::attributes::Attributes;
use crate::copies::CopiesPerEmbryoData;
use crate::copies_format::{CopiesPerEmbryoElement, CopiesPerEmbryoFormatFactory};
use crate::error::{Result, TimecourseError};
use crate::factory::{FactoryOptions, FormatFactory};
use crate::store::DataStore;
use crate::temporal::TemporalInputRangeData;
use crate::temporal_format::{TemporalInputElement, TemporalInputRangeFormatFactory};
use crate::timecourse::TimeCourseData;
use crate::timecourse_format::{TimeCourseElement, TimeCourseFormatFactory};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadSummary {
    pub root: Option<String>,
    pub elements: usize,
    pub handled: usize,
    pub skipped: usize,
}

pub fn read_document<F: FormatFactory>(xml: &str, factory: &mut F) -> Result<ReadSummary> {
    factory.reset();
    match drive(xml, factory) {
        Ok(summary) => {
            debug!(root = ?summary.root, handled = summary.handled, skipped = summary.skipped, "document read");
            Ok(summary)
        }
        Err(e) => {
            warn!(error = %e, "document rejected");
            factory.reset();
            Err(e)
        }
    }
}

fn drive<F: FormatFactory>(xml: &str, factory: &mut F) -> Result<ReadSummary> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut summary = ReadSummary::default();
    let mut open: Vec<String> = Vec::new();
    loop {
        let event = reader.read_event().map_err(|e| TimecourseError::Document {
            message: e.to_string(),
            position: Some(reader.error_position() as u64),
        })?;
        match event {
            Event::Start(e) => {
                open.push(start(factory, &e, &mut summary)?);
            }
            Event::Empty(e) => {
                let name = start(factory, &e, &mut summary)?;
                end(factory, &name)?;
            }
            Event::End(e) => {
                let name = str::from_utf8(e.name().as_ref())?.to_owned();
                open.pop();
                end(factory, &name)?;
            }
            // character data inside skipped elements is never decoded
            Event::Text(text) => {
                let wanted = open
                    .last()
                    .is_some_and(|name| factory.keywords_of_interest().contains(name.as_str()));
                if wanted {
                    factory.process_characters(&text.unescape()?)?;
                }
            }
            Event::Eof => break,
            _ => (),
        }
    }
    Ok(summary)
}

fn start<F: FormatFactory>(factory: &mut F, e: &BytesStart, summary: &mut ReadSummary) -> Result<String> {
    let name = str::from_utf8(e.name().as_ref())?.to_owned();
    summary.elements += 1;
    if summary.root.is_none() {
        summary.root = Some(name.clone());
    }
    if !factory.keywords_of_interest().contains(name.as_str()) {
        summary.skipped += 1;
        return Ok(name);
    }
    let attrs = attributes_of(e)?;
    if factory.process_element(&name, &attrs)?.is_some() {
        summary.handled += 1;
    }
    Ok(name)
}

fn end<F: FormatFactory>(factory: &mut F, name: &str) -> Result<()> {
    if factory.keywords_of_interest().contains(name) {
        factory.finish_element(name)?;
    }
    Ok(())
}

fn attributes_of(e: &BytesStart) -> Result<Attributes> {
    let mut attributes = Attributes::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = str::from_utf8(attr.key.as_ref())?;
        attributes.insert(key, attr.unescape_value()?.into_owned());
    }
    Ok(attributes)
}

// ------------- dataset kinds -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DatasetKind {
    TimeCourse,
    TemporalInput,
    CopiesPerEmbryo,
}

impl DatasetKind {
    pub fn root_tag(self) -> &'static str {
        match self {
            DatasetKind::TimeCourse => TimeCourseElement::Dataset.tag(),
            DatasetKind::TemporalInput => TemporalInputElement::Dataset.tag(),
            DatasetKind::CopiesPerEmbryo => CopiesPerEmbryoElement::Dataset.tag(),
        }
    }
}

/// Names the dataset a document holds, judging by its root element.
pub fn detect_dataset_kind(xml: &str) -> Result<DatasetKind> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                let name = str::from_utf8(e.name().as_ref())?.to_owned();
                return [DatasetKind::TimeCourse, DatasetKind::TemporalInput, DatasetKind::CopiesPerEmbryo]
                    .into_iter()
                    .find(|kind| kind.root_tag() == name)
                    .ok_or_else(|| TimecourseError::format(format!("<{name}> is not a known dataset root")));
            }
            Event::Eof => return Err(TimecourseError::format("Document has no root element")),
            _ => (),
        }
    }
}

// ------------- loaders -------------
pub fn load_time_course(store: &Arc<DataStore>, xml: &str, options: FactoryOptions) -> Result<TimeCourseData> {
    let mut factory = TimeCourseFormatFactory::new(Arc::clone(store), options);
    read_document(xml, &mut factory)?;
    store
        .time_course_in(options.meta_dataset)?
        .ok_or_else(|| missing_root(DatasetKind::TimeCourse))
}

pub fn load_temporal_input(
    store: &Arc<DataStore>,
    xml: &str,
    options: FactoryOptions,
) -> Result<TemporalInputRangeData> {
    let mut factory = TemporalInputRangeFormatFactory::new(Arc::clone(store), options);
    read_document(xml, &mut factory)?;
    store.get()?.ok_or_else(|| missing_root(DatasetKind::TemporalInput))
}

pub fn load_copies_per_embryo(
    store: &Arc<DataStore>,
    xml: &str,
    options: FactoryOptions,
) -> Result<CopiesPerEmbryoData> {
    let mut factory = CopiesPerEmbryoFormatFactory::new(Arc::clone(store), options);
    read_document(xml, &mut factory)?;
    store.get()?.ok_or_else(|| missing_root(DatasetKind::CopiesPerEmbryo))
}

fn missing_root(kind: DatasetKind) -> TimecourseError {
    TimecourseError::format(format!("Document has no <{}> dataset", kind.root_tag()))
}
