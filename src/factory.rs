//! The contract shared by every streaming dataset builder.
//!
//! A factory receives a flat, properly nested stream of start and end events
//! from a document driver (see [`crate::reader`]). Each factory declares the
//! element names it responds to; the driver forwards only those. Construction is
//! one-shot and forward-only: an object attached to its parent is never detached
//! again during the same parse, and any event that has no legal owner in the
//! current construction context fails the whole parse.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::error::Result;
use crate::keys::KeywordSet;

/// Immutable builder configuration, fixed when a factory is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryOptions {
    /// Legacy name-map elements are accepted (otherwise they fail the parse).
    pub legacy_maps_allowed: bool,
    /// The time-course root must carry a base serial number.
    pub serial_number_required: bool,
    /// Older grammar: regions are optional on observations and lineage /
    /// topology elements are not part of the document.
    pub legacy_grammar: bool,
    /// The time-course dataset goes to the store's meta slot.
    pub meta_dataset: bool,
}

impl FactoryOptions {
    pub fn modern() -> Self {
        Self {
            legacy_maps_allowed: false,
            serial_number_required: true,
            legacy_grammar: false,
            meta_dataset: false,
        }
    }
    pub fn legacy() -> Self {
        Self {
            legacy_maps_allowed: true,
            serial_number_required: false,
            legacy_grammar: true,
            meta_dataset: false,
        }
    }
    pub fn for_meta(self) -> Self {
        Self { meta_dataset: true, ..self }
    }
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self::modern()
    }
}

pub trait FormatFactory {
    /// Names the construction rule that handled an element.
    type Element: Copy + fmt::Debug;

    fn keywords_of_interest(&self) -> &KeywordSet;

    /// Side-effecting build step. An empty name is a no-op and yields `None`.
    fn process_element(&mut self, name: &str, attrs: &Attributes) -> Result<Option<Self::Element>>;

    /// Side-effecting close step; returns whether `name` is one of ours.
    fn finish_element(&mut self, name: &str) -> Result<bool>;

    /// Character data is not part of any of the grammars.
    fn process_characters(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    /// Drops whatever a failed parse left half built.
    fn reset(&mut self);
}

/// Receives what a reusable sub-builder finished and attaches it to the
/// parent's current object.
pub trait Glue<T> {
    fn glue(&mut self, built: T) -> Result<()>;
}
