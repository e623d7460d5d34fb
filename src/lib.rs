//! Timecourse – streaming, validating builders for developmental gene expression datasets.
//!
//! Three kinds of dataset are read from nested element documents:
//! * [`timecourse::TimeCourseData`] – per gene expression observations over
//!   `(time, region)` points, with perturbed and simulated variants, the region
//!   lineage and the time-indexed region topology.
//! * [`temporal::TemporalInputRangeData`] – per gene, the intervals during which
//!   each input acts on it ([`range::TemporalRange`] → [`range::InputTimeRange`]
//!   → [`range::RegionAndRange`]).
//! * [`copies::CopiesPerEmbryoData`] – absolute transcript counts per gene and time.
//!
//! ## Builders
//! Each dataset has a format factory implementing [`factory::FormatFactory`]. The
//! [`reader`] drives a factory from XML text, forwarding only the elements the
//! factory declared interest in. Factories validate what a grammar cannot: every
//! gene has to reproduce the dataset's template (see [`template`]), legacy name
//! maps are rejected unless the [`factory::FactoryOptions`] allow them, and a
//! time-course dataset may not change its serial number underneath a parse.
//! A dataset is handed to the [`store::DataStore`] only once its root element closes.
//!
//! ## Undo
//! Mutating operations on the datasets return change records
//! ([`change::TimeCourseChange`], [`change::CopiesPerEmbryoChange`]) holding the
//! original and new value of every field they touched; [`change::Undoable`]
//! replays either side.
//!
//! ## Quick Start
//! ```
//! use std::sync::Arc;
//! use timecourse::{factory::FactoryOptions, reader::load_temporal_input, store::DataStore};
//! let store = Arc::new(DataStore::default());
//! let xml = r#"<temporalInputs>
//!   <temporalRange name="geneA">
//!     <inputTimeRange name="inputX"><range region="foo" min="3" max="5"/></inputTimeRange>
//!   </temporalRange>
//! </temporalInputs>"#;
//! let data = load_temporal_input(&store, xml, FactoryOptions::modern()).unwrap();
//! assert_eq!(data.range("GENEA").unwrap().time_ranges().len(), 1);
//! ```

pub mod attributes;
pub mod change;
pub mod copies;
pub mod copies_format;
pub mod error;
pub mod factory;
pub mod keys;
pub mod maps;
pub mod markup;
pub mod range;
pub mod reader;
pub mod settings;
pub mod store;
pub mod template;
pub mod temporal;
pub mod temporal_format;
pub mod timeaxis;
pub mod timecourse;
pub mod timecourse_format;
pub mod topology;
