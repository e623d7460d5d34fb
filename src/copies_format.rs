//! Streaming builder for copies-per-embryo documents.

use std::sync::Arc;

use tracing::{debug, info};

use crate::attributes::Attributes;
use crate::copies::{CopiesPerEmbryoData, CopiesPerEmbryoGene};
use crate::error::{Result, TimecourseError};
use crate::factory::{FactoryOptions, FormatFactory, Glue};
use crate::keys::{keyword_set, KeywordSet};
use crate::maps::{CompletedMap, LegacyMapWorker, MapElement, USE_ENTRY};
use crate::store::DataStore;
use crate::template::{empty_template, verify_template, GeneTemplateEntry};

pub const COPIES_PER_EMBRYO_MAP: &str = "cpeMap";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CopiesPerEmbryoElement {
    Dataset,
    DefaultTimes,
    Time,
    Gene,
    Count,
    Map(MapElement),
}

const OWN: [CopiesPerEmbryoElement; 5] = [
    CopiesPerEmbryoElement::Dataset,
    CopiesPerEmbryoElement::DefaultTimes,
    CopiesPerEmbryoElement::Time,
    CopiesPerEmbryoElement::Gene,
    CopiesPerEmbryoElement::Count,
];

impl CopiesPerEmbryoElement {
    pub fn tag(self) -> &'static str {
        match self {
            CopiesPerEmbryoElement::Dataset => "copiesPerEmbryo",
            CopiesPerEmbryoElement::DefaultTimes => "defaultTimes",
            CopiesPerEmbryoElement::Time => "time",
            CopiesPerEmbryoElement::Gene => "copies",
            CopiesPerEmbryoElement::Count => "count",
            CopiesPerEmbryoElement::Map(MapElement::Map(tag)) => tag,
            CopiesPerEmbryoElement::Map(MapElement::UseEntry) => USE_ENTRY,
        }
    }
    pub fn from_tag(name: &str) -> Option<Self> {
        OWN.iter().copied().find(|e| e.tag() == name)
    }
}

use CopiesPerEmbryoElement as E;

#[derive(Debug, Default)]
struct Session {
    data: Option<CopiesPerEmbryoData>,
    canonical: Option<Vec<GeneTemplateEntry>>,
    gene: Option<usize>,
    in_default_times: bool,
}

impl Session {
    fn data_mut(&mut self, element: E) -> Result<&mut CopiesPerEmbryoData> {
        self.data.as_mut().ok_or_else(|| outside(element, E::Dataset))
    }
}

fn outside(element: E, owner: E) -> TimecourseError {
    TimecourseError::format(format!("<{}> appears outside of a <{}>", element.tag(), owner.tag()))
}

// ------------- CopiesPerEmbryoFormatFactory -------------
pub struct CopiesPerEmbryoFormatFactory {
    store: Arc<DataStore>,
    keywords: KeywordSet,
    maps: LegacyMapWorker,
    session: Session,
}

impl CopiesPerEmbryoFormatFactory {
    pub fn new(store: Arc<DataStore>, options: FactoryOptions) -> Self {
        let maps = LegacyMapWorker::new(COPIES_PER_EMBRYO_MAP, options.legacy_maps_allowed);
        let mut names: Vec<&'static str> = OWN.iter().map(|e| e.tag()).collect();
        names.extend(maps.keywords());
        Self { store, keywords: keyword_set(&names), maps, session: Session::default() }
    }

    fn start(&mut self, element: E, attrs: &Attributes) -> Result<()> {
        let busy = self.session.gene.is_some() || self.session.in_default_times;
        match element {
            E::Dataset => {
                if self.session.data.is_some() {
                    return Err(TimecourseError::format(format!("<{}> may not nest", element.tag())));
                }
                self.reset();
                self.session.data = Some(CopiesPerEmbryoData::new());
            }
            E::DefaultTimes => {
                if busy {
                    return Err(TimecourseError::format(format!("<{}> is not allowed here", element.tag())));
                }
                self.session.data_mut(element)?;
                self.session.in_default_times = true;
            }
            E::Time => {
                if !self.session.in_default_times {
                    return Err(outside(element, E::DefaultTimes));
                }
                let time = attrs.required_int(element.tag(), "value")?;
                self.session.data_mut(element)?.attach_default_time(time)?;
            }
            E::Gene => {
                if busy {
                    return Err(TimecourseError::format(format!("<{}> is not allowed here", element.tag())));
                }
                let gene = CopiesPerEmbryoGene::new(attrs.required(element.tag(), "gene")?)?;
                let position = self.session.data_mut(element)?.attach_gene(gene)?;
                self.session.gene = Some(position);
            }
            E::Count => {
                let position = self.session.gene.ok_or_else(|| outside(element, E::Gene))?;
                let time = attrs.required_int(element.tag(), "time")?;
                let count = attrs.required_float(element.tag(), "value")?;
                self.session
                    .data_mut(element)?
                    .gene_at_mut(position)
                    .ok_or_else(|| outside(element, E::Gene))?
                    .add_count(time, count)?;
            }
            E::Map(_) => (),
        }
        Ok(())
    }

    fn finish_gene(&mut self) -> Result<()> {
        let Some(position) = self.session.gene.take() else {
            return Ok(());
        };
        let Some(gene) = self.session.data.as_ref().and_then(|d| d.gene_at(position)) else {
            return Ok(());
        };
        let candidate = gene.template();
        match &self.session.canonical {
            Some(canonical) => {
                verify_template(canonical, &candidate, gene.name(), self.store.time_axis())?
            }
            None if candidate.is_empty() => return Err(empty_template(gene.name())),
            None => self.session.canonical = Some(candidate),
        }
        debug!(gene = gene.name(), "copies per embryo gene closed");
        Ok(())
    }

    fn finish_dataset(&mut self) -> Result<()> {
        let Some(data) = self.session.data.take() else {
            return Ok(());
        };
        self.reset();
        let maps = data.maps().clone();
        info!(genes = data.genes().len(), default_times = data.default_times().len(), "copies per embryo dataset registered");
        self.store.set(data)?;
        if !maps.is_empty() {
            self.store.merge_data_maps(|all| all.copies_per_embryo.extend(maps))?;
        }
        Ok(())
    }
}

impl Glue<CompletedMap> for CopiesPerEmbryoFormatFactory {
    fn glue(&mut self, built: CompletedMap) -> Result<()> {
        let element = E::Map(MapElement::Map(built.tag));
        self.session.data_mut(element)?.attach_map(built.key, built.entries);
        Ok(())
    }
}

impl FormatFactory for CopiesPerEmbryoFormatFactory {
    type Element = CopiesPerEmbryoElement;

    fn keywords_of_interest(&self) -> &KeywordSet {
        &self.keywords
    }

    fn process_element(&mut self, name: &str, attrs: &Attributes) -> Result<Option<E>> {
        if name.is_empty() || !self.keywords.contains(name) {
            return Ok(None);
        }
        if self.maps.handles(name) {
            let element = self.maps.process_element(name, attrs)?;
            if self.session.data.is_none() || self.session.gene.is_some() || self.session.in_default_times {
                return Err(TimecourseError::format(format!("<{name}> is not allowed here")));
            }
            return Ok(element.map(E::Map));
        }
        if self.maps.is_open() {
            return Err(TimecourseError::format(format!(
                "<{name}> may not appear inside a <{}> map",
                self.maps.map_tag()
            )));
        }
        let Some(element) = E::from_tag(name) else {
            return Err(TimecourseError::format(format!(
                "<{name}> appears outside of a <{}> map",
                self.maps.map_tag()
            )));
        };
        self.start(element, attrs)?;
        Ok(Some(element))
    }

    fn finish_element(&mut self, name: &str) -> Result<bool> {
        if !self.keywords.contains(name) {
            return Ok(false);
        }
        if let Some(map) = self.maps.finish_element(name) {
            self.glue(map)?;
            return Ok(true);
        }
        match E::from_tag(name) {
            Some(E::Dataset) => self.finish_dataset()?,
            Some(E::Gene) => self.finish_gene()?,
            Some(E::DefaultTimes) => self.session.in_default_times = false,
            _ => (),
        }
        Ok(true)
    }

    fn reset(&mut self) {
        self.session = Session::default();
        self.maps.reset();
    }
}
