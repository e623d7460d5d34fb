//! Streaming builder for time-course documents.
//!
//! Construction context: the dataset being built, the open gene and which of its
//! blocks (plain, perturbed, control, simulation) receives `data` elements, the
//! open lineage block and the open topology or location block.

use std::sync::Arc;

use tracing::debug;

use crate::attributes::Attributes;
use crate::error::{Result, TimecourseError};
use crate::factory::{FactoryOptions, FormatFactory, Glue};
use crate::keys::{keyword_set, KeywordSet};
use crate::maps::{CompletedMap, LegacyMapWorker, MapElement, USE_ENTRY};
use crate::store::{DataStore, Dataset};
use crate::template::{empty_template, verify_template, GeneTemplateEntry};
use crate::timecourse::{
    ExpressionEntry, ExpressionLevel, ExpressionSource, SerialNumbers, TimeCourseData, TimeCourseGene,
};
use crate::topology::{RegionTopology, TopoLink, TopoRegionLoc, TopoTimeRange};

pub const TIME_COURSE_MAP: &str = "tcMap";

// ------------- TimeCourseElement -------------
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeCourseElement {
    Dataset,
    Gene,
    Data,
    Perturbed,
    Control,
    Simulation,
    Hierarchy,
    RegionParent,
    RegionRoot,
    Topologies,
    Topology,
    TopoRegion,
    TopoLink,
    Locations,
    RegionLoc,
    Map(MapElement),
}

const CORE: [TimeCourseElement; 6] = [
    TimeCourseElement::Dataset,
    TimeCourseElement::Gene,
    TimeCourseElement::Data,
    TimeCourseElement::Perturbed,
    TimeCourseElement::Control,
    TimeCourseElement::Simulation,
];
const LINEAGE_AND_TOPOLOGY: [TimeCourseElement; 9] = [
    TimeCourseElement::Hierarchy,
    TimeCourseElement::RegionParent,
    TimeCourseElement::RegionRoot,
    TimeCourseElement::Topologies,
    TimeCourseElement::Topology,
    TimeCourseElement::TopoRegion,
    TimeCourseElement::TopoLink,
    TimeCourseElement::Locations,
    TimeCourseElement::RegionLoc,
];

impl TimeCourseElement {
    pub fn tag(self) -> &'static str {
        match self {
            TimeCourseElement::Dataset => "timeCourseData",
            TimeCourseElement::Gene => "timeCourse",
            TimeCourseElement::Data => "data",
            TimeCourseElement::Perturbed => "perturbed",
            TimeCourseElement::Control => "control",
            TimeCourseElement::Simulation => "simData",
            TimeCourseElement::Hierarchy => "regionHierarchy",
            TimeCourseElement::RegionParent => "regionParent",
            TimeCourseElement::RegionRoot => "regionRoot",
            TimeCourseElement::Topologies => "regionTopologies",
            TimeCourseElement::Topology => "regionTopology",
            TimeCourseElement::TopoRegion => "topoRegion",
            TimeCourseElement::TopoLink => "topoLink",
            TimeCourseElement::Locations => "topoLocations",
            TimeCourseElement::RegionLoc => "topoRegionLoc",
            TimeCourseElement::Map(MapElement::Map(tag)) => tag,
            TimeCourseElement::Map(MapElement::UseEntry) => USE_ENTRY,
        }
    }
    /// Resolves the dataset's own element names; map elements are not included.
    pub fn from_tag(name: &str) -> Option<Self> {
        CORE.iter()
            .chain(LINEAGE_AND_TOPOLOGY.iter())
            .copied()
            .find(|e| e.tag() == name)
    }
}

use TimeCourseElement as E;

// which list of the open gene receives `data`
#[derive(Clone, Debug, PartialEq, Eq)]
enum Block {
    Plain,
    Perturbed(String),
    Control(String),
    Simulation(String),
}

#[derive(Debug, Default)]
struct Session {
    data: Option<TimeCourseData>,
    observed_serial: Option<u64>,
    canonical: Option<Vec<GeneTemplateEntry>>,
    gene: Option<usize>,
    block: Option<Block>,
    in_hierarchy: bool,
    in_topologies: bool,
    topology: Option<TopoTimeRange>,
    locations: Option<TopoTimeRange>,
}

impl Session {
    fn data_mut(&mut self, element: E) -> Result<&mut TimeCourseData> {
        self.data.as_mut().ok_or_else(|| {
            TimecourseError::format(format!(
                "<{}> appears outside of a <{}> dataset",
                element.tag(),
                E::Dataset.tag()
            ))
        })
    }
    fn gene_mut(&mut self, element: E) -> Result<&mut TimeCourseGene> {
        let position = self.gene.ok_or_else(|| outside(element, E::Gene))?;
        self.data_mut(element)?
            .gene_at_mut(position)
            .ok_or_else(|| outside(element, E::Gene))
    }
    fn in_gene_level_block(&self) -> bool {
        self.gene.is_some() || self.in_hierarchy || self.in_topologies
    }
}

fn outside(element: E, owner: E) -> TimecourseError {
    TimecourseError::format(format!("<{}> appears outside of a <{}>", element.tag(), owner.tag()))
}

// ------------- TimeCourseFormatFactory -------------
pub struct TimeCourseFormatFactory {
    store: Arc<DataStore>,
    options: FactoryOptions,
    keywords: KeywordSet,
    maps: LegacyMapWorker,
    session: Session,
}

impl TimeCourseFormatFactory {
    pub fn new(store: Arc<DataStore>, options: FactoryOptions) -> Self {
        let maps = LegacyMapWorker::new(TIME_COURSE_MAP, options.legacy_maps_allowed);
        let mut names: Vec<&'static str> = CORE.iter().map(|e| e.tag()).collect();
        if !options.legacy_grammar {
            names.extend(LINEAGE_AND_TOPOLOGY.iter().map(|e| e.tag()));
        }
        names.extend(maps.keywords());
        Self {
            store,
            options,
            keywords: keyword_set(&names),
            maps,
            session: Session::default(),
        }
    }
    pub fn options(&self) -> FactoryOptions {
        self.options
    }

    fn start_dataset(&mut self, attrs: &Attributes) -> Result<()> {
        if self.session.data.is_some() {
            return Err(TimecourseError::format(format!("<{}> may not nest", E::Dataset.tag())));
        }
        let element = E::Dataset.tag();
        let parsed = attrs.optional_serial(element, "serialNum")?;
        if parsed.is_none() && self.options.serial_number_required {
            return Err(TimecourseError::format(format!(
                "<{element}> is missing required attribute 'serialNum'"
            )));
        }
        let serials = SerialNumbers {
            base: parsed.unwrap_or(0),
            lineage: attrs.optional_serial(element, "lineageSerialNum")?.unwrap_or(0),
            topology: attrs.optional_serial(element, "topoSerialNum")?.unwrap_or(0),
            maps: attrs.optional_serial(element, "mapSerialNum")?.unwrap_or(0),
        };
        self.reset();
        let registered = self.store.time_course_in(self.options.meta_dataset)?;
        let data = match registered {
            Some(existing) => {
                if let Some(parsed) = parsed {
                    if parsed != existing.serial_number() {
                        return Err(TimecourseError::StaleVersion {
                            dataset: TimeCourseData::KIND,
                            expected: parsed,
                            found: existing.serial_number(),
                        });
                    }
                }
                self.session.observed_serial = Some(existing.serial_number());
                if !existing.genes().is_empty() {
                    self.session.canonical = Some(existing.template());
                }
                existing
            }
            None => TimeCourseData::new(serials),
        };
        self.session.data = Some(data);
        Ok(())
    }

    fn start_gene(&mut self, attrs: &Attributes) -> Result<()> {
        let element = E::Gene.tag();
        if self.session.in_gene_level_block() {
            return Err(TimecourseError::format(format!("<{element}> is not allowed here")));
        }
        let gene = TimeCourseGene::new(
            attrs.required(element, "gene")?,
            attrs.yes_no(element, "internalOnly", false)?,
            attrs.optional_string("note"),
        )?;
        let position = self.session.data_mut(E::Gene)?.attach_gene(gene)?;
        self.session.gene = Some(position);
        self.session.block = Some(Block::Plain);
        Ok(())
    }

    fn expression_entry(&self, attrs: &Attributes) -> Result<ExpressionEntry> {
        let element = E::Data.tag();
        let time = attrs.required_int(element, "time")?;
        let region = if self.options.legacy_grammar {
            attrs.optional_string("region")
        } else {
            Some(attrs.required(element, "region")?.to_owned())
        };
        let level: ExpressionLevel = attrs.required(element, "expr")?.parse()?;
        let value = attrs.optional_float(element, "value")?;
        let source: Option<ExpressionSource> =
            attrs.optional("source").map(str::parse).transpose()?;
        ExpressionEntry::new(region, time, level, value, source)
    }

    fn add_data(&mut self, attrs: &Attributes) -> Result<()> {
        let entry = self.expression_entry(attrs)?;
        let block = self.session.block.clone().ok_or_else(|| outside(E::Data, E::Gene))?;
        let gene = self.session.gene_mut(E::Data)?;
        match block {
            Block::Plain => gene.add_entry(entry),
            Block::Perturbed(key) => gene
                .perturbation_mut(&key)
                .ok_or_else(|| outside(E::Data, E::Perturbed))?
                .add_entry(entry),
            Block::Control(key) => gene
                .perturbation_mut(&key)
                .ok_or_else(|| outside(E::Data, E::Control))?
                .add_control_entry(entry),
            Block::Simulation(key) => gene
                .simulation_mut(&key)
                .ok_or_else(|| outside(E::Data, E::Simulation))?
                .push(entry),
        }
        Ok(())
    }

    fn start_block(&mut self, element: E, attrs: &Attributes) -> Result<()> {
        let block = match (element, self.session.block.clone()) {
            (E::Perturbed, Some(Block::Plain)) => {
                let key = attrs.required(element.tag(), "key")?.to_owned();
                self.session.gene_mut(element)?.add_perturbation(&key)?;
                Block::Perturbed(key)
            }
            (E::Simulation, Some(Block::Plain)) => {
                let key = attrs.required(element.tag(), "key")?.to_owned();
                self.session.gene_mut(element)?.add_simulation(&key)?;
                Block::Simulation(key)
            }
            (E::Control, Some(Block::Perturbed(key))) => Block::Control(key),
            (E::Control, _) => return Err(outside(element, E::Perturbed)),
            (_, None) => return Err(outside(element, E::Gene)),
            (_, Some(_)) => {
                return Err(TimecourseError::format(format!(
                    "<{}> may not nest inside another data block",
                    element.tag()
                )));
            }
        };
        self.session.block = Some(block);
        Ok(())
    }

    fn finish_block(&mut self, element: E) {
        self.session.block = match (element, self.session.block.take()) {
            (E::Control, Some(Block::Control(key))) => Some(Block::Perturbed(key)),
            (E::Perturbed | E::Simulation, Some(_)) => Some(Block::Plain),
            (_, other) => other,
        };
    }

    fn finish_gene(&mut self) -> Result<()> {
        let Some(position) = self.session.gene.take() else {
            return Ok(());
        };
        self.session.block = None;
        let Some(gene) = self.session.data.as_ref().and_then(|d| d.gene_at(position)) else {
            return Ok(());
        };
        let candidate = gene.template();
        match &self.session.canonical {
            Some(canonical) => {
                verify_template(canonical, &candidate, gene.name(), self.store.time_axis())?;
            }
            None => {
                if candidate.is_empty() {
                    return Err(empty_template(gene.name()));
                }
                debug!(gene = gene.name(), points = candidate.len(), "template established");
                self.session.canonical = Some(candidate);
                return Ok(());
            }
        }
        debug!(gene = gene.name(), "time course gene closed");
        Ok(())
    }

    fn start_hierarchy(&mut self) -> Result<()> {
        if self.session.in_gene_level_block() {
            return Err(TimecourseError::format(format!(
                "<{}> is not allowed here",
                E::Hierarchy.tag()
            )));
        }
        self.session.data_mut(E::Hierarchy)?;
        self.session.in_hierarchy = true;
        Ok(())
    }

    fn add_lineage(&mut self, element: E, attrs: &Attributes) -> Result<()> {
        let region = attrs.required(element.tag(), "region")?.to_owned();
        if !self.session.in_hierarchy {
            return Err(outside(element, E::Hierarchy));
        }
        if element == E::RegionRoot {
            self.session.data_mut(element)?.attach_region_root(region);
            return Ok(());
        }
        let parent = attrs.required(element.tag(), "parent")?.to_owned();
        let data = self.session.data_mut(element)?;
        if data.group_parent(&region).is_some() {
            return Err(TimecourseError::format(format!(
                "Region '{region}' is given more than one parent"
            )));
        }
        data.attach_region_parent(region, parent);
        Ok(())
    }

    fn start_topologies(&mut self) -> Result<()> {
        if self.session.in_gene_level_block() {
            return Err(TimecourseError::format(format!(
                "<{}> is not allowed here",
                E::Topologies.tag()
            )));
        }
        self.session.data_mut(E::Topologies)?;
        self.session.in_topologies = true;
        Ok(())
    }

    fn time_range(element: E, attrs: &Attributes) -> Result<TopoTimeRange> {
        TopoTimeRange::new(
            attrs.required_int(element.tag(), "minTime")?,
            attrs.required_int(element.tag(), "maxTime")?,
        )
    }

    fn start_range_block(&mut self, element: E, attrs: &Attributes) -> Result<()> {
        if !self.session.in_topologies {
            return Err(outside(element, E::Topologies));
        }
        if self.session.topology.is_some() || self.session.locations.is_some() {
            return Err(TimecourseError::format(format!("<{}> is not allowed here", element.tag())));
        }
        let range = Self::time_range(element, attrs)?;
        let data = self.session.data_mut(element)?;
        if element == E::Topology {
            data.attach_topology(RegionTopology::new(range))?;
            self.session.topology = Some(range);
        } else {
            data.locator_mut().open_range(range);
            self.session.locations = Some(range);
        }
        Ok(())
    }

    fn add_topology_member(&mut self, element: E, attrs: &Attributes) -> Result<()> {
        let range = self.session.topology.ok_or_else(|| outside(element, E::Topology))?;
        let topology = self
            .session
            .data_mut(element)?
            .topology_mut(&range)
            .ok_or_else(|| outside(element, E::Topology))?;
        if element == E::TopoRegion {
            let name = attrs.required(element.tag(), "name")?;
            if !topology.add_region(name) {
                return Err(TimecourseError::format(format!(
                    "Region '{name}' is declared twice in topology {range}"
                )));
            }
        } else {
            topology.add_link(TopoLink::new(
                attrs.required(element.tag(), "from")?,
                attrs.required(element.tag(), "to")?,
            ))?;
        }
        Ok(())
    }

    fn add_location(&mut self, attrs: &Attributes) -> Result<()> {
        let element = E::RegionLoc;
        let range = self.session.locations.ok_or_else(|| outside(element, E::Locations))?;
        let region = attrs.required(element.tag(), "region")?;
        let x = attrs.required_float(element.tag(), "x")?;
        let y = attrs.required_float(element.tag(), "y")?;
        let data = self.session.data_mut(element)?;
        let declared = data.topologies().get(&range).is_some_and(|t| t.has_region(region));
        if !declared {
            return Err(TimecourseError::format(format!(
                "Location given for region '{region}' which is not declared in topology {range}"
            )));
        }
        data.locator_mut().set_region_location(range, TopoRegionLoc::new(region, x, y));
        Ok(())
    }

    fn finish_dataset(&mut self) -> Result<()> {
        let Some(data) = self.session.data.take() else {
            return Ok(());
        };
        let observed = self.session.observed_serial;
        self.reset();
        let maps = data.maps().clone();
        self.store.publish_time_course(self.options.meta_dataset, data, observed)?;
        if !maps.is_empty() {
            self.store.merge_data_maps(|all| all.time_course.extend(maps))?;
        }
        Ok(())
    }
}

impl Glue<CompletedMap> for TimeCourseFormatFactory {
    fn glue(&mut self, built: CompletedMap) -> Result<()> {
        let element = E::Map(MapElement::Map(built.tag));
        self.session.data_mut(element)?.attach_map(built.key, built.entries);
        Ok(())
    }
}

impl FormatFactory for TimeCourseFormatFactory {
    type Element = TimeCourseElement;

    fn keywords_of_interest(&self) -> &KeywordSet {
        &self.keywords
    }

    fn process_element(&mut self, name: &str, attrs: &Attributes) -> Result<Option<E>> {
        if name.is_empty() || !self.keywords.contains(name) {
            return Ok(None);
        }
        if self.maps.handles(name) {
            // illegal legacy maps are rejected before anything else is looked at
            let element = self.maps.process_element(name, attrs)?;
            if self.session.data.is_none() || self.session.in_gene_level_block() {
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
            // a stray useEntry with no map open
            return Err(TimecourseError::format(format!(
                "<{name}> appears outside of a <{}> map",
                self.maps.map_tag()
            )));
        };
        match element {
            E::Dataset => self.start_dataset(attrs)?,
            E::Gene => self.start_gene(attrs)?,
            E::Data => self.add_data(attrs)?,
            E::Perturbed | E::Control | E::Simulation => self.start_block(element, attrs)?,
            E::Hierarchy => self.start_hierarchy()?,
            E::RegionParent | E::RegionRoot => self.add_lineage(element, attrs)?,
            E::Topologies => self.start_topologies()?,
            E::Topology | E::Locations => self.start_range_block(element, attrs)?,
            E::TopoRegion | E::TopoLink => self.add_topology_member(element, attrs)?,
            E::RegionLoc => self.add_location(attrs)?,
            E::Map(_) => return Ok(None),
        }
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
            Some(element @ (E::Perturbed | E::Control | E::Simulation)) => self.finish_block(element),
            Some(E::Hierarchy) => self.session.in_hierarchy = false,
            Some(E::Topologies) => self.session.in_topologies = false,
            Some(E::Topology) => self.session.topology = None,
            Some(E::Locations) => self.session.locations = None,
            _ => (),
        }
        Ok(true)
    }

    fn reset(&mut self) {
        self.session = Session::default();
        self.maps.reset();
    }
}
