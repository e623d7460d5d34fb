//! Time-course expression data.
//!
//! A [`TimeCourseData`] holds one [`TimeCourseGene`] per gene, each listing
//! expression observations per `(time, region)`. All genes share one template:
//! the ordered grid of plain observations of the first gene. Alongside the genes
//! the dataset keeps the region lineage (group parents and roots), the
//! time-indexed region topology with its drawing locator, and legacy name maps.
//! Every category carries its own serial number, bumped by each mutation.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::attributes::yes_no;
use crate::change::{swap_map_entry, swap_positioned, TimeCourseChange, Undoable};
use crate::error::{Result, TimecourseError};
use crate::keys::normalize_key;
use crate::maps::{write_map_table, DataMapping, MapTable};
use crate::markup::MarkupWriter;
use crate::template::{empty_template, verify_template, GeneTemplateEntry};
use crate::timeaxis::TimeAxisDefinition;
use crate::timecourse_format::{TimeCourseElement as E, TIME_COURSE_MAP};
use crate::topology::{RegionTopology, TopoRegionLocator, TopoTimeRange};

// ------------- ExpressionLevel -------------
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpressionLevel {
    No,
    Weak,
    Yes,
    Varies,
    NoData,
}

impl ExpressionLevel {
    pub fn tag(self) -> &'static str {
        match self {
            ExpressionLevel::No => "no",
            ExpressionLevel::Weak => "weak",
            ExpressionLevel::Yes => "yes",
            ExpressionLevel::Varies => "varies",
            ExpressionLevel::NoData => "noData",
        }
    }
}
impl FromStr for ExpressionLevel {
    type Err = TimecourseError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "no" => Ok(ExpressionLevel::No),
            "weak" => Ok(ExpressionLevel::Weak),
            "yes" => Ok(ExpressionLevel::Yes),
            "varies" => Ok(ExpressionLevel::Varies),
            "noData" => Ok(ExpressionLevel::NoData),
            other => Err(TimecourseError::format(format!("Unknown expression level '{other}'"))),
        }
    }
}

// ------------- ExpressionSource -------------
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpressionSource {
    Maternal,
    Zygotic,
    Both,
}

impl ExpressionSource {
    pub fn tag(self) -> &'static str {
        match self {
            ExpressionSource::Maternal => "maternal",
            ExpressionSource::Zygotic => "zygotic",
            ExpressionSource::Both => "both",
        }
    }
}
impl FromStr for ExpressionSource {
    type Err = TimecourseError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "maternal" => Ok(ExpressionSource::Maternal),
            "zygotic" => Ok(ExpressionSource::Zygotic),
            "both" => Ok(ExpressionSource::Both),
            other => Err(TimecourseError::format(format!("Unknown expression source '{other}'"))),
        }
    }
}

// ------------- ExpressionEntry -------------
#[derive(Clone, Debug, PartialEq)]
pub struct ExpressionEntry {
    region: Option<String>,
    time: i32,
    level: ExpressionLevel,
    value: Option<f64>,
    source: Option<ExpressionSource>,
}

impl ExpressionEntry {
    /// `Varies` observations carry a value in `[0, 1]`; no other level carries one.
    pub fn new(
        region: Option<String>,
        time: i32,
        level: ExpressionLevel,
        value: Option<f64>,
        source: Option<ExpressionSource>,
    ) -> Result<Self> {
        match (level, value) {
            (ExpressionLevel::Varies, Some(v)) if (0.0..=1.0).contains(&v) => (),
            (ExpressionLevel::Varies, Some(v)) => {
                return Err(TimecourseError::format(format!(
                    "Variable expression value {v} at time {time} is outside [0, 1]"
                )));
            }
            (ExpressionLevel::Varies, None) => {
                return Err(TimecourseError::format(format!(
                    "Variable expression at time {time} needs a value"
                )));
            }
            (_, Some(_)) => {
                return Err(TimecourseError::format(format!(
                    "Only variable expression may carry a value (time {time}, level {})",
                    level.tag()
                )));
            }
            (_, None) => (),
        }
        Ok(Self { region, time, level, value, source })
    }
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
    pub fn time(&self) -> i32 {
        self.time
    }
    pub fn level(&self) -> ExpressionLevel {
        self.level
    }
    pub fn value(&self) -> Option<f64> {
        self.value
    }
    pub fn source(&self) -> Option<ExpressionSource> {
        self.source
    }
    pub fn template_entry(&self) -> GeneTemplateEntry {
        GeneTemplateEntry::new(self.time, self.region.clone())
    }
}

// ------------- PerturbedTimeCourse -------------
#[derive(Clone, Debug, PartialEq)]
pub struct PerturbedTimeCourse {
    key: String,
    data: Vec<ExpressionEntry>,
    control: Vec<ExpressionEntry>,
}

impl PerturbedTimeCourse {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), data: Vec::new(), control: Vec::new() }
    }
    pub fn key(&self) -> &str {
        &self.key
    }
    pub fn data(&self) -> &[ExpressionEntry] {
        &self.data
    }
    pub fn control(&self) -> &[ExpressionEntry] {
        &self.control
    }
    pub fn add_entry(&mut self, entry: ExpressionEntry) {
        self.data.push(entry);
    }
    pub fn add_control_entry(&mut self, entry: ExpressionEntry) {
        self.control.push(entry);
    }
}

// ------------- TimeCourseGene -------------
#[derive(Clone, Debug, PartialEq)]
pub struct TimeCourseGene {
    name: String,
    internal_only: bool,
    note: Option<String>,
    data: Vec<ExpressionEntry>,
    perturbations: Vec<PerturbedTimeCourse>,
    simulations: BTreeMap<String, Vec<ExpressionEntry>>,
}

impl TimeCourseGene {
    pub fn new(name: impl Into<String>, internal_only: bool, note: Option<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TimecourseError::format("Time course gene name may not be empty"));
        }
        Ok(Self {
            name,
            internal_only,
            note,
            data: Vec::new(),
            perturbations: Vec::new(),
            simulations: BTreeMap::new(),
        })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn internal_only(&self) -> bool {
        self.internal_only
    }
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
    pub fn data(&self) -> &[ExpressionEntry] {
        &self.data
    }
    pub fn perturbations(&self) -> &[PerturbedTimeCourse] {
        &self.perturbations
    }
    pub fn perturbation(&self, key: &str) -> Option<&PerturbedTimeCourse> {
        self.perturbations.iter().find(|p| p.key == key)
    }
    pub fn simulations(&self) -> &BTreeMap<String, Vec<ExpressionEntry>> {
        &self.simulations
    }
    pub fn add_entry(&mut self, entry: ExpressionEntry) {
        self.data.push(entry);
    }
    pub fn add_perturbation(&mut self, key: &str) -> Result<&mut PerturbedTimeCourse> {
        if self.perturbation(key).is_some() {
            return Err(TimecourseError::format(format!(
                "Gene '{}' already has perturbed data for '{key}'",
                self.name
            )));
        }
        self.perturbations.push(PerturbedTimeCourse::new(key));
        let last = self.perturbations.len() - 1;
        Ok(&mut self.perturbations[last])
    }
    pub fn perturbation_mut(&mut self, key: &str) -> Option<&mut PerturbedTimeCourse> {
        self.perturbations.iter_mut().find(|p| p.key == key)
    }
    pub fn add_simulation(&mut self, key: &str) -> Result<()> {
        if self.simulations.contains_key(key) {
            return Err(TimecourseError::format(format!(
                "Gene '{}' already has simulation data for '{key}'",
                self.name
            )));
        }
        self.simulations.insert(key.to_owned(), Vec::new());
        Ok(())
    }
    pub fn simulation_mut(&mut self, key: &str) -> Option<&mut Vec<ExpressionEntry>> {
        self.simulations.get_mut(key)
    }
    /// The ordered `(time, region)` grid of the plain observations.
    pub fn template(&self) -> Vec<GeneTemplateEntry> {
        self.data.iter().map(ExpressionEntry::template_entry).collect()
    }
    fn all_entries(&self) -> impl Iterator<Item = &ExpressionEntry> {
        self.data
            .iter()
            .chain(self.perturbations.iter().flat_map(|p| p.data.iter().chain(p.control.iter())))
            .chain(self.simulations.values().flatten())
    }
}

// ------------- SerialNumbers -------------
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SerialNumbers {
    pub base: u64,
    pub lineage: u64,
    pub topology: u64,
    pub maps: u64,
}

// ------------- TimeCourseData -------------
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeCourseData {
    serials: SerialNumbers,
    genes: Vec<TimeCourseGene>,
    maps: MapTable,
    group_parents: BTreeMap<String, String>,
    group_roots: BTreeSet<String>,
    topologies: BTreeMap<TopoTimeRange, RegionTopology>,
    locator: TopoRegionLocator,
}

impl TimeCourseData {
    pub fn new(serials: SerialNumbers) -> Self {
        Self { serials, ..Self::default() }
    }
    pub fn serials(&self) -> SerialNumbers {
        self.serials
    }
    pub fn serial_number(&self) -> u64 {
        self.serials.base
    }
    pub fn genes(&self) -> &[TimeCourseGene] {
        &self.genes
    }
    pub fn gene(&self, name: &str) -> Option<&TimeCourseGene> {
        self.gene_position(name).map(|i| &self.genes[i])
    }
    pub fn gene_position(&self, name: &str) -> Option<usize> {
        let key = normalize_key(name);
        self.genes.iter().position(|g| normalize_key(g.name()) == key)
    }
    /// The canonical template, taken from the first gene.
    pub fn template(&self) -> Vec<GeneTemplateEntry> {
        self.genes.first().map(TimeCourseGene::template).unwrap_or_default()
    }
    pub fn maps(&self) -> &MapTable {
        &self.maps
    }
    pub fn map(&self, key: &str) -> Option<&[DataMapping]> {
        self.maps.get(key).map(Vec::as_slice)
    }
    pub fn group_parents(&self) -> &BTreeMap<String, String> {
        &self.group_parents
    }
    pub fn group_parent(&self, region: &str) -> Option<&str> {
        self.group_parents.get(region).map(String::as_str)
    }
    pub fn group_roots(&self) -> &BTreeSet<String> {
        &self.group_roots
    }
    pub fn topologies(&self) -> &BTreeMap<TopoTimeRange, RegionTopology> {
        &self.topologies
    }
    /// The first topology (in range order) whose range covers `time`.
    pub fn topology_at(&self, time: i32) -> Option<&RegionTopology> {
        self.topologies.values().find(|t| t.time_range().contains(time))
    }
    pub fn locator(&self) -> &TopoRegionLocator {
        &self.locator
    }

    /// Every time point mentioned by any observation of any gene.
    pub fn all_times(&self) -> BTreeSet<i32> {
        self.genes
            .iter()
            .flat_map(TimeCourseGene::all_entries)
            .map(ExpressionEntry::time)
            .collect()
    }
    /// Every region named by observations, the lineage, or the topology.
    pub fn all_regions(&self) -> BTreeSet<String> {
        let mut regions: BTreeSet<String> = self
            .genes
            .iter()
            .flat_map(TimeCourseGene::all_entries)
            .filter_map(|e| e.region().map(str::to_owned))
            .collect();
        for (child, parent) in &self.group_parents {
            regions.insert(child.clone());
            regions.insert(parent.clone());
        }
        regions.extend(self.group_roots.iter().cloned());
        for topology in self.topologies.values() {
            regions.extend(topology.regions().iter().cloned());
        }
        regions
    }

    // ------------- construction, used while a document is read -------------
    pub(crate) fn attach_gene(&mut self, gene: TimeCourseGene) -> Result<usize> {
        if self.gene_position(gene.name()).is_some() {
            return Err(TimecourseError::format(format!(
                "Time course data already has a gene named '{}'",
                gene.name()
            )));
        }
        self.genes.push(gene);
        Ok(self.genes.len() - 1)
    }
    pub(crate) fn gene_at_mut(&mut self, position: usize) -> Option<&mut TimeCourseGene> {
        self.genes.get_mut(position)
    }
    pub(crate) fn gene_at(&self, position: usize) -> Option<&TimeCourseGene> {
        self.genes.get(position)
    }
    pub(crate) fn attach_region_parent(&mut self, region: String, parent: String) {
        self.group_parents.insert(region, parent);
    }
    pub(crate) fn attach_region_root(&mut self, region: String) {
        self.group_roots.insert(region);
    }
    pub(crate) fn attach_topology(&mut self, topology: RegionTopology) -> Result<()> {
        let range = topology.time_range();
        if self.topologies.contains_key(&range) {
            return Err(TimecourseError::format(format!(
                "A region topology for time range {range} is already defined"
            )));
        }
        self.topologies.insert(range, topology);
        Ok(())
    }
    pub(crate) fn topology_mut(&mut self, range: &TopoTimeRange) -> Option<&mut RegionTopology> {
        self.topologies.get_mut(range)
    }
    pub(crate) fn locator_mut(&mut self) -> &mut TopoRegionLocator {
        &mut self.locator
    }
    pub(crate) fn attach_map(&mut self, key: String, entries: Vec<DataMapping>) {
        self.maps.insert(key, entries);
    }

    // ------------- mutations that produce change records -------------
    fn check_gene(
        &self,
        gene: &TimeCourseGene,
        replacing: Option<usize>,
        axis: &TimeAxisDefinition,
    ) -> Result<()> {
        if let Some(existing) = self.gene_position(gene.name()) {
            if Some(existing) != replacing {
                return Err(TimecourseError::format(format!(
                    "Time course data already has a gene named '{}'",
                    gene.name()
                )));
            }
        }
        let candidate = gene.template();
        if candidate.is_empty() {
            return Err(empty_template(gene.name()));
        }
        let reference = self
            .genes
            .iter()
            .enumerate()
            .find(|(i, _)| Some(*i) != replacing)
            .map(|(_, g)| g.template());
        match reference {
            Some(canonical) => {
                verify_template(&canonical, &candidate, gene.name(), axis)
            }
            None => Ok(()),
        }
    }
    fn bump_base(&mut self, change: &mut TimeCourseChange) {
        change.base_serial_orig = Some(self.serials.base);
        self.serials.base += 1;
        change.base_serial_new = Some(self.serials.base);
    }

    pub fn add_gene(&mut self, gene: TimeCourseGene, axis: &TimeAxisDefinition) -> Result<TimeCourseChange> {
        self.check_gene(&gene, None, axis)?;
        let mut change = TimeCourseChange::new(false);
        change.gene_position = Some(self.genes.len());
        change.gene_new = Some(gene.clone());
        self.genes.push(gene);
        self.bump_base(&mut change);
        Ok(change)
    }
    pub fn replace_gene(
        &mut self,
        position: usize,
        gene: TimeCourseGene,
        axis: &TimeAxisDefinition,
    ) -> Result<TimeCourseChange> {
        if position >= self.genes.len() {
            return Err(TimecourseError::IllegalArgument(format!(
                "No gene at position {position}"
            )));
        }
        self.check_gene(&gene, Some(position), axis)?;
        let mut change = TimeCourseChange::new(false);
        change.gene_position = Some(position);
        change.gene_orig = Some(std::mem::replace(&mut self.genes[position], gene));
        change.gene_new = Some(self.genes[position].clone());
        self.bump_base(&mut change);
        Ok(change)
    }
    pub fn delete_gene(&mut self, position: usize) -> Result<TimeCourseChange> {
        if position >= self.genes.len() {
            return Err(TimecourseError::IllegalArgument(format!(
                "No gene at position {position}"
            )));
        }
        let mut change = TimeCourseChange::new(false);
        change.gene_position = Some(position);
        change.gene_orig = Some(self.genes.remove(position));
        self.bump_base(&mut change);
        Ok(change)
    }
    /// Replaces the whole gene list; the new list must be internally consistent.
    pub fn replace_all_genes(
        &mut self,
        genes: Vec<TimeCourseGene>,
        axis: &TimeAxisDefinition,
    ) -> Result<TimeCourseChange> {
        let mut staged = TimeCourseData::default();
        for gene in &genes {
            staged.check_gene(gene, None, axis)?;
            staged.genes.push(gene.clone());
        }
        let mut change = TimeCourseChange::new(false);
        change.all_genes_orig = Some(std::mem::replace(&mut self.genes, genes));
        change.all_genes_new = Some(self.genes.clone());
        self.bump_base(&mut change);
        Ok(change)
    }
    pub fn set_map(&mut self, key: &str, entries: Vec<DataMapping>) -> TimeCourseChange {
        let mut change = TimeCourseChange::new(true);
        change.map_key = Some(key.to_owned());
        change.map_list_orig = self.maps.get(key).cloned();
        change.map_list_new = Some(entries.clone());
        self.maps.insert(key.to_owned(), entries);
        change.map_serial_orig = Some(self.serials.maps);
        self.serials.maps += 1;
        change.map_serial_new = Some(self.serials.maps);
        change
    }
    pub fn drop_map(&mut self, key: &str) -> Option<TimeCourseChange> {
        let removed = self.maps.remove(key)?;
        let mut change = TimeCourseChange::new(true);
        change.map_key = Some(key.to_owned());
        change.map_list_orig = Some(removed);
        change.map_serial_orig = Some(self.serials.maps);
        self.serials.maps += 1;
        change.map_serial_new = Some(self.serials.maps);
        Some(change)
    }
    pub fn set_region_hierarchy(
        &mut self,
        parents: BTreeMap<String, String>,
        roots: BTreeSet<String>,
    ) -> TimeCourseChange {
        let mut change = TimeCourseChange::new(false);
        change.group_parents_orig = Some(std::mem::replace(&mut self.group_parents, parents));
        change.group_roots_orig = Some(std::mem::replace(&mut self.group_roots, roots));
        change.group_parents_new = Some(self.group_parents.clone());
        change.group_roots_new = Some(self.group_roots.clone());
        change.lineage_serial_orig = Some(self.serials.lineage);
        self.serials.lineage += 1;
        change.lineage_serial_new = Some(self.serials.lineage);
        change
    }
    pub fn set_topologies(
        &mut self,
        topologies: BTreeMap<TopoTimeRange, RegionTopology>,
        locator: TopoRegionLocator,
    ) -> TimeCourseChange {
        let mut change = TimeCourseChange::new(false);
        change.topologies_orig = Some(std::mem::replace(&mut self.topologies, topologies));
        change.locator_orig = Some(std::mem::replace(&mut self.locator, locator));
        change.topologies_new = Some(self.topologies.clone());
        change.locator_new = Some(self.locator.clone());
        change.topo_serial_orig = Some(self.serials.topology);
        self.serials.topology += 1;
        change.topo_serial_new = Some(self.serials.topology);
        change
    }

    // ------------- serialization -------------
    pub fn to_xml(&self) -> Result<String> {
        let mut out = MarkupWriter::new();
        out.open(E::Dataset.tag(), vec![
            ("serialNum", Some(self.serials.base.to_string())),
            ("lineageSerialNum", Some(self.serials.lineage.to_string())),
            ("topoSerialNum", Some(self.serials.topology.to_string())),
            ("mapSerialNum", Some(self.serials.maps.to_string())),
        ])?;
        for gene in &self.genes {
            out.open(E::Gene.tag(), vec![
                ("gene", Some(gene.name.clone())),
                ("internalOnly", Some(yes_no(gene.internal_only).to_owned())),
                ("note", gene.note.clone()),
            ])?;
            write_entries(&mut out, &gene.data)?;
            for perturbation in &gene.perturbations {
                out.open(E::Perturbed.tag(), vec![("key", Some(perturbation.key.clone()))])?;
                write_entries(&mut out, &perturbation.data)?;
                if !perturbation.control.is_empty() {
                    out.open(E::Control.tag(), vec![])?;
                    write_entries(&mut out, &perturbation.control)?;
                    out.close(E::Control.tag())?;
                }
                out.close(E::Perturbed.tag())?;
            }
            for (key, entries) in &gene.simulations {
                out.open(E::Simulation.tag(), vec![("key", Some(key.clone()))])?;
                write_entries(&mut out, entries)?;
                out.close(E::Simulation.tag())?;
            }
            out.close(E::Gene.tag())?;
        }
        if !self.group_parents.is_empty() || !self.group_roots.is_empty() {
            out.open(E::Hierarchy.tag(), vec![])?;
            for (region, parent) in &self.group_parents {
                out.empty(E::RegionParent.tag(), vec![
                    ("region", Some(region.clone())),
                    ("parent", Some(parent.clone())),
                ])?;
            }
            for root in &self.group_roots {
                out.empty(E::RegionRoot.tag(), vec![("region", Some(root.clone()))])?;
            }
            out.close(E::Hierarchy.tag())?;
        }
        if !self.topologies.is_empty() || !self.locator.is_empty() {
            out.open(E::Topologies.tag(), vec![])?;
            for (range, topology) in &self.topologies {
                out.open(E::Topology.tag(), range_attrs(range))?;
                for region in topology.regions() {
                    out.empty(E::TopoRegion.tag(), vec![("name", Some(region.clone()))])?;
                }
                for link in topology.links() {
                    out.empty(E::TopoLink.tag(), vec![
                        ("from", Some(link.source().to_owned())),
                        ("to", Some(link.target().to_owned())),
                    ])?;
                }
                out.close(E::Topology.tag())?;
            }
            for (range, locations) in self.locator.iter() {
                out.open(E::Locations.tag(), range_attrs(range))?;
                for location in locations {
                    out.empty(E::RegionLoc.tag(), vec![
                        ("region", Some(location.region().to_owned())),
                        ("x", Some(location.x().to_string())),
                        ("y", Some(location.y().to_string())),
                    ])?;
                }
                out.close(E::Locations.tag())?;
            }
            out.close(E::Topologies.tag())?;
        }
        write_map_table(&mut out, TIME_COURSE_MAP, &self.maps)?;
        out.close(E::Dataset.tag())?;
        out.finish()
    }
}

impl fmt::Display for TimeCourseData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "time course data #{} ({} genes, {} template points)",
            self.serials.base,
            self.genes.len(),
            self.template().len()
        )
    }
}

impl Undoable<TimeCourseChange> for TimeCourseData {
    fn undo(&mut self, change: &TimeCourseChange) -> Result<()> {
        self.apply(change, true)
    }
    fn redo(&mut self, change: &TimeCourseChange) -> Result<()> {
        self.apply(change, false)
    }
}

impl TimeCourseData {
    fn apply(&mut self, change: &TimeCourseChange, undo: bool) -> Result<()> {
        // `pick` selects the side being restored
        fn pick<'a, T>(undo: bool, orig: &'a Option<T>, new: &'a Option<T>) -> Option<&'a T> {
            if undo { orig.as_ref() } else { new.as_ref() }
        }
        if let Some(position) = change.gene_position {
            let (from, to) = if undo {
                (change.gene_new.as_ref(), change.gene_orig.as_ref())
            } else {
                (change.gene_orig.as_ref(), change.gene_new.as_ref())
            };
            swap_positioned(&mut self.genes, position, from, to)?;
        }
        if let Some(genes) = pick(undo, &change.all_genes_orig, &change.all_genes_new) {
            self.genes = genes.clone();
        }
        if let Some(key) = &change.map_key {
            swap_map_entry(&mut self.maps, key, pick(undo, &change.map_list_orig, &change.map_list_new));
        }
        if let Some(parents) = pick(undo, &change.group_parents_orig, &change.group_parents_new) {
            self.group_parents = parents.clone();
        }
        if let Some(roots) = pick(undo, &change.group_roots_orig, &change.group_roots_new) {
            self.group_roots = roots.clone();
        }
        if let Some(topologies) = pick(undo, &change.topologies_orig, &change.topologies_new) {
            self.topologies = topologies.clone();
        }
        if let Some(locator) = pick(undo, &change.locator_orig, &change.locator_new) {
            self.locator = locator.clone();
        }
        if let Some(serial) = pick(undo, &change.base_serial_orig, &change.base_serial_new) {
            self.serials.base = *serial;
        }
        if let Some(serial) = pick(undo, &change.lineage_serial_orig, &change.lineage_serial_new) {
            self.serials.lineage = *serial;
        }
        if let Some(serial) = pick(undo, &change.topo_serial_orig, &change.topo_serial_new) {
            self.serials.topology = *serial;
        }
        if let Some(serial) = pick(undo, &change.map_serial_orig, &change.map_serial_new) {
            self.serials.maps = *serial;
        }
        Ok(())
    }
}

fn write_entries(out: &mut MarkupWriter, entries: &[ExpressionEntry]) -> Result<()> {
    for entry in entries {
        out.empty(E::Data.tag(), vec![
            ("time", Some(entry.time.to_string())),
            ("region", entry.region.clone()),
            ("expr", Some(entry.level.tag().to_owned())),
            ("value", entry.value.map(|v| v.to_string())),
            ("source", entry.source.map(|s| s.tag().to_owned())),
        ])?;
    }
    Ok(())
}

fn range_attrs(range: &TopoTimeRange) -> Vec<(&'static str, Option<String>)> {
    vec![
        ("minTime", Some(range.min_time().to_string())),
        ("maxTime", Some(range.max_time().to_string())),
    ]
}
