//! Copies-per-embryo data: absolute transcript counts per gene and time, with
//! the set of default sampling times shared by the dataset.

use std::collections::BTreeSet;
use std::fmt;

use crate::change::{swap_map_entry, swap_positioned, CopiesPerEmbryoChange, Undoable};
use crate::copies_format::{CopiesPerEmbryoElement as E, COPIES_PER_EMBRYO_MAP};
use crate::error::{Result, TimecourseError};
use crate::keys::normalize_key;
use crate::maps::{write_map_table, DataMapping, MapTable};
use crate::markup::MarkupWriter;
use crate::template::{empty_template, verify_template, GeneTemplateEntry};
use crate::timeaxis::TimeAxisDefinition;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeAndCount {
    time: i32,
    count: f64,
}

impl TimeAndCount {
    pub fn time(&self) -> i32 {
        self.time
    }
    pub fn count(&self) -> f64 {
        self.count
    }
}

// ------------- CopiesPerEmbryoGene -------------
#[derive(Clone, Debug, PartialEq)]
pub struct CopiesPerEmbryoGene {
    name: String,
    counts: Vec<TimeAndCount>,
}

impl CopiesPerEmbryoGene {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TimecourseError::format("Copies per embryo gene name may not be empty"));
        }
        Ok(Self { name, counts: Vec::new() })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn counts(&self) -> &[TimeAndCount] {
        &self.counts
    }
    pub fn count_at(&self, time: i32) -> Option<f64> {
        self.counts.iter().find(|c| c.time == time).map(|c| c.count)
    }
    pub fn add_count(&mut self, time: i32, count: f64) -> Result<()> {
        if !count.is_finite() || count < 0.0 {
            return Err(TimecourseError::format(format!(
                "Gene '{}' has an invalid copy count {count} at time {time}",
                self.name
            )));
        }
        if self.count_at(time).is_some() {
            return Err(TimecourseError::format(format!(
                "Gene '{}' has two copy counts for time {time}",
                self.name
            )));
        }
        self.counts.push(TimeAndCount { time, count });
        Ok(())
    }
    /// Count times in order; copies data has no regions.
    pub fn template(&self) -> Vec<GeneTemplateEntry> {
        self.counts.iter().map(|c| GeneTemplateEntry::new(c.time, None)).collect()
    }
}

// ------------- CopiesPerEmbryoData -------------
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CopiesPerEmbryoData {
    genes: Vec<CopiesPerEmbryoGene>,
    default_times: BTreeSet<i32>,
    maps: MapTable,
}

impl CopiesPerEmbryoData {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn genes(&self) -> &[CopiesPerEmbryoGene] {
        &self.genes
    }
    pub fn gene(&self, name: &str) -> Option<&CopiesPerEmbryoGene> {
        self.gene_position(name).map(|i| &self.genes[i])
    }
    pub fn gene_position(&self, name: &str) -> Option<usize> {
        let key = normalize_key(name);
        self.genes.iter().position(|g| normalize_key(g.name()) == key)
    }
    pub fn default_times(&self) -> &BTreeSet<i32> {
        &self.default_times
    }
    pub fn maps(&self) -> &MapTable {
        &self.maps
    }
    pub fn map(&self, key: &str) -> Option<&[DataMapping]> {
        self.maps.get(key).map(Vec::as_slice)
    }
    pub fn template(&self) -> Vec<GeneTemplateEntry> {
        self.genes.first().map(CopiesPerEmbryoGene::template).unwrap_or_default()
    }
    /// Default times plus every time any gene has a count for.
    pub fn all_times(&self) -> BTreeSet<i32> {
        let mut times = self.default_times.clone();
        times.extend(self.genes.iter().flat_map(|g| g.counts.iter().map(|c| c.time)));
        times
    }

    pub(crate) fn attach_gene(&mut self, gene: CopiesPerEmbryoGene) -> Result<usize> {
        if self.gene_position(gene.name()).is_some() {
            return Err(TimecourseError::format(format!(
                "Copies per embryo data already has a gene named '{}'",
                gene.name()
            )));
        }
        self.genes.push(gene);
        Ok(self.genes.len() - 1)
    }
    pub(crate) fn gene_at(&self, position: usize) -> Option<&CopiesPerEmbryoGene> {
        self.genes.get(position)
    }
    pub(crate) fn gene_at_mut(&mut self, position: usize) -> Option<&mut CopiesPerEmbryoGene> {
        self.genes.get_mut(position)
    }
    pub(crate) fn attach_default_time(&mut self, time: i32) -> Result<()> {
        if !self.default_times.insert(time) {
            return Err(TimecourseError::format(format!("Default time {time} is listed twice")));
        }
        Ok(())
    }
    pub(crate) fn attach_map(&mut self, key: String, entries: Vec<DataMapping>) {
        self.maps.insert(key, entries);
    }

    // ------------- mutations that produce change records -------------
    fn check_gene(
        &self,
        gene: &CopiesPerEmbryoGene,
        replacing: Option<usize>,
        axis: &TimeAxisDefinition,
    ) -> Result<()> {
        if let Some(existing) = self.gene_position(gene.name()) {
            if Some(existing) != replacing {
                return Err(TimecourseError::format(format!(
                    "Copies per embryo data already has a gene named '{}'",
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

    pub fn add_gene(
        &mut self,
        gene: CopiesPerEmbryoGene,
        axis: &TimeAxisDefinition,
    ) -> Result<CopiesPerEmbryoChange> {
        self.check_gene(&gene, None, axis)?;
        let mut change = CopiesPerEmbryoChange::new();
        change.gene_position = Some(self.genes.len());
        change.gene_new = Some(gene.clone());
        self.genes.push(gene);
        Ok(change)
    }
    pub fn replace_gene(
        &mut self,
        position: usize,
        gene: CopiesPerEmbryoGene,
        axis: &TimeAxisDefinition,
    ) -> Result<CopiesPerEmbryoChange> {
        if position >= self.genes.len() {
            return Err(TimecourseError::IllegalArgument(format!("No gene at position {position}")));
        }
        self.check_gene(&gene, Some(position), axis)?;
        let mut change = CopiesPerEmbryoChange::new();
        change.gene_position = Some(position);
        change.gene_orig = Some(std::mem::replace(&mut self.genes[position], gene));
        change.gene_new = Some(self.genes[position].clone());
        Ok(change)
    }
    pub fn delete_gene(&mut self, position: usize) -> Result<CopiesPerEmbryoChange> {
        if position >= self.genes.len() {
            return Err(TimecourseError::IllegalArgument(format!("No gene at position {position}")));
        }
        let mut change = CopiesPerEmbryoChange::new();
        change.gene_position = Some(position);
        change.gene_orig = Some(self.genes.remove(position));
        Ok(change)
    }
    pub fn set_map(&mut self, key: &str, entries: Vec<DataMapping>) -> CopiesPerEmbryoChange {
        let mut change = CopiesPerEmbryoChange::new();
        change.map_key = Some(key.to_owned());
        change.map_list_orig = self.maps.get(key).cloned();
        change.map_list_new = Some(entries.clone());
        self.maps.insert(key.to_owned(), entries);
        change
    }
    pub fn drop_map(&mut self, key: &str) -> Option<CopiesPerEmbryoChange> {
        let removed = self.maps.remove(key)?;
        let mut change = CopiesPerEmbryoChange::new();
        change.map_key = Some(key.to_owned());
        change.map_list_orig = Some(removed);
        Some(change)
    }
    pub fn set_default_times(&mut self, times: BTreeSet<i32>) -> CopiesPerEmbryoChange {
        let mut change = CopiesPerEmbryoChange::new();
        change.default_times_orig = Some(std::mem::replace(&mut self.default_times, times));
        change.default_times_new = Some(self.default_times.clone());
        change
    }

    fn apply(&mut self, change: &CopiesPerEmbryoChange, undo: bool) -> Result<()> {
        fn side<T>(undo: bool, orig: T, new: T) -> T {
            if undo { orig } else { new }
        }
        if let Some(position) = change.gene_position {
            let (from, to) = side(
                undo,
                (change.gene_new.as_ref(), change.gene_orig.as_ref()),
                (change.gene_orig.as_ref(), change.gene_new.as_ref()),
            );
            swap_positioned(&mut self.genes, position, from, to)?;
        }
        if let Some(key) = &change.map_key {
            let to = side(undo, change.map_list_orig.as_ref(), change.map_list_new.as_ref());
            swap_map_entry(&mut self.maps, key, to);
        }
        let times = side(undo, &change.default_times_orig, &change.default_times_new);
        if let Some(times) = times {
            self.default_times = times.clone();
        }
        Ok(())
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut out = MarkupWriter::new();
        out.open(E::Dataset.tag(), vec![])?;
        if !self.default_times.is_empty() {
            out.open(E::DefaultTimes.tag(), vec![])?;
            for time in &self.default_times {
                out.empty(E::Time.tag(), vec![("value", Some(time.to_string()))])?;
            }
            out.close(E::DefaultTimes.tag())?;
        }
        for gene in &self.genes {
            out.open(E::Gene.tag(), vec![("gene", Some(gene.name.clone()))])?;
            for count in &gene.counts {
                out.empty(E::Count.tag(), vec![
                    ("time", Some(count.time.to_string())),
                    ("value", Some(count.count.to_string())),
                ])?;
            }
            out.close(E::Gene.tag())?;
        }
        write_map_table(&mut out, COPIES_PER_EMBRYO_MAP, &self.maps)?;
        out.close(E::Dataset.tag())?;
        out.finish()
    }
}

impl Undoable<CopiesPerEmbryoChange> for CopiesPerEmbryoData {
    fn undo(&mut self, change: &CopiesPerEmbryoChange) -> Result<()> {
        self.apply(change, true)
    }
    fn redo(&mut self, change: &CopiesPerEmbryoChange) -> Result<()> {
        self.apply(change, false)
    }
}

impl fmt::Display for CopiesPerEmbryoData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "copies per embryo data ({} genes, {} default times)",
            self.genes.len(),
            self.default_times.len()
        )
    }
}
