//! Undo/redo records.
//!
//! A change record pairs the original and the new value of every field a
//! mutating operation touched. Fields left at `None` were not touched and an
//! applier must leave them alone; nothing is ever derived from another field.
//! The one asymmetric case is a positioned entry (a gene): with its position set,
//! a missing original means the entry was added and a missing new value means it
//! was deleted.

use std::collections::{BTreeMap, BTreeSet};

use crate::copies::CopiesPerEmbryoGene;
use crate::error::{Result, TimecourseError};
use crate::maps::{DataMapping, MapTable};
use crate::timecourse::TimeCourseGene;
use crate::topology::{RegionTopology, TopoRegionLocator, TopoTimeRange};

/// Implemented by datasets that can replay either side of their change records.
pub trait Undoable<C> {
    fn undo(&mut self, change: &C) -> Result<()>;
    fn redo(&mut self, change: &C) -> Result<()>;
}

// ------------- TimeCourseChange -------------
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeCourseChange {
    pub for_maps: bool,
    pub base_serial_orig: Option<u64>,
    pub base_serial_new: Option<u64>,
    pub lineage_serial_orig: Option<u64>,
    pub lineage_serial_new: Option<u64>,
    pub topo_serial_orig: Option<u64>,
    pub topo_serial_new: Option<u64>,
    pub map_serial_orig: Option<u64>,
    pub map_serial_new: Option<u64>,
    pub map_key: Option<String>,
    pub map_list_orig: Option<Vec<DataMapping>>,
    pub map_list_new: Option<Vec<DataMapping>>,
    pub group_parents_orig: Option<BTreeMap<String, String>>,
    pub group_parents_new: Option<BTreeMap<String, String>>,
    pub group_roots_orig: Option<BTreeSet<String>>,
    pub group_roots_new: Option<BTreeSet<String>>,
    pub topologies_orig: Option<BTreeMap<TopoTimeRange, RegionTopology>>,
    pub topologies_new: Option<BTreeMap<TopoTimeRange, RegionTopology>>,
    pub locator_orig: Option<TopoRegionLocator>,
    pub locator_new: Option<TopoRegionLocator>,
    pub gene_position: Option<usize>,
    pub gene_orig: Option<TimeCourseGene>,
    pub gene_new: Option<TimeCourseGene>,
    pub all_genes_orig: Option<Vec<TimeCourseGene>>,
    pub all_genes_new: Option<Vec<TimeCourseGene>>,
}

impl TimeCourseChange {
    pub fn new(for_maps: bool) -> Self {
        Self { for_maps, ..Self::default() }
    }
    /// True when no field has been captured at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::new(self.for_maps)
    }
}

// ------------- CopiesPerEmbryoChange -------------
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CopiesPerEmbryoChange {
    pub map_key: Option<String>,
    pub map_list_orig: Option<Vec<DataMapping>>,
    pub map_list_new: Option<Vec<DataMapping>>,
    pub gene_position: Option<usize>,
    pub gene_orig: Option<CopiesPerEmbryoGene>,
    pub gene_new: Option<CopiesPerEmbryoGene>,
    pub default_times_orig: Option<BTreeSet<i32>>,
    pub default_times_new: Option<BTreeSet<i32>>,
}

impl CopiesPerEmbryoChange {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Moves the entry at `position` from state `from` to state `to`.
pub(crate) fn swap_positioned<T: Clone>(
    list: &mut Vec<T>,
    position: usize,
    from: Option<&T>,
    to: Option<&T>,
) -> Result<()> {
    let out_of_range = |len: usize| {
        TimecourseError::IllegalArgument(format!(
            "Change record position {position} is out of range for {len} entries"
        ))
    };
    match (from, to) {
        (Some(_), Some(to)) => {
            let len = list.len();
            let slot = list.get_mut(position).ok_or_else(|| out_of_range(len))?;
            *slot = to.clone();
        }
        (None, Some(to)) => {
            if position > list.len() {
                return Err(out_of_range(list.len()));
            }
            list.insert(position, to.clone());
        }
        (Some(_), None) => {
            if position >= list.len() {
                return Err(out_of_range(list.len()));
            }
            list.remove(position);
        }
        (None, None) => (),
    }
    Ok(())
}

/// Restores one map entry: a missing target list means the key did not exist.
pub(crate) fn swap_map_entry(table: &mut MapTable, key: &str, to: Option<&Vec<DataMapping>>) {
    match to {
        Some(entries) => {
            table.insert(key.to_owned(), entries.clone());
        }
        None => {
            table.remove(key);
        }
    }
}
