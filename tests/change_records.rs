use std::collections::{BTreeMap, BTreeSet};

use timecourse::change::{CopiesPerEmbryoChange, TimeCourseChange, Undoable};
use timecourse::copies::{CopiesPerEmbryoData, CopiesPerEmbryoGene};
use timecourse::error::TimecourseError;
use timecourse::maps::DataMapping;
use timecourse::timecourse::{ExpressionEntry, ExpressionLevel, SerialNumbers, TimeCourseData, TimeCourseGene};
use timecourse::timeaxis::TimeAxisDefinition;
use timecourse::topology::{RegionTopology, TopoRegionLocator, TopoTimeRange};

fn axis() -> TimeAxisDefinition {
    TimeAxisDefinition::default()
}

fn gene(name: &str, times: &[i32]) -> TimeCourseGene {
    let mut gene = TimeCourseGene::new(name, false, None).unwrap();
    for &time in times {
        gene.add_entry(ExpressionEntry::new(Some("x".into()), time, ExpressionLevel::Yes, None, None).unwrap());
    }
    gene
}

fn setup() -> TimeCourseData {
    let mut data = TimeCourseData::new(SerialNumbers { base: 7, ..SerialNumbers::default() });
    data.add_gene(gene("A", &[1, 2]), &axis()).unwrap();
    data.add_gene(gene("B", &[1, 2]), &axis()).unwrap();
    data
}

#[test]
fn fresh_records_are_empty() {
    let change = TimeCourseChange::new(false);
    assert!(change.is_empty());
    assert_eq!(change, TimeCourseChange::default());
    assert!(TimeCourseChange::new(true).is_empty());
    assert!(CopiesPerEmbryoChange::new().is_empty());
}

#[test]
fn single_category_records_leave_everything_else_unset() {
    let mut data = setup();
    let change = data.set_map("A", vec![DataMapping::new("B", None)]);
    assert!(change.for_maps);
    assert_eq!(change.map_key.as_deref(), Some("A"));
    assert_eq!(change.map_list_orig, None);
    assert_eq!((change.map_serial_orig, change.map_serial_new), (Some(0), Some(1)));
    assert_eq!(change.base_serial_orig, None);
    assert_eq!(change.gene_position, None);
    assert_eq!(change.all_genes_orig, None);
    assert_eq!(change.group_parents_orig, None);
    assert_eq!(change.topologies_orig, None);
    assert_eq!(change.locator_orig, None);
}

#[test]
fn applier_only_touches_set_fields() {
    let mut data = setup();
    data.set_map("A", vec![DataMapping::new("B", None)]);
    let before = data.clone();
    let change = TimeCourseChange {
        base_serial_orig: Some(5),
        base_serial_new: Some(before.serial_number()),
        ..TimeCourseChange::default()
    };
    data.undo(&change).unwrap();
    assert_eq!(data.serial_number(), 5);
    assert_eq!(data.genes(), before.genes());
    assert_eq!(data.maps(), before.maps());
    assert_eq!(data.serials().maps, before.serials().maps);
    data.redo(&change).unwrap();
    assert_eq!(data, before);
}

#[test]
fn gene_edits_undo_and_redo() {
    let mut data = setup();
    let original = data.clone();
    let added = data.add_gene(gene("C", &[1, 2]), &axis()).unwrap();
    assert_eq!((added.gene_position, added.gene_orig.as_ref()), (Some(2), None));
    assert_eq!((added.base_serial_orig, added.base_serial_new), (Some(9), Some(10)));
    let replaced = data.replace_gene(0, gene("A", &[1, 2]), &axis()).unwrap();
    let deleted = data.delete_gene(1).unwrap();
    assert_eq!(deleted.gene_new, None);
    assert_eq!(data.genes().len(), 2);
    let edited = data.clone();

    for change in [&deleted, &replaced, &added] {
        data.undo(change).unwrap();
    }
    assert_eq!(data, original);
    for change in [&added, &replaced, &deleted] {
        data.redo(change).unwrap();
    }
    assert_eq!(data, edited);
}

#[test]
fn gene_edits_keep_the_template() {
    let mut data = setup();
    let err = data.add_gene(gene("C", &[1, 3]), &axis()).unwrap_err();
    assert!(matches!(err, TimecourseError::StructuralMismatch { .. }));
    assert!(matches!(data.add_gene(gene("a", &[1, 2]), &axis()), Err(TimecourseError::FormatViolation { .. })));
    assert!(matches!(data.add_gene(gene("E", &[]), &axis()), Err(TimecourseError::StructuralMismatch { .. })));
    assert!(matches!(data.delete_gene(9), Err(TimecourseError::IllegalArgument(_))));
    let before = data.clone();
    let err = data.replace_all_genes(vec![gene("P", &[1]), gene("Q", &[2])], &axis()).unwrap_err();
    assert!(matches!(err, TimecourseError::StructuralMismatch { .. }));
    assert_eq!(data, before);
    // a consistent list may use a different template than the old genes
    let change = data.replace_all_genes(vec![gene("P", &[4]), gene("Q", &[4])], &axis()).unwrap();
    data.undo(&change).unwrap();
    assert_eq!(data, before);
}

#[test]
fn lineage_topology_and_map_edits_undo() {
    let mut data = setup();
    let original = data.clone();
    let parents = BTreeMap::from([("x".to_string(), "embryo".to_string())]);
    let roots = BTreeSet::from(["embryo".to_string()]);
    let lineage = data.set_region_hierarchy(parents, roots);
    assert_eq!((lineage.lineage_serial_orig, lineage.lineage_serial_new), (Some(0), Some(1)));
    let range = TopoTimeRange::new(0, 5).unwrap();
    let mut topology = RegionTopology::new(range);
    topology.add_region("x");
    let topo = data.set_topologies(BTreeMap::from([(range, topology)]), TopoRegionLocator::new());
    let map = data.set_map("A", vec![DataMapping::new("B", Some("red".into()))]);
    let dropped = data.drop_map("A").expect("map existed");
    assert!(data.drop_map("A").is_none());
    assert_eq!(data.serials().maps, 2);

    for change in [&dropped, &map, &topo, &lineage] {
        data.undo(change).unwrap();
    }
    assert_eq!(data, original);
    data.redo(&lineage).unwrap();
    data.redo(&topo).unwrap();
    assert_eq!(data.group_parent("x"), Some("embryo"));
    assert!(data.topology_at(3).is_some());
}

#[test]
fn out_of_range_positions_are_illegal() {
    let mut data = setup();
    let change = TimeCourseChange {
        gene_position: Some(10),
        gene_orig: Some(gene("A", &[1, 2])),
        gene_new: Some(gene("A", &[1, 2])),
        ..TimeCourseChange::default()
    };
    assert!(matches!(data.undo(&change), Err(TimecourseError::IllegalArgument(_))));
}

#[test]
fn copies_records() {
    let mut data = CopiesPerEmbryoData::new();
    let mut a = CopiesPerEmbryoGene::new("A").unwrap();
    a.add_count(0, 1.0).unwrap();
    a.add_count(6, 20.0).unwrap();
    let add = data.add_gene(a, &axis()).unwrap();
    let times = data.set_default_times(BTreeSet::from([0, 6]));
    assert_eq!(times.default_times_orig, Some(BTreeSet::new()));
    assert_eq!(times.gene_position, None);
    let map = data.set_map("A", vec![DataMapping::new("Z", None)]);
    assert_eq!(map.default_times_orig, None);
    let snapshot = data.clone();

    data.undo(&map).unwrap();
    assert!(data.map("A").is_none());
    data.undo(&times).unwrap();
    assert!(data.default_times().is_empty());
    data.undo(&add).unwrap();
    assert!(data.genes().is_empty());
    for change in [&add, &times, &map] {
        data.redo(change).unwrap();
    }
    assert_eq!(data, snapshot);
}

#[test]
fn edit_mismatches_name_stages_from_the_given_axis() {
    let mut data = setup();
    let staged = TimeAxisDefinition::staged(
        ["cleavage", "blastula", "gastrula", "segmentation"].map(String::from).to_vec(),
    );
    let err = data.add_gene(gene("C", &[1, 3]), &staged).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("segmentation") && message.contains("gastrula"), "{message}");
}
