use std::sync::Arc;

use timecourse::error::TimecourseError;
use timecourse::factory::FactoryOptions;
use timecourse::reader::load_time_course;
use timecourse::store::DataStore;
use timecourse::timecourse::TimeCourseData;
use timecourse::topology::{RegionTopology, TopoLink, TopoRegionLoc, TopoRegionLocator, TopoTimeRange};

fn load(extra: &str) -> Result<TimeCourseData, TimecourseError> {
    let xml = format!(
        r#"<timeCourseData serialNum="1">
            <timeCourse gene="A"><data time="0" region="x" expr="yes"/></timeCourse>
            {extra}
        </timeCourseData>"#
    );
    load_time_course(&Arc::new(DataStore::default()), &xml, FactoryOptions::modern())
}

const LINEAGE_AND_TOPOLOGY: &str = r#"
    <regionHierarchy><regionParent region="x" parent="embryo"/><regionRoot region="embryo"/></regionHierarchy>
    <regionTopologies>
        <regionTopology minTime="0" maxTime="10">
            <topoRegion name="x"/><topoRegion name="y"/><topoLink from="x" to="y"/>
        </regionTopology>
        <regionTopology minTime="11" maxTime="20"><topoRegion name="x"/></regionTopology>
        <topoLocations minTime="0" maxTime="10"><topoRegionLoc region="x" x="1.5" y="2"/></topoLocations>
    </regionTopologies>"#;

#[test]
fn topology_and_lineage_are_built() {
    let data = load(LINEAGE_AND_TOPOLOGY).expect("parse ok");
    assert_eq!(data.group_parent("x"), Some("embryo"));
    assert!(data.group_roots().contains("embryo"));
    assert_eq!(data.topologies().len(), 2);
    let early = data.topology_at(5).expect("topology for time 5");
    assert!(early.links().contains(&TopoLink::new("x", "y")));
    assert!(data.topology_at(15).unwrap().links().is_empty());
    assert!(data.topology_at(21).is_none());
    let range = TopoTimeRange::new(0, 10).unwrap();
    let location = data.locator().region_location(&range, "x").expect("located");
    assert_eq!((location.x(), location.y()), (1.5, 2.0));
    let regions: Vec<String> = data.all_regions().into_iter().collect();
    assert_eq!(regions, vec!["embryo", "x", "y"]);
}

#[test]
fn topology_survives_a_round_trip() {
    let data = load(LINEAGE_AND_TOPOLOGY).unwrap();
    let xml = data.to_xml().unwrap();
    let again = load_time_course(&Arc::new(DataStore::default()), &xml, FactoryOptions::modern()).unwrap();
    assert_eq!(again, data);
}

#[test]
fn links_never_reference_undeclared_regions() {
    let forward = r#"<regionTopologies><regionTopology minTime="0" maxTime="1">
        <topoRegion name="x"/><topoLink from="x" to="y"/><topoRegion name="y"/>
    </regionTopology></regionTopologies>"#;
    assert!(matches!(load(forward), Err(TimecourseError::FormatViolation { .. })));
}

#[test]
fn topology_structure_is_enforced() {
    for extra in [
        // one topology per time range
        r#"<regionTopologies><regionTopology minTime="0" maxTime="1"/><regionTopology minTime="0" maxTime="1"/></regionTopologies>"#,
        // locations only for regions of that range's topology
        r#"<regionTopologies><regionTopology minTime="0" maxTime="1"><topoRegion name="x"/></regionTopology>
            <topoLocations minTime="0" maxTime="1"><topoRegionLoc region="q" x="0" y="0"/></topoLocations></regionTopologies>"#,
        r#"<regionTopologies><topoLocations minTime="0" maxTime="1"><topoRegionLoc region="x" x="0" y="0"/></topoLocations></regionTopologies>"#,
        // blocks need their wrappers
        r#"<regionTopology minTime="0" maxTime="1"/>"#,
        r#"<regionTopologies><topoRegion name="x"/></regionTopologies>"#,
        r#"<regionParent region="x" parent="y"/>"#,
        // inverted ranges and doubled declarations
        r#"<regionTopologies><regionTopology minTime="5" maxTime="1"/></regionTopologies>"#,
        r#"<regionTopologies><regionTopology minTime="0" maxTime="1"><topoRegion name="x"/><topoRegion name="x"/></regionTopology></regionTopologies>"#,
        r#"<regionHierarchy><regionParent region="x" parent="y"/><regionParent region="x" parent="z"/></regionHierarchy>"#,
    ] {
        let err = load(extra).unwrap_err();
        assert!(matches!(err, TimecourseError::FormatViolation { .. }), "{extra}: {err}");
    }
}

#[test]
fn topology_entities() {
    let range = TopoTimeRange::new(2, 4).unwrap();
    assert!(range.contains(2) && range.contains(4) && !range.contains(5));
    assert!(TopoTimeRange::new(0, 9).unwrap() < range);
    assert!(TopoTimeRange::new(2, 3).unwrap() < range);
    assert!(TopoTimeRange::new(3, 2).is_err());

    let mut topology = RegionTopology::new(range);
    assert!(topology.add_region("a"));
    assert!(!topology.add_region("a"));
    assert!(topology.add_link(TopoLink::new("a", "b")).is_err());
    topology.add_region("b");
    topology.add_link(TopoLink::new("a", "b")).unwrap();
    assert_eq!(topology.links().len(), 1);

    let mut locator = TopoRegionLocator::new();
    locator.set_region_location(range, TopoRegionLoc::new("a", 1.0, 1.0));
    locator.set_region_location(range, TopoRegionLoc::new("a", 3.0, 4.0));
    assert_eq!(locator.locations_for(&range).len(), 1);
    assert_eq!(locator.region_location(&range, "a").unwrap().x(), 3.0);
    assert!(locator.locations_for(&TopoTimeRange::new(0, 0).unwrap()).is_empty());
}

#[test]
fn a_second_hierarchy_block_cannot_reparent_a_region() {
    let twice = r#"
        <regionHierarchy><regionParent region="x" parent="embryo"/></regionHierarchy>
        <regionHierarchy><regionParent region="x" parent="head"/></regionHierarchy>"#;
    assert!(matches!(load(twice), Err(TimecourseError::FormatViolation { .. })));
    let repeated = r#"<regionHierarchy>
        <regionParent region="x" parent="embryo"/><regionParent region="x" parent="embryo"/>
    </regionHierarchy>"#;
    assert!(matches!(load(repeated), Err(TimecourseError::FormatViolation { .. })));
}
