use std::sync::Arc;

use timecourse::error::TimecourseError;
use timecourse::factory::FactoryOptions;
use timecourse::reader::{load_copies_per_embryo, load_temporal_input, load_time_course};
use timecourse::store::DataStore;
use timecourse::timecourse::TimeCourseData;

const TIME_COURSE: &str = r#"<timeCourseData serialNum="1">
    <timeCourse gene="A"><data time="1" region="x" expr="yes"/></timeCourse>
    <tcMap key="A"><useEntry name="B" channel="green"/><useEntry name="C"/></tcMap>
</timeCourseData>"#;

fn legacy_maps() -> FactoryOptions {
    FactoryOptions { legacy_maps_allowed: true, ..FactoryOptions::modern() }
}

#[test]
fn modern_documents_reject_legacy_maps() {
    let store = Arc::new(DataStore::default());
    let err = load_time_course(&store, TIME_COURSE, FactoryOptions::modern()).unwrap_err();
    assert!(matches!(err, TimecourseError::FormatViolation { .. }));
    assert!(err.to_string().contains("not allowed"), "{err}");
    assert!(store.get::<TimeCourseData>().unwrap().is_none());
    assert!(store.data_maps().unwrap().is_empty());
}

#[test]
fn legacy_time_course_maps_are_attached_and_shared() {
    let store = Arc::new(DataStore::default());
    let data = load_time_course(&store, TIME_COURSE, legacy_maps()).expect("parse ok");
    let map = data.map("A").expect("map attached");
    assert_eq!(map.len(), 2);
    assert_eq!((map[0].name(), map[0].channel()), ("B", Some("green")));
    assert_eq!(map[1].channel(), None);
    let shared = store.data_maps().unwrap();
    assert_eq!(shared.time_course["A"], map);
    // maps are written back out in the same grammar
    let again = load_time_course(&Arc::new(DataStore::default()), &data.to_xml().unwrap(), legacy_maps()).unwrap();
    assert_eq!(again.maps(), data.maps());
}

#[test]
fn temporal_entry_and_source_maps() {
    let xml = r#"<temporalInputs>
        <temporalRange name="g"/>
        <timEntryMap key="g"><useEntry name="h"/></timEntryMap>
        <timSourceMap key="s"><useEntry name="t"/><useEntry name="u"/></timSourceMap>
    </temporalInputs>"#;
    let store = Arc::new(DataStore::default());
    let data = load_temporal_input(&store, xml, legacy_maps()).expect("parse ok");
    assert_eq!(data.entry_map("g").unwrap()[0].name(), "h");
    assert_eq!(data.source_map("s").unwrap().len(), 2);
    let shared = store.data_maps().unwrap();
    assert_eq!(shared.temporal_entry.len(), 1);
    assert_eq!(shared.temporal_source.len(), 1);
    let modern = load_temporal_input(&Arc::new(DataStore::default()), xml, FactoryOptions::modern());
    assert!(matches!(modern, Err(TimecourseError::FormatViolation { .. })));
}

#[test]
fn copies_maps() {
    let xml = r#"<copiesPerEmbryo>
        <copies gene="A"><count time="0" value="3"/></copies>
        <cpeMap key="A"><useEntry name="Z"/></cpeMap>
    </copiesPerEmbryo>"#;
    let store = Arc::new(DataStore::default());
    let data = load_copies_per_embryo(&store, xml, legacy_maps()).expect("parse ok");
    assert_eq!(data.map("A").unwrap()[0].name(), "Z");
    assert!(store.data_maps().unwrap().copies_per_embryo.contains_key("A"));
    assert!(load_copies_per_embryo(&Arc::new(DataStore::default()), xml, FactoryOptions::modern()).is_err());
}

#[test]
fn map_structure_is_enforced() {
    let options = legacy_maps();
    for body in [
        // useEntry needs an open map
        r#"<useEntry name="B"/>"#,
        // maps do not nest
        r#"<tcMap key="A"><tcMap key="B"/></tcMap>"#,
        // a key is required
        r#"<tcMap><useEntry name="B"/></tcMap>"#,
        // maps hang off the dataset, not a gene
        r#"<timeCourse gene="A"><data time="1" region="x" expr="yes"/><tcMap key="A"/></timeCourse>"#,
        // nothing else goes inside a map
        r#"<tcMap key="A"><timeCourse gene="B"/></tcMap>"#,
    ] {
        let xml = format!(r#"<timeCourseData serialNum="1">{body}</timeCourseData>"#);
        let err = load_time_course(&Arc::new(DataStore::default()), &xml, options).unwrap_err();
        assert!(matches!(err, TimecourseError::FormatViolation { .. }), "{body}: {err}");
    }
}
