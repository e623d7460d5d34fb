use std::sync::Arc;

use timecourse::copies::{CopiesPerEmbryoData, CopiesPerEmbryoGene};
use timecourse::error::TimecourseError;
use timecourse::factory::FactoryOptions;
use timecourse::reader::load_copies_per_embryo;
use timecourse::store::DataStore;
use timecourse::timeaxis::TimeAxisDefinition;

fn axis() -> TimeAxisDefinition {
    TimeAxisDefinition::default()
}

fn load(body: &str) -> Result<CopiesPerEmbryoData, TimecourseError> {
    let xml = format!("<copiesPerEmbryo>{body}</copiesPerEmbryo>");
    load_copies_per_embryo(&Arc::new(DataStore::default()), &xml, FactoryOptions::modern())
}

const BODY: &str = r#"
    <defaultTimes><time value="0"/><time value="6"/></defaultTimes>
    <copies gene="A"><count time="0" value="10"/><count time="6" value="250.5"/></copies>
    <copies gene="B"><count time="0" value="0"/><count time="6" value="12"/></copies>"#;

#[test]
fn counts_are_read() {
    let data = load(BODY).expect("parse ok");
    assert_eq!(data.genes().len(), 2);
    assert_eq!(data.gene("a").unwrap().count_at(6), Some(250.5));
    assert_eq!(data.gene("B").unwrap().count_at(3), None);
    assert_eq!(data.default_times().len(), 2);
    assert_eq!(data.template().len(), 2);
    assert!(data.template().iter().all(|entry| entry.region().is_none()));
}

#[test]
fn counts_survive_a_round_trip() {
    let data = load(BODY).unwrap();
    let again = load_copies_per_embryo(&Arc::new(DataStore::default()), &data.to_xml().unwrap(), FactoryOptions::modern())
        .unwrap();
    assert_eq!(again, data);
}

#[test]
fn genes_share_the_count_template() {
    let body = r#"<copies gene="A"><count time="0" value="1"/><count time="6" value="2"/></copies>
        <copies gene="B"><count time="0" value="1"/><count time="7" value="2"/></copies>"#;
    assert!(matches!(load(body), Err(TimecourseError::StructuralMismatch { .. })));
    assert!(matches!(load(r#"<copies gene="A"/>"#), Err(TimecourseError::StructuralMismatch { .. })));
}

#[test]
fn malformed_documents_are_rejected() {
    for body in [
        r#"<time value="0"/>"#,
        r#"<count time="0" value="1"/>"#,
        r#"<copies gene="A"><count time="0" value="-1"/></copies>"#,
        r#"<copies gene="A"><count time="0" value="1"/><count time="0" value="2"/></copies>"#,
        r#"<copies gene="A"><count time="0"/></copies>"#,
        r#"<defaultTimes><time value="0"/><time value="0"/></defaultTimes>"#,
        r#"<defaultTimes><copies gene="A"/></defaultTimes>"#,
        r#"<copies gene="A"><count time="0" value="1"/></copies><copies gene="a"><count time="0" value="1"/></copies>"#,
    ] {
        let err = load(body).unwrap_err();
        assert!(matches!(err, TimecourseError::FormatViolation { .. }), "{body}: {err}");
    }
}

#[test]
fn all_times_include_defaults() {
    let mut data = load(BODY).unwrap();
    let mut c = CopiesPerEmbryoGene::new("C").unwrap();
    c.add_count(0, 4.0).unwrap();
    c.add_count(6, 4.0).unwrap();
    data.add_gene(c, &axis()).unwrap();
    data.set_default_times([0, 6, 24].into_iter().collect());
    assert_eq!(data.all_times().into_iter().collect::<Vec<_>>(), vec![0, 6, 24]);
}
