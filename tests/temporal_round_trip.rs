use std::sync::Arc;

use timecourse::error::TimecourseError;
use timecourse::factory::FactoryOptions;
use timecourse::range::{InputTimeRange, RegionAndRange, Sign, TemporalRange};
use timecourse::reader::load_temporal_input;
use timecourse::store::DataStore;
use timecourse::temporal::TemporalInputRangeData;

fn load(xml: &str) -> Result<TemporalInputRangeData, TimecourseError> {
    load_temporal_input(&Arc::new(DataStore::default()), xml, FactoryOptions::modern())
}

fn wrap(range: &str) -> String {
    format!(
        "<temporalInputs><temporalRange name=\"geneA\"><inputTimeRange name=\"inputX\">{range}</inputTimeRange></temporalRange></temporalInputs>"
    )
}

#[test]
fn single_range_survives_a_round_trip() {
    let first = load(&wrap(r#"<range region="foo" min="3" max="5"/>"#)).expect("parse ok");
    let entry = first.range("geneA").expect("entry");
    let input = entry.time_range("inputX").expect("input");
    assert_eq!(
        input.ranges(),
        &[RegionAndRange::new(Some("foo".into()), 3, 5, Sign::Promoter, None).unwrap()]
    );
    let second = load(&first.to_xml().unwrap()).expect("re-parse ok");
    assert_eq!(first, second);
}

#[test]
fn reserved_characters_are_escaped_on_output() {
    let first = load(&wrap(r#"<range region="a&lt;b &amp; &quot;c&quot;" min="1" note="x &gt; y"/>"#)).unwrap();
    let range = &first.entries()[0].time_ranges()[0].ranges()[0];
    assert_eq!(range.region(), Some("a<b & \"c\""));
    assert_eq!(range.max_time(), 1);
    let xml = first.to_xml().unwrap();
    assert!(xml.contains("&lt;"));
    assert_eq!(load(&xml).unwrap(), first);
}

#[test]
fn times_lists_expand_pairwise() {
    let data = load(&wrap(r#"<range region="r" times="1 2 5 8" sign="-"/>"#)).unwrap();
    let ranges = data.entries()[0].time_ranges()[0].ranges();
    assert_eq!(ranges.len(), 2);
    assert_eq!((ranges[0].min_time(), ranges[0].max_time()), (1, 2));
    assert_eq!((ranges[1].min_time(), ranges[1].max_time()), (5, 8));
    assert!(ranges.iter().all(|r| r.sign() == Sign::Repressor));
    assert_eq!(data.all_times().into_iter().collect::<Vec<_>>(), vec![1, 2, 5, 8]);
    // a single marker is a point interval
    let point = load(&wrap(r#"<range times="4"/>"#)).unwrap();
    let range = &point.entries()[0].time_ranges()[0].ranges()[0];
    assert_eq!((range.min_time(), range.max_time(), range.region()), (4, 4, None));
}

#[test]
fn malformed_intervals_fail_the_parse() {
    for range in [
        r#"<range times="1 2 3"/>"#,
        r#"<range times="1 x"/>"#,
        r#"<range min="1" times="2"/>"#,
        r#"<range region="r"/>"#,
        r#"<range min="5" max="3"/>"#,
        r#"<range min="1" sign="sideways"/>"#,
    ] {
        let err = load(&wrap(range)).unwrap_err();
        assert!(matches!(err, TimecourseError::FormatViolation { .. }), "{range}: {err}");
    }
}

#[test]
fn duplicate_names_are_rejected() {
    let twice = r#"<temporalInputs>
        <temporalRange name="geneA"/>
        <temporalRange name=" GENEA "/>
    </temporalInputs>"#;
    assert!(matches!(load(twice), Err(TimecourseError::FormatViolation { .. })));
    let inputs = r#"<temporalInputs><temporalRange name="geneA">
        <inputTimeRange name="in"><range min="1"/></inputTimeRange>
        <inputTimeRange name="In"><range min="2"/></inputTimeRange>
    </temporalRange></temporalInputs>"#;
    assert!(matches!(load(inputs), Err(TimecourseError::FormatViolation { .. })));
}

#[test]
fn ranges_need_their_owners() {
    let orphan = r#"<temporalInputs><inputTimeRange name="in"/></temporalInputs>"#;
    assert!(matches!(load(orphan), Err(TimecourseError::FormatViolation { .. })));
    let bare = r#"<temporalInputs><temporalRange name="g"><range min="1"/></temporalRange></temporalInputs>"#;
    assert!(matches!(load(bare), Err(TimecourseError::FormatViolation { .. })));
}

#[test]
fn failed_parse_publishes_nothing() {
    let store = Arc::new(DataStore::default());
    let xml = wrap(r#"<range times="1 2 3"/>"#);
    assert!(load_temporal_input(&store, &xml, FactoryOptions::modern()).is_err());
    assert!(store.get::<TemporalInputRangeData>().unwrap().is_none());
}

#[test]
fn unknown_elements_are_skipped() {
    let xml = r#"<temporalInputs><comment text="ignored"><nested/></comment>
        <temporalRange name="g" note="n" internalOnly="yes"/></temporalInputs>"#;
    let data = load(xml).unwrap();
    let entry = data.range("g").unwrap();
    assert!(entry.internal_only());
    assert_eq!(entry.note(), Some("n"));
}

#[test]
fn blank_region_and_notes_are_stored_as_absent() {
    let mut input = InputTimeRange::new("inputX").unwrap();
    input.add(RegionAndRange::new(Some(String::new()), 2, 4, Sign::Repressor, Some(" ".into())).unwrap());
    let mut entry = TemporalRange::new("geneA", Some("  ".into()), false).unwrap();
    entry.add_time_range(input).unwrap();
    let mut built = TemporalInputRangeData::new();
    built.add_entry(entry).unwrap();

    let range = &built.entries()[0].time_ranges()[0].ranges()[0];
    assert_eq!(range.region(), None);
    assert_eq!(range.note(), None);
    assert_eq!(built.entries()[0].note(), None);

    let again = load(&built.to_xml().unwrap()).expect("re-parse ok");
    assert_eq!(built, again);
}

#[test]
fn undecodable_text_in_skipped_elements_is_ignored() {
    let xml = r#"<temporalInputs><comment>see &unknownEntity; for details</comment>
        <temporalRange name="g"/></temporalInputs>"#;
    let data = load(xml).expect("parse ok");
    assert!(data.range("g").is_some());
}
