use std::fmt::Write;
use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use timecourse::factory::FactoryOptions;
use timecourse::range::split_ranges;
use timecourse::reader::{load_temporal_input, load_time_course};
use timecourse::store::DataStore;

// genes x times x regions observations, all sharing one template
fn synthetic_time_course(genes: usize, times: i32, regions: usize) -> String {
    let mut xml = String::from("<timeCourseData serialNum=\"1\">\n");
    for g in 0..genes {
        writeln!(xml, "  <timeCourse gene=\"gene{g}\">").unwrap();
        for t in 0..times {
            for r in 0..regions {
                let expr = ["no", "weak", "yes"][(g + r) % 3];
                writeln!(xml, "    <data time=\"{t}\" region=\"region{r}\" expr=\"{expr}\"/>").unwrap();
            }
        }
        xml.push_str("  </timeCourse>\n");
    }
    xml.push_str("</timeCourseData>\n");
    xml
}

fn synthetic_temporal(entries: usize, inputs: usize) -> String {
    let mut xml = String::from("<temporalInputs>\n");
    for e in 0..entries {
        writeln!(xml, "  <temporalRange name=\"target{e}\">").unwrap();
        for i in 0..inputs {
            writeln!(xml, "    <inputTimeRange name=\"input{i}\">").unwrap();
            writeln!(xml, "      <range region=\"r{i}\" times=\"0 5 10 15 20 30\" sign=\"-\"/>").unwrap();
            xml.push_str("    </inputTimeRange>\n");
        }
        xml.push_str("  </temporalRange>\n");
    }
    xml.push_str("</temporalInputs>\n");
    xml
}

fn bench_time_course(c: &mut Criterion) {
    let xml = synthetic_time_course(200, 12, 6);
    c.bench_function("parse time course 200 genes", |b| {
        b.iter(|| {
            let store = Arc::new(DataStore::default());
            black_box(load_time_course(&store, black_box(&xml), FactoryOptions::modern()).unwrap());
        })
    });
}

fn bench_temporal(c: &mut Criterion) {
    let xml = synthetic_temporal(100, 8);
    c.bench_function("parse temporal inputs 100 entries", |b| {
        b.iter(|| {
            let store = Arc::new(DataStore::default());
            black_box(load_temporal_input(&store, black_box(&xml), FactoryOptions::modern()).unwrap());
        })
    });
    c.bench_function("split ranges", |b| {
        b.iter(|| black_box(split_ranges(black_box("1 2 3 4 5 6 7 8 9 10 11 12")).unwrap()))
    });
}

criterion_group!(benches, bench_time_course, bench_temporal);
criterion_main!(benches);
