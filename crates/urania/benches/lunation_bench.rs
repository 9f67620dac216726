use criterion::{black_box, criterion_group, criterion_main, Criterion};
use urania::lunation::{prenatal_syzygies, previous_lunation, LunationKind, SolverConfig, SyzygyPolicy};
use urania::JulianDay;

#[path = "../tests/common/mod.rs"]
mod common;

use common::MockEphemeris;

fn bench_previous_new_moon(c: &mut Criterion) {
    let eph = MockEphemeris::new();
    let config = SolverConfig::default();
    let jd = JulianDay(2_441_124.479_166_7);

    c.bench_function("previous_new_moon", |b| {
        b.iter(|| previous_lunation(&eph, black_box(jd), LunationKind::New, &config))
    });
}

fn bench_prenatal_syzygies(c: &mut Criterion) {
    let eph = MockEphemeris::new();
    let config = SolverConfig::default();
    let jd = JulianDay(2_441_124.479_166_7);

    c.bench_function("prenatal_syzygies", |b| {
        b.iter(|| prenatal_syzygies(&eph, black_box(jd), SyzygyPolicy::NatalSector, &config))
    });
}

criterion_group!(benches, bench_previous_new_moon, bench_prenatal_syzygies);
criterion_main!(benches);
