use criterion::{black_box, criterion_group, criterion_main, Criterion};
use urania::houses::{compute_houses, HouseSystem};
use urania::JulianDay;

#[path = "../tests/common/mod.rs"]
mod common;

use common::{tallinn, MockEphemeris};

fn bench_compute_houses(c: &mut Criterion) {
    let eph = MockEphemeris::new();
    let jd = JulianDay(2_441_124.479_166_7);

    c.bench_function("compute_houses_koch", |b| {
        b.iter(|| {
            eph.house_calls.borrow_mut().clear();
            compute_houses(&eph, black_box(jd), tallinn(), HouseSystem::Koch)
        })
    });
}

criterion_group!(benches, bench_compute_houses);
criterion_main!(benches);
