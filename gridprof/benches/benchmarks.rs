use criterion::{criterion_group, criterion_main, Criterion};
use gridprof::{
    vfm::{Array2, Decoder, Track, ZoneLayout},
    Angstrom, GridSpec, Selector,
};

/// Synthetic granule of `footprints` along a diagonal track.
fn synthetic(footprints: usize, bins: usize) -> (Track, Array2<f64>, Array2<f64>, Vec<f64>) {
    #[allow(clippy::cast_precision_loss)]
    let step = |i: usize| i as f64;
    let lat: Vec<f64> = (0..footprints).map(|i| 42.0 + step(i) * 0.005).collect();
    let lon: Vec<f64> = (0..footprints).map(|i| -120.0 + step(i) * 0.035).collect();
    let e532: Vec<f64> = (0..footprints * bins)
        .map(|i| 0.002 + (step(i) * 0.13).sin().abs() * 0.01)
        .collect();
    let e1064: Vec<f64> = (0..footprints * bins)
        .map(|i| 0.001 + (step(i) * 0.07).cos().abs() * 0.01)
        .collect();
    let altitude = (0..bins).map(|i| 20.0 - step(i) * 0.06).collect();
    (
        Track::new(&lat, &lon),
        Array2::from_vec(footprints, bins, e532).unwrap(),
        Array2::from_vec(footprints, bins, e1064).unwrap(),
        altitude,
    )
}

fn decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("VFM Decode");

    let layout = ZoneLayout::CALIPSO_V4;
    let decoder = Decoder::new(layout).unwrap();
    let cols = layout.packed_columns();
    #[allow(clippy::cast_possible_truncation)]
    let data: Vec<u16> = (0..cols * 3744).map(|i| (i % 0xffff) as u16).collect();
    let raw = Array2::from_vec(3744, cols, data).unwrap();

    group.bench_with_input("granule", &(decoder, raw), |b, (d, r)| {
        b.iter(|| d.decode(r).unwrap())
    });
}

fn select(c: &mut Criterion) {
    let mut group = c.benchmark_group("Grid Select");

    let (track, e532, e1064, altitude) = synthetic(4000, 399);
    let selector = Selector::builder()
        .grid(GridSpec::square(42.0, 62.0, -120.0, 20.0, 2.0))
        .derivation(Angstrom::CALIPSO)
        .build()
        .unwrap();

    group.bench_function("angstrom", |b| {
        b.iter(|| {
            selector
                .select(&track, &[&e532, &e1064], &altitude)
                .unwrap()
        })
    });
}

criterion_group!(benches, decode, select);
criterion_main!(benches);
