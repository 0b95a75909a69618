use bspline_rs::{averaged_knots, clamp_ends, BasisWorkspace, BsplineBasis};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array1;

fn cubic_basis(num_breakpoints: usize) -> BsplineBasis {
    let breakpoints = Array1::linspace(0.0, 1.0, num_breakpoints);
    BsplineBasis::new(clamp_ends(&breakpoints, 3).unwrap(), 3).unwrap()
}

fn bench_evaluate(c: &mut Criterion) {
    let basis = cubic_basis(64);
    c.bench_function("evaluate cubic, 64 breakpoints", |b| {
        b.iter(|| basis.evaluate(black_box(0.4137)))
    });

    let mut workspace = BasisWorkspace::with_capacity(basis.knots().len());
    let mut out = vec![0.0; basis.num_basis()];
    c.bench_function("evaluate_into cubic, 64 breakpoints", |b| {
        b.iter(|| basis.evaluate_into(black_box(0.4137), &mut workspace, &mut out))
    });

    let second = basis.derivative(2).unwrap();
    c.bench_function("second derivative cubic, 64 breakpoints", |b| {
        b.iter(|| second.evaluate(black_box(0.4137)))
    });
}

fn bench_collocation(c: &mut Criterion) {
    let sites = Array1::linspace(0.0, 1.0, 200);
    let basis = BsplineBasis::new(averaged_knots(&sites, 3).unwrap(), 3).unwrap();
    c.bench_function("collocation 200x200 cubic", |b| {
        b.iter(|| basis.collocation_matrix(black_box(&sites), 0).unwrap())
    });
    c.bench_function("osculatory collocation 200 sites", |b| {
        b.iter(|| basis.osculatory_collocation_matrix(black_box(&sites)).unwrap())
    });
}

criterion_group!(benches, bench_evaluate, bench_collocation);
criterion_main!(benches);
