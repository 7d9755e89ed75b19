use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use kauma::gf128::FieldElement;

fn bench_gf_mul(c: &mut Criterion) {
    let a = FieldElement::new(0x0123456789abcdef_fedcba9876543210);
    let b = FieldElement::new(0xdeadbeefcafebabe_0011223344556677);
    c.bench_function("gf128_mul", |bench| {
        bench.iter(|| black_box(a) * black_box(b))
    });
}

fn bench_gf_inv(c: &mut Criterion) {
    let a = FieldElement::new(0x0123456789abcdef_fedcba9876543210);
    c.bench_function("gf128_inv", |bench| bench.iter(|| black_box(a).inv()));
}

criterion_group!(benches, bench_gf_mul, bench_gf_inv);
criterion_main!(benches);
