use criterion::{criterion_group, criterion_main, Criterion};
use decfuzz::{config::Config, fuzzer::Fuzzer, gen::gen_instruction, RngType};
use rand::SeedableRng;

pub fn bench_gen(c: &mut Criterion) {
    let mut rng = RngType::seed_from_u64(0);
    c.bench_function("Gen", |b| b.iter(|| gen_instruction(&mut rng, true)));
}

pub fn bench_fuzz_one(c: &mut Criterion) {
    let mut fuzzer = Fuzzer::new(Config::default());
    c.bench_function("FuzzOne", |b| b.iter(|| fuzzer.fuzz_one()));
}

criterion_group!(benches, bench_gen, bench_fuzz_one);
criterion_main!(benches);
