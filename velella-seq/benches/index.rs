use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use velella_seq::{
    decode_dna, index_sequence, BucketManager, BucketRole, IndexOptions, SpacedPattern,
};

fn random_dna(len: usize) -> Vec<u8> {
    let bases = [b'A', b'C', b'G', b'T'];
    let mut seq = Vec::with_capacity(len);
    let mut state: u64 = 42;
    for _ in 0..len {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        seq.push(bases[((state >> 33) % 4) as usize]);
    }
    seq
}

fn bench_indexing(c: &mut Criterion) {
    let pattern = SpacedPattern::parse("1100101001000101101").unwrap();
    let patterns = vec![pattern];
    let mut group = c.benchmark_group("index_sequence");
    for &len in &[1_000usize, 10_000, 100_000] {
        let codes = decode_dna(&random_dna(len));
        group.bench_with_input(BenchmarkId::from_parameter(len), &codes, |b, codes| {
            b.iter(|| {
                let mut mgr = BucketManager::new(BucketRole::References);
                index_sequence(
                    black_box(codes),
                    0,
                    &patterns,
                    &IndexOptions::default(),
                    &mut mgr,
                );
                mgr.finalize();
                mgr.word_count()
            })
        });
    }
    group.finish();
}

fn bench_sampling(c: &mut Criterion) {
    let pattern = SpacedPattern::parse("1100101001000101101").unwrap();
    let patterns = vec![pattern];
    let codes = decode_dna(&random_dna(50_000));
    let options = IndexOptions {
        min_hash_limit: Some(u32::MAX / 8),
    };
    c.bench_function("index_sequence_sampled", |b| {
        b.iter(|| {
            let mut mgr = BucketManager::new(BucketRole::References);
            index_sequence(black_box(&codes), 0, &patterns, &options, &mut mgr);
            mgr.finalize();
            mgr.word_count()
        })
    });
}

criterion_group!(benches, bench_indexing, bench_sampling);
criterion_main!(benches);
