use criterion::{black_box, criterion_group, criterion_main, Criterion};

use base62x::{Codec, FlatCodec};

fn criterion_benchmark(c: &mut Criterion) {
    for &size in &[64usize, 4096, 262_144] {
        let data: Vec<u8> = (0..size).map(|i| (i * 31 % 251) as u8).collect();
        let codec = Codec::default();
        let mut flat = FlatCodec::default();
        let encoded = codec.encode_bytes(&data);

        c.bench_function(&format!("encode_iter_{}", size), |b| {
            b.iter(|| codec.encode_bytes(black_box(&data)))
        });

        c.bench_function(&format!("encode_flat_{}", size), |b| {
            b.iter(|| flat.encode_bytes(black_box(&data)))
        });

        c.bench_function(&format!("decode_iter_{}", size), |b| {
            b.iter(|| codec.decode_bytes(black_box(&encoded)).unwrap())
        });

        c.bench_function(&format!("decode_flat_{}", size), |b| {
            b.iter(|| flat.decode_bytes(black_box(&encoded)).unwrap())
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
