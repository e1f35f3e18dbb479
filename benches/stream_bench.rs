use criterion::{black_box, criterion_group, criterion_main, Criterion};
use msfio::perf::read_stream;
use std::io::{Read, Seek, SeekFrom};

#[path = "../tests/common/mod.rs"]
mod common;

use common::{pattern, Builder};

fn image(block_size: u32) -> Vec<u8> {
    let mut b = Builder::new(block_size);
    b.stream(&pattern(1, 64 * 1024))
        .stream(&pattern(2, 1024 * 1024));
    b.build()
}

fn bench_sequential(c: &mut Criterion) {
    let streams = msfio::open(image(4096)).unwrap();
    let big = &streams[1];

    c.bench_function("read_stream_1mb_4k_blocks", |b| {
        b.iter(|| read_stream(black_box(big)).unwrap())
    });

    c.bench_function("io_read_1mb_in_300b_chunks", |b| {
        b.iter(|| {
            let mut s = big.clone();
            s.seek(SeekFrom::Start(0)).unwrap();
            let mut buf = [0u8; 300];
            let mut total = 0usize;
            loop {
                let n = s.read(&mut buf).unwrap();
                if n == 0 { break; }
                total += n;
            }
            total
        })
    });
}

fn bench_scattered(c: &mut Criterion) {
    let streams = msfio::open(image(512)).unwrap();
    let big = &streams[1];
    let mut buf = [0u8; 64];

    c.bench_function("read_at_block_straddle_512", |b| {
        b.iter(|| {
            let mut pos = 480u64;
            while pos < big.len() {
                black_box(big.read_at(pos, &mut buf).unwrap());
                pos += 4096;
            }
        })
    });
}

fn bench_open(c: &mut Criterion) {
    let img = image(512);
    c.bench_function("open_1mb_container_512", |b| {
        b.iter(|| msfio::open(black_box(img.as_slice())).unwrap().len())
    });
}

criterion_group!(benches, bench_sequential, bench_scattered, bench_open);
criterion_main!(benches);
