use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bwt_index::index::{sa, FmIndex, IndexOpt, RankIndex};

fn make_text(len: usize) -> Vec<u8> {
    let mut seq = Vec::with_capacity(len);
    let mut x: u32 = 42;
    for _ in 0..len {
        x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        seq.push(((x >> 16) & 3) as u8);
    }
    seq
}

fn build_index(text: &[u8]) -> FmIndex {
    FmIndex::build(text, IndexOpt::default()).unwrap()
}

fn bench_backward_search(c: &mut Criterion) {
    let text = make_text(100_000);
    let fm = build_index(&text);
    let pattern = text[1000..1020].to_vec();

    c.bench_function("backward_search_20bp", |b| {
        b.iter(|| {
            black_box(fm.backward_search(black_box(&pattern)).unwrap());
        })
    });
}

fn bench_occurrence4(c: &mut Criterion) {
    let text = make_text(100_000);
    let fm = build_index(&text);
    let bwt = fm.bwt();
    let rows: Vec<u32> = (0..1024u32).map(|i| i.wrapping_mul(2_654_435_761) % bwt.seq_len()).collect();

    c.bench_function("occurrence4_1k_rows", |b| {
        b.iter(|| {
            for &k in &rows {
                black_box(bwt.occurrence4(black_box(k)));
            }
        })
    });
}

fn bench_dual_occurrence(c: &mut Criterion) {
    let text = make_text(100_000);
    let fm = build_index(&text);
    let bwt = fm.bwt();
    let pairs: Vec<(u32, u32)> = (0..1024u32)
        .map(|i| {
            let k = i.wrapping_mul(2_654_435_761) % (bwt.seq_len() - 64);
            (k, k + (i % 64))
        })
        .collect();

    c.bench_function("dual_occurrence_1k_pairs", |b| {
        b.iter(|| {
            for &(k, l) in &pairs {
                black_box(bwt.dual_occurrence(black_box(k), black_box(l), 2));
            }
        })
    });
    c.bench_function("dual_occurrence4_1k_pairs", |b| {
        b.iter(|| {
            for &(k, l) in &pairs {
                black_box(bwt.dual_occurrence4(black_box(k), black_box(l)));
            }
        })
    });
}

fn bench_suffix_at(c: &mut Criterion) {
    let text = make_text(100_000);
    let fm = build_index(&text);
    let rows: Vec<u32> = (0..256u32).map(|i| i.wrapping_mul(2_654_435_761) % fm.bwt().seq_len()).collect();

    c.bench_function("suffix_at_256_rows", |b| {
        b.iter(|| {
            for &k in &rows {
                black_box(fm.suffix_at(black_box(k)));
            }
        })
    });
}

fn bench_build(c: &mut Criterion) {
    let text = make_text(10_000);

    c.bench_function("build_sa_10k", |b| {
        b.iter(|| {
            black_box(sa::build_sa(black_box(&text)));
        })
    });
    c.bench_function("build_index_10k", |b| {
        b.iter(|| {
            black_box(build_index(black_box(&text)));
        })
    });
}

criterion_group!(benches, bench_backward_search, bench_occurrence4, bench_dual_occurrence, bench_suffix_at, bench_build);
criterion_main!(benches);
