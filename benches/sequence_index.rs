use std::hint::black_box;

use chatstream::{
    domain::message::ChatMessage, model::index_range::MessageIndexRange, SequenceIndex,
};
use criterion::{criterion_group, criterion_main, Criterion};

const NEAR: &str = "90071992547409930123";
const FAR: &str = "90071992547409931123";

fn page(base: &SequenceIndex, len: usize) -> Vec<ChatMessage> {
    let mut index = base.clone();
    let mut messages = Vec::with_capacity(len);
    for i in 0..len {
        messages.push(ChatMessage::new(format!("m{i}"), index.to_string()));
        index = index.successor();
    }
    messages
}

fn benchmark(c: &mut Criterion) {
    let near = SequenceIndex::parse(NEAR).unwrap_or_default();
    let far = SequenceIndex::parse(FAR).unwrap_or_default();

    c.bench_function("compare", |b| {
        b.iter(|| black_box(&near).cmp(black_box(&far)))
    });

    c.bench_function("exceeds-by", |b| {
        b.iter(|| black_box(&far).exceeds_by(black_box(&near), black_box(19)))
    });

    c.bench_function("successor", |b| {
        b.iter(|| black_box(&near).successor())
    });

    let messages = page(&near, 100);
    c.bench_function("index-range-of-page", |b| {
        b.iter(|| MessageIndexRange::of(black_box(&messages)))
    });
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
