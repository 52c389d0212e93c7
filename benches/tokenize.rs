//! Benchmarks for tokenizing and rendering lesson text
//!
//! Run with: cargo bench --bench tokenize

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lingreader::{split_sentences, Status, StorageContext, TextRenderer, Tokenizer, VocabularyStore};
use std::hint::black_box;

const PARAGRAPH: &str = "The old man didn't notice the rain. It fell softly on the roof, \
and the children kept playing in l'été's last light! Was it already evening?\n";

fn lesson(paragraphs: usize) -> String {
    PARAGRAPH.repeat(paragraphs)
}

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenizer/tokenize");
    for n in [1, 10, 100] {
        let text = lesson(n);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &text, |b, text| {
            b.iter(|| black_box(Tokenizer::tokenize(text)))
        });
    }
    group.finish();
}

fn bench_split_sentences(c: &mut Criterion) {
    let mut group = c.benchmark_group("sentence/split");
    for n in [1, 10, 100] {
        let text = lesson(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &text, |b, text| {
            b.iter(|| black_box(split_sentences(text)))
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut vocab = VocabularyStore::load(&StorageContext::in_memory());
    for (i, word) in Tokenizer::unique_words(PARAGRAPH).iter().enumerate() {
        vocab.set_status(word, Status::clamp_from(i as i64 % 6)).unwrap();
    }
    let tokens = Tokenizer::tokenize(&lesson(100));
    let renderer = TextRenderer::new(&vocab, true);
    c.bench_function("renderer/render_100", |b| b.iter(|| black_box(renderer.render(&tokens))));
}

criterion_group!(benches, bench_tokenize, bench_split_sentences, bench_render);
criterion_main!(benches);
