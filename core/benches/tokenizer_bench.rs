use criterion::{criterion_group, criterion_main, Criterion};
use moviesearch_core::{Document, InvertedIndex, Stopwords, Tokenizer};

const PLOT: &str = "When a killer shark unleashes chaos on a beach community off Cape Cod, \
it's up to a local sheriff, a marine biologist, and an old seafarer to hunt the beast down.";

fn bench_tokenize(c: &mut Criterion) {
    let tokenizer = Tokenizer::new(Stopwords::english());
    c.bench_function("tokenize_plot", |b| b.iter(|| tokenizer.tokenize(PLOT)));
}

fn bench_build(c: &mut Criterion) {
    let tokenizer = Tokenizer::shared(Stopwords::english());
    let docs: Vec<Document> = (0..500).map(|i| Document::new(i, format!("Movie {i}"), PLOT)).collect();
    c.bench_function("build_500_docs", |b| {
        b.iter(|| {
            let mut idx = InvertedIndex::new(tokenizer.clone());
            idx.build(&docs);
            idx
        })
    });
}

criterion_group!(benches, bench_tokenize, bench_build);
criterion_main!(benches);
