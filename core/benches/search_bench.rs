use criterion::{criterion_group, criterion_main, Criterion};
use forkdex_core::{build_pipeline, search_conjunctive, search_ranked, Corpus, IndexConfig, RestaurantPayload};

const WORDS: &[&str] = &[
    "pizza", "pasta", "seafood", "grilled", "wine", "terrace", "garden", "seasonal", "vegan", "sushi",
    "oven", "handmade", "cocktail", "tasting", "menu", "harbour", "truffle", "risotto", "dessert", "bakery",
];

fn corpus(n: usize) -> Corpus {
    let mut c = Corpus::new();
    for i in 0..n {
        let text: Vec<&str> = (0..12).map(|j| WORDS[(i * 7 + j * 3) % WORDS.len()]).collect();
        c.push(text.join(" "), RestaurantPayload { name: format!("r{i}"), ..Default::default() });
    }
    c
}

fn bench_search(c: &mut Criterion) {
    let corpus = corpus(1_000);
    let built = build_pipeline(corpus.documents(), IndexConfig::default()).expect("build");
    c.bench_function("ranked_top5", |b| {
        b.iter(|| search_ranked("grilled seafood terrace", &built.index, &built.vocabulary, 5))
    });
    c.bench_function("conjunctive", |b| {
        b.iter(|| search_conjunctive("handmade pasta", &built.membership, &built.boolean_vocabulary))
    });
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
