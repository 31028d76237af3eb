use criterion::{criterion_group, criterion_main, Criterion};
use forkdex_core::normalize;

const TEXT: &str = "Set in a restored seventeenth-century farmhouse, the restaurant serves \
    seasonal Tuscan cooking: handmade pici with wild boar ragu, grilled Chianina steak, \
    vegetables from the kitchen garden and an extensive list of local wines. \
    Booking recommended on weekends; open 0700-2300.";

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize_description", |b| b.iter(|| normalize(TEXT)));
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
