use criterion::{criterion_group, criterion_main};

mod shadow;

criterion_group!(
    benches,
    shadow::dispatch::bench_decode_state,
    shadow::dispatch::bench_native_event,
    shadow::dispatch::bench_update,
    shadow::dispatch::bench_update_typed
);
criterion_main!(benches);
