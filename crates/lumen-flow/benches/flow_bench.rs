//! Benchmarks for the flow-control hot paths.

use std::time::{Duration, Instant};

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use lumen_core::{FlowParams, RequestId};
use lumen_flow::recharge::recharge;
use lumen_flow::{ClientTracker, ServerTracker};

const PARAMS: FlowParams = FlowParams::new(300_000_000, 50_000);

fn bench_recharge(c: &mut Criterion) {
    c.bench_function("recharge_1s", |b| {
        b.iter(|| {
            recharge(
                black_box(150_000_000),
                black_box(PARAMS),
                black_box(Duration::from_secs(1)),
            )
        })
    });
}

fn bench_can_send(c: &mut Criterion) {
    let t0 = Instant::now();
    let tracker = ServerTracker::new_at(PARAMS, t0);
    c.bench_function("can_send", |b| {
        b.iter(|| tracker.can_send_at(black_box(1_000_000), t0))
    });
}

fn bench_request_cycle(c: &mut Criterion) {
    let t0 = Instant::now();
    c.bench_function("queue_and_reply", |b| {
        let tracker = ServerTracker::new_at(PARAMS, t0);
        let mut id = 0u64;
        b.iter(|| {
            id += 1;
            tracker.queue_request_at(RequestId::new(id), black_box(1_000_000), t0);
            tracker.got_reply_at(RequestId::new(id), black_box(299_000_000), t0);
        })
    });
}

fn bench_serving_side(c: &mut Criterion) {
    let t0 = Instant::now();
    let tracker = ClientTracker::new_at(PARAMS, t0);
    c.bench_function("accept_and_charge", |b| {
        // Advance a millisecond per iteration so recharge outpaces the
        // charged cost and the buffer never runs dry.
        let mut now = t0;
        b.iter(|| {
            now += Duration::from_millis(1);
            let admission = tracker.accept_request_at(now);
            black_box(admission);
            tracker.request_processed_at(black_box(1_000), now)
        })
    });
}

criterion_group!(
    benches,
    bench_recharge,
    bench_can_send,
    bench_request_cycle,
    bench_serving_side
);
criterion_main!(benches);
