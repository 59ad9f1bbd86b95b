// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::Cell;
use std::rc::Rc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_event_target::listener::Listener;
use understory_event_target::target::EventTarget;

/// Root-first chain of `depth` targets; the last one is the dispatch target.
fn gen_chain(depth: usize) -> Vec<EventTarget> {
    let nodes: Vec<EventTarget> = (0..depth).map(|_| EventTarget::new()).collect();
    for pair in nodes.windows(2) {
        pair[1].set_parent(Some(&pair[0]));
    }
    nodes
}

fn counter() -> (Rc<Cell<u64>>, Listener) {
    let hits = Rc::new(Cell::new(0));
    let sink = Rc::clone(&hits);
    (hits, Listener::new(move |_, _| sink.set(sink.get() + 1)))
}

fn bench_chain_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_chain");
    for &depth in &[1usize, 8, 64, 512] {
        let nodes = gen_chain(depth);
        let (hits, l) = counter();
        for node in &nodes {
            node.listen("tick", &l, true, None).unwrap();
            node.listen("tick", &l, false, None).unwrap();
        }
        let leaf = nodes.last().unwrap();
        group.throughput(Throughput::Elements((2 * depth) as u64));
        group.bench_function(format!("capture_bubble_depth{}", depth), |b| {
            b.iter(|| black_box(leaf.dispatch("tick").unwrap()));
        });
        black_box(hits.get());
    }
    group.finish();
}

fn bench_wide_target(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_wide");
    for &n in &[1usize, 16, 256] {
        let target: EventTarget = EventTarget::new();
        let listeners: Vec<_> = (0..n).map(|_| counter()).collect();
        for (_, l) in &listeners {
            target.listen("tick", l, false, None).unwrap();
        }
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("listeners{}", n), |b| {
            b.iter(|| black_box(target.dispatch("tick").unwrap()));
        });
    }
    group.finish();
}

fn bench_listen_once(c: &mut Criterion) {
    let mut group = c.benchmark_group("listen_once");
    let (_hits, l) = counter();
    group.bench_function("register_then_fire", |b| {
        b.iter_batched(
            EventTarget::new,
            |target: EventTarget| {
                target.listen_once("tick", &l, false, None).unwrap();
                black_box(target.dispatch("tick").unwrap());
                black_box(target.dispatch("tick").unwrap());
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_no_listeners(c: &mut Criterion) {
    let nodes = gen_chain(32);
    let leaf = nodes.last().unwrap();
    c.bench_function("dispatch_unlistened_depth32", |b| {
        b.iter(|| black_box(leaf.dispatch("nothing").unwrap()));
    });
}

criterion_group!(
    benches,
    bench_chain_depth,
    bench_wide_target,
    bench_listen_once,
    bench_no_listeners,
);
criterion_main!(benches);
