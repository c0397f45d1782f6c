//! Criterion benchmarks for perft (exhaustive pseudo-legal move generation
//! plus check filtering), which doubles as a correctness check: a wrong node
//! count here means move generation regressed.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use zugzwang_core::chess::position::{perft, Position};

fn perft_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");
    for (position, depth, nodes) in &[
        // Position 1 (starting position).
        (Position::starting(), 5, 4_865_609),
        // Position 3.
        (
            Position::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap(),
            5,
            674_624,
        ),
        // "Kiwipete".
        (
            Position::from_fen(
                "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            )
            .unwrap(),
            4,
            4_085_603,
        ),
    ] {
        group.throughput(criterion::Throughput::Elements(*nodes));
        group.bench_with_input(
            BenchmarkId::new(
                "perft",
                format!("position {position}, depth {depth}, nodes {nodes}"),
            ),
            depth,
            |b, &depth| {
                b.iter(|| {
                    assert_eq!(perft(position, depth), *nodes);
                });
            },
        );
    }
    group.finish();
}

criterion_group! {
    name = perft_benches;
    config = Criterion::default().sample_size(10);
    targets = perft_bench
}

criterion_main!(perft_benches);
