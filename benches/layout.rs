use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use incremental_layout::{
    ConnectorId, DiagramMutation, IncrementalLayoutCalculator, LayoutConfig, NodeId, Size,
};

fn add(node: u64, name: String) -> DiagramMutation {
    DiagramMutation::AddNode {
        node: NodeId(node),
        name,
        size: Size::new(50.0, 30.0),
        priority: 0,
    }
}

fn connect(connector: u64, source: u64, target: u64) -> DiagramMutation {
    DiagramMutation::AddConnector {
        connector: ConnectorId(connector),
        source: NodeId(source),
        target: NodeId(target),
    }
}

/// Straight chain: every node is the child of the previous one.
fn chain(nodes: u64) -> Vec<DiagramMutation> {
    let mut script = Vec::new();
    for i in 0..nodes {
        script.push(add(i, format!("N{i:04}")));
        if i > 0 {
            script.push(connect(1000 + i, i, i - 1));
        }
    }
    script
}

/// One root fanning out to `children` leaves.
fn fan(children: u64) -> Vec<DiagramMutation> {
    let mut script = vec![add(0, "root".to_string())];
    for i in 1..=children {
        script.push(add(i, format!("N{i:04}")));
        script.push(connect(1000 + i, i, 0));
    }
    script
}

/// Complete binary tree with `depth` levels below the root.
fn tree(depth: u32) -> Vec<DiagramMutation> {
    let mut script = vec![add(1, "N0001".to_string())];
    for i in 2..(1u64 << (depth + 1)) {
        script.push(add(i, format!("N{i:04}")));
        script.push(connect(10_000 + i, i, i / 2));
    }
    script
}

fn bench_full_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_build");
    for (name, script) in [
        ("chain_50", chain(50)),
        ("chain_200", chain(200)),
        ("fan_100", fan(100)),
        ("tree_depth_7", tree(7)),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &script, |b, script| {
            b.iter(|| {
                let mut calc = IncrementalLayoutCalculator::new(LayoutConfig::default());
                let actions = calc.calculate_layout_actions(black_box(script)).unwrap();
                black_box(actions.len());
            });
        });
    }
    group.finish();
}

fn bench_incremental_edit(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental_edit");
    for (name, script) in [("chain_200", chain(200)), ("tree_depth_7", tree(7))] {
        let mut calc = IncrementalLayoutCalculator::new(LayoutConfig::default());
        calc.calculate_layout_actions(&script).unwrap();
        // Alternately grow and shrink one leaf so state stays steady.
        let grow = DiagramMutation::ResizeNode {
            node: NodeId(1),
            size: Size::new(80.0, 30.0),
        };
        let shrink = DiagramMutation::ResizeNode {
            node: NodeId(1),
            size: Size::new(50.0, 30.0),
        };
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| {
                let a = calc
                    .calculate_layout_actions(std::slice::from_ref(&grow))
                    .unwrap();
                let b2 = calc
                    .calculate_layout_actions(std::slice::from_ref(&shrink))
                    .unwrap();
                black_box(a.len() + b2.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_full_build, bench_incremental_edit
);
criterion_main!(benches);
