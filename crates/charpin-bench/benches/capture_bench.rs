//! Capture pipeline benchmarks.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use charpin_core::{PluginRegistry, reference};
use charpin_harness::loader::{ReferenceLoader, SourceLoader};
use charpin_harness::{capture, render};

const SOURCE: &str = "\
struct ListNode {
    val: i64,
    next: Option<Box<ListNode>>,
}

fn insert_into_sorted(head: Option<Box<ListNode>>, val: i64) -> Option<Box<ListNode>> {
    unimplemented!()
}
";

fn bench_capture(c: &mut Criterion) {
    let registry = PluginRegistry::standard();
    let module = ReferenceLoader.load(SOURCE).expect("reference module");
    let context = module.context();
    let target = module
        .resolve_target("insert_into_sorted")
        .expect("known target");

    c.bench_function("capture/insert_into_sorted", |b| {
        b.iter(|| {
            let snapshots = capture(&target, &registry, &context).expect("capture");
            black_box(snapshots);
        });
    });
}

fn bench_render(c: &mut Criterion) {
    let registry = PluginRegistry::standard();
    let module = ReferenceLoader.load(SOURCE).expect("reference module");
    let context = module.context();
    let target = module
        .resolve_target("insert_into_sorted")
        .expect("known target");
    let snapshots = capture(&target, &registry, &context).expect("capture");

    c.bench_function("render/insert_into_sorted", |b| {
        b.iter(|| {
            let script =
                render("insert_into_sorted", SOURCE, &snapshots).expect("render");
            black_box(script);
        });
    });
}

fn bench_round_trip(c: &mut Criterion) {
    let registry = PluginRegistry::standard();
    let ctx = reference::reference_context();
    let ty = charpin_core::CanonicalType::Structure(charpin_core::StructureKind::ListNode);
    let reprs = registry.strategy(ty).expect("strategy");

    c.bench_function("round_trip/list_node", |b| {
        b.iter(|| {
            for repr in &reprs {
                let value = registry.convert(ty, repr, &ctx).expect("convert");
                let back = registry.serialize(ty, &value, &ctx).expect("serialize");
                black_box(back);
            }
        });
    });
}

criterion_group!(benches, bench_capture, bench_render, bench_round_trip);
criterion_main!(benches);
