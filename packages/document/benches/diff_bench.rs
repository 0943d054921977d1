use animgraph_document::{Document, DocumentBuilder, MutationInfo};
use animgraph_model::{ContentHash, Node, Registry, TITLE_PROPERTY};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

fn registry() -> Arc<Registry> {
    Registry::builder()
        .node_type("Shape", |t| {
            t.property(TITLE_PROPERTY, "shape")
                .property("int", 0i64)
                .input("in")
                .output("out")
        })
        .build()
}

/// Root with `groups` children of `leaves` children each
fn wide_document(registry: &Registry, groups: usize, leaves: usize) -> Document {
    let shape = || Arc::new(Node::new(registry, ContentHash::of("Shape")).unwrap());
    let mut builder = DocumentBuilder::new(&Document::new());
    for _ in 0..groups {
        let group = shape();
        builder.append(None, [group.clone()]).unwrap();
        builder
            .append(Some(group.as_ref()), (0..leaves).map(|_| shape()))
            .unwrap();
    }
    builder.build()
}

fn diff_single_property_edit(c: &mut Criterion) {
    let registry = registry();
    let prev = wide_document(&registry, 100, 50);
    let target = prev.nodes()[prev.len() / 2].clone();

    let mut builder = DocumentBuilder::new(&prev);
    builder
        .mutate(&target, |n| n.set_property(ContentHash::of("int"), 0.0, 1i64).map(|_| ()))
        .unwrap();
    let cur = builder.build();

    c.bench_function("diff_single_property_edit", |b| {
        b.iter(|| MutationInfo::compare(black_box(&prev), black_box(&cur)))
    });
}

fn build_single_property_edit(c: &mut Criterion) {
    let registry = registry();
    let prev = wide_document(&registry, 100, 50);
    let target = prev.nodes()[prev.len() / 2].clone();

    c.bench_function("build_single_property_edit", |b| {
        b.iter(|| {
            let mut builder = DocumentBuilder::new(black_box(&prev));
            builder
                .mutate(&target, |n| n.set_property(ContentHash::of("int"), 0.0, 1i64).map(|_| ()))
                .unwrap();
            builder.build()
        })
    });
}

criterion_group!(benches, diff_single_property_edit, build_single_property_edit);
criterion_main!(benches);
