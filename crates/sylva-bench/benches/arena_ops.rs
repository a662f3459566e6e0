//! Criterion micro-benchmarks for handle allocation, the forest, and
//! raw column storage.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sylva_arena::{HandleForest, HandleManager};
use sylva_core::Handle;
use sylva_storage::{Column, FlatIndexTable, HashedIndexTable, IndexTable};

fn bench_handle_churn(c: &mut Criterion) {
    c.bench_function("handle_create_free_churn_1k", |b| {
        b.iter(|| {
            let mut m = HandleManager::new();
            let mut live = Vec::with_capacity(1024);
            for _ in 0..1024 {
                live.push(m.create());
            }
            for h in live.drain(..) {
                m.free(h);
            }
            black_box(m.slot_count())
        });
    });
}

fn bench_forest_attach(c: &mut Criterion) {
    c.bench_function("forest_attach_chain_256", |b| {
        b.iter(|| {
            let mut f = HandleForest::new();
            let mut parent = f.create();
            for _ in 0..256 {
                let child = f.create();
                f.attach(parent, child);
                parent = child;
            }
            black_box(f.slot_count())
        });
    });
}

fn bench_column_swap_remove(c: &mut Criterion) {
    c.bench_function("column_fill_then_drain_1k", |b| {
        b.iter(|| {
            let mut col: Column<u64> = Column::with_sidecar();
            for i in 0..1024u16 {
                col.push(Handle::new(i, 1), u64::from(i));
            }
            while !col.is_empty() {
                col.pop_swap(0);
            }
            black_box(col.len())
        });
    });
}

fn bench_index_tables(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_insert_remove_1k");
    group.bench_function("flat", |b| {
        b.iter(|| index_churn(&mut FlatIndexTable::new()));
    });
    group.bench_function("hashed", |b| {
        b.iter(|| index_churn(&mut HashedIndexTable::new()));
    });
    group.finish();
}

fn index_churn(table: &mut dyn IndexTable) -> usize {
    let mut col: Column<u64> = Column::with_sidecar();
    for i in 0..1024u16 {
        let h = Handle::new(i, 1);
        table.insert(h, &col);
        col.push(h, u64::from(i));
    }
    for i in 0..1024u16 {
        table.remove_swap(Handle::new(i, 1), &mut col);
    }
    table.len()
}

criterion_group!(
    benches,
    bench_handle_churn,
    bench_forest_attach,
    bench_column_swap_remove,
    bench_index_tables
);
criterion_main!(benches);
