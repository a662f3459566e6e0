//! Criterion benchmarks for whole-ECS operations: the update loop,
//! message scheduling, and relational attachment.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sylva_bench::{flat_world, tree_world};
use sylva_bus::{Payload, TargetedPayload};
use sylva_core::{Handle, MessageTypeId};
use sylva_ecs::{Ecs, IndexKind};
use sylva_test_utils::{MsgAction, Position, Velocity};

fn bench_update_loop(c: &mut Criterion) {
    c.bench_function("update_10k_entities", |b| {
        let (mut ecs, _handles) = flat_world(10_000);
        ecs.register_system("movement", ())
            .update_each2::<Position, Velocity>(|_, p, v, _| {
                p.x += v.dx;
                p.y += v.dy;
            });
        b.iter(|| {
            ecs.update(0.016);
            black_box(ecs.now())
        });
    });
}

fn bench_component_churn(c: &mut Criterion) {
    c.bench_function("add_remove_component_1k", |b| {
        let (mut ecs, handles) = flat_world(1_000);
        b.iter(|| {
            for &h in &handles {
                ecs.remove_component::<Velocity>(h);
            }
            for &h in &handles {
                ecs.add_component(h, Velocity { dx: 2, dy: 2 });
            }
            black_box(ecs.component_count::<Velocity>())
        });
    });
}

fn bench_message_throughput(c: &mut Criterion) {
    c.bench_function("queue_and_drain_1k_messages", |b| {
        let mut ecs = Ecs::new();
        ecs.register_component::<Position>("position", IndexKind::Flat);
        ecs.register_system("sink", ())
            .on_entity::<MsgAction, Position>(|_, _, p| p.x += 1);
        let target = ecs.create();
        ecs.add_component(target, Position { x: 0, y: 0 });
        b.iter(|| {
            for i in 0..1024 {
                ecs.queue(i as f32 / 1024.0, MsgAction { entity: target });
            }
            ecs.update(1.0);
            black_box(ecs.get::<Position>(target).map(|p| p.x))
        });
    });
}

fn bench_recursive_dispatch(c: &mut Criterion) {
    #[derive(Clone, Copy, Debug)]
    struct MsgWave {
        root: Handle,
    }
    impl Payload for MsgWave {
        const MESSAGE_ID: MessageTypeId = MessageTypeId(100);
    }
    impl TargetedPayload for MsgWave {
        fn target(&self) -> Handle {
            self.root
        }
    }

    c.bench_function("recursive_dispatch_depth_64", |b| {
        let (mut ecs, handles) = tree_world(4, 64);
        ecs.register_system("wave", ())
            .on_entity::<MsgWave, sylva_test_utils::Anchor>(|_, _, a| a.label += 1);
        let root = handles[0];
        b.iter(|| {
            ecs.dispatch_recursive(MsgWave { root });
            black_box(ecs.component_count::<sylva_test_utils::Anchor>())
        });
    });
}

criterion_group!(
    benches,
    bench_update_loop,
    bench_component_churn,
    bench_message_throughput,
    bench_recursive_dispatch
);
criterion_main!(benches);
