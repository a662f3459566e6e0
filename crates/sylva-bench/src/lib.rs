//! Benchmark profiles for the Sylva entity-component-system.
//!
//! Pre-built world shapes shared by the criterion benches:
//!
//! - [`flat_world`]: N root entities with `Position` and `Velocity`.
//! - [`tree_world`]: a forest of small subtrees carrying relational
//!   [`Anchor`] components.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use sylva_core::Handle;
use sylva_ecs::{Ecs, IndexKind};
use sylva_test_utils::{Anchor, Position, Velocity};

/// Deterministic RNG for benchmark shuffles.
pub fn bench_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}

/// An ECS with `n` root entities, each carrying `Position` and
/// `Velocity`, plus the entity list in shuffled order for churn loops.
pub fn flat_world(n: usize) -> (Ecs, Vec<Handle>) {
    let mut ecs = Ecs::new();
    ecs.register_component::<Position>("position", IndexKind::Flat);
    ecs.register_component::<Velocity>("velocity", IndexKind::Flat);

    let mut handles = Vec::with_capacity(n);
    for i in 0..n {
        let h = ecs.create();
        ecs.add_component(
            h,
            Position {
                x: i as i32,
                y: 0,
            },
        );
        ecs.add_component(h, Velocity { dx: 1, dy: 1 });
        handles.push(h);
    }
    handles.shuffle(&mut bench_rng());
    (ecs, handles)
}

/// An ECS holding `roots` subtrees of `depth` chained entities, every
/// entity carrying a relational [`Anchor`].
pub fn tree_world(roots: usize, depth: usize) -> (Ecs, Vec<Handle>) {
    let mut ecs = Ecs::new();
    ecs.register_relational::<Anchor>("anchor", IndexKind::Flat);

    let mut handles = Vec::with_capacity(roots * depth);
    for r in 0..roots {
        let mut parent = ecs.create();
        ecs.add_component(parent, Anchor::new(parent, r as u32));
        handles.push(parent);
        for d in 1..depth {
            let child = ecs.create();
            ecs.add_component(child, Anchor::new(child, d as u32));
            ecs.attach(parent, child);
            handles.push(child);
            parent = child;
        }
    }
    (ecs, handles)
}
