//! Minimal end-to-end example: one component, one system, one message.
//!
//! Run with `cargo run --example quickstart -p sylva-ecs`.

use sylva_bus::{Payload, TargetedPayload};
use sylva_core::{Handle, MessageTypeId};
use sylva_ecs::{Ecs, IndexKind};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Position {
    x: i32,
    y: i32,
}

#[derive(Clone, Copy, Debug)]
struct MsgAction {
    entity: Handle,
}

impl Payload for MsgAction {
    const MESSAGE_ID: MessageTypeId = MessageTypeId(0);
}

impl TargetedPayload for MsgAction {
    fn target(&self) -> Handle {
        self.entity
    }
}

fn main() {
    let mut ecs = Ecs::new();
    ecs.register_component::<Position>("position", IndexKind::Flat);

    // A system is any value; capabilities are wired explicitly.
    ecs.register_system("position_system", ())
        .update_each::<Position>(|_, p, _dt| p.x += 1)
        .on_entity::<MsgAction, Position>(|_, _msg, p| p.y -= 1);

    let being = ecs.create();
    ecs.add_component(being, Position { x: 3, y: 4 });

    ecs.dispatch(MsgAction { entity: being });
    ecs.update(1.0);

    let p = *ecs.get::<Position>(being).expect("being has a position");
    println!("position after one frame: ({}, {})", p.x, p.y);
    assert_eq!(p, Position { x: 4, y: 3 });
}
