//! Message dispatch, scheduling, and hierarchical delivery.

use sylva_ecs::{Ecs, IndexKind};
use sylva_test_utils::{CallLog, MsgAction, MsgDamage, MsgTick, Position};

fn base_ecs() -> Ecs {
    let mut e = Ecs::new();
    e.register_component::<Position>("position", IndexKind::Flat);
    e
}

// ── immediate dispatch ─────────────────────────────────────────

#[test]
fn action_handler_mutates_the_target_component() {
    let mut e = base_ecs();
    e.register_system("position_system", ())
        .on_entity::<MsgAction, Position>(|_, _, p| p.y -= 1)
        .update_each::<Position>(|_, p, _| p.x += 1);

    let being = e.create();
    e.add_component(being, Position { x: 3, y: 4 });

    e.dispatch(MsgAction { entity: being });
    e.update(1.0);

    assert_eq!(*e.get::<Position>(being).unwrap(), Position { x: 4, y: 3 });
}

#[test]
fn entity_handler_skips_targets_without_the_component() {
    let mut e = base_ecs();
    let log = CallLog::new();
    {
        let log = log.clone();
        e.register_system("s", ())
            .on_entity::<MsgAction, Position>(move |_, _, _| log.push("hit"));
    }
    let bare = e.create();
    e.dispatch(MsgAction { entity: bare });
    assert!(log.is_empty());
}

#[test]
fn plain_handler_needs_no_target() {
    let mut e = base_ecs();
    let log = CallLog::new();
    {
        let log = log.clone();
        e.register_system("s", ())
            .on::<MsgTick>(move |_, tick| log.push(format!("tick {}", tick.elapsed)));
    }
    e.dispatch(MsgTick { elapsed: 0.5 });
    assert_eq!(log.take(), vec!["tick 0.5"]);
}

#[test]
fn handlers_run_in_registration_order() {
    let mut e = base_ecs();
    let log = CallLog::new();
    {
        let log = log.clone();
        e.register_system("first", ())
            .on::<MsgTick>(move |_, _| log.push("first"));
    }
    {
        let log = log.clone();
        e.register_system("second", ())
            .on::<MsgTick>(move |_, _| log.push("second"));
    }
    e.dispatch(MsgTick { elapsed: 0.0 });
    assert_eq!(log.take(), vec!["first", "second"]);
}

#[test]
fn ecs_aware_handler_can_mutate_the_world() {
    let mut e = base_ecs();
    e.register_system("spawner", ())
        .on_ecs::<MsgTick>(|_, _, ctx| {
            let h = ctx.world.create();
            ctx.world.add_component(h, Position { x: 99, y: 0 });
        });
    e.dispatch(MsgTick { elapsed: 0.0 });
    assert_eq!(e.component_count::<Position>(), 1);
}

// ── scheduled delivery ─────────────────────────────────────────

#[test]
fn delayed_messages_deliver_in_time_order() {
    let mut e = base_ecs();
    let log = CallLog::new();
    {
        let log = log.clone();
        e.register_system("x", ())
            .on_ecs::<MsgTick>(move |_, _, ctx| log.push(format!("x@{}", ctx.now())));
    }
    {
        let log = log.clone();
        e.register_system("y", ())
            .on_ecs::<MsgDamage>(move |_, _, ctx| log.push(format!("y@{}", ctx.now())));
    }

    let target = e.create();
    e.queue(0.5, MsgTick { elapsed: 0.0 });
    e.queue(0.25, MsgDamage { entity: target, amount: 1 });
    e.update(1.0);

    // The damage message was scheduled earlier, so its handler runs
    // first; both observe the post-advance clock.
    assert_eq!(log.take(), vec!["y@1", "x@1"]);
}

#[test]
fn undue_messages_survive_the_update() {
    let mut e = base_ecs();
    let log = CallLog::new();
    {
        let log = log.clone();
        e.register_system("s", ())
            .on::<MsgTick>(move |_, _| log.push("tick"));
    }
    e.queue(2.0, MsgTick { elapsed: 0.0 });
    e.update(1.0);
    assert!(log.is_empty());
    assert!(e.events_pending());
    e.update(1.0);
    assert_eq!(log.len(), 1);
    assert!(!e.events_pending());
}

#[test]
fn zero_dt_skips_the_drain_entirely() {
    let mut e = base_ecs();
    let log = CallLog::new();
    {
        let log = log.clone();
        e.register_system("s", ())
            .on::<MsgTick>(move |_, _| log.push("tick"));
    }
    e.queue(0.0, MsgTick { elapsed: 0.0 });
    e.update(0.0);
    // The message was due, but dt == 0 advances nothing and delivers
    // nothing.
    assert!(log.is_empty());
    assert!(e.events_pending());
    assert_eq!(e.now(), 0.0);
}

#[test]
fn handler_queued_due_followup_delivers_in_the_same_drain() {
    let mut e = base_ecs();
    let log = CallLog::new();
    {
        let log = log.clone();
        e.register_system("chain", ())
            .on_ecs::<MsgTick>(move |_, _, ctx| {
                log.push("tick");
                ctx.queue(0.0, MsgDamage {
                    entity: sylva_core::Handle::NULL,
                    amount: 0,
                });
            });
    }
    {
        let log = log.clone();
        e.register_system("sink", ())
            .on::<MsgDamage>(move |_, _| log.push("damage"));
    }
    e.queue(0.5, MsgTick { elapsed: 0.0 });
    e.update(1.0);
    assert_eq!(log.take(), vec!["tick", "damage"]);
}

#[test]
fn update_step_snaps_the_clock_monotonically() {
    let mut e = base_ecs();
    let h = e.create();
    e.queue(0.3, MsgDamage { entity: h, amount: 1 });
    e.queue(0.1, MsgDamage { entity: h, amount: 2 });
    e.queue(0.7, MsgDamage { entity: h, amount: 3 });

    let t1 = e.update_step();
    let t2 = e.update_step();
    let t3 = e.update_step();
    assert_eq!((t1, t2, t3), (0.1, 0.3, 0.7));
    // Empty queue: no-op, clock stays put.
    assert_eq!(e.update_step(), 0.7);
}

// ── recursive delivery ─────────────────────────────────────────

#[test]
fn recursive_dispatch_covers_the_subtree_pre_order() {
    let mut e = base_ecs();
    let log = CallLog::new();
    {
        let log = log.clone();
        e.register_system("s", ())
            .on_entity::<MsgAction, Position>(move |_, _, p| log.push(format!("{}", p.x)));
    }

    let root = e.create();
    let a = e.create();
    let b = e.create();
    let under_b = e.create();
    e.attach(root, a);
    e.attach(root, b); // b is now the first child
    e.attach(b, under_b);
    for (i, h) in [root, a, b, under_b].into_iter().enumerate() {
        e.add_component(h, Position { x: i as i32, y: 0 });
    }

    e.dispatch_recursive(MsgAction { entity: root });
    // Pre-order, target first, children in reverse attach order.
    assert_eq!(log.take(), vec!["0", "2", "3", "1"]);
}

#[test]
fn non_recursive_dispatch_hits_only_the_target() {
    let mut e = base_ecs();
    let log = CallLog::new();
    {
        let log = log.clone();
        e.register_system("s", ())
            .on_entity::<MsgAction, Position>(move |_, _, p| log.push(format!("{}", p.x)));
    }
    let root = e.create();
    let child = e.create();
    e.attach(root, child);
    e.add_component(root, Position { x: 0, y: 0 });
    e.add_component(child, Position { x: 1, y: 0 });

    e.dispatch(MsgAction { entity: root });
    assert_eq!(log.take(), vec!["0"]);
}

#[test]
fn queued_recursive_message_keeps_its_flag() {
    let mut e = base_ecs();
    let log = CallLog::new();
    {
        let log = log.clone();
        e.register_system("s", ())
            .on_entity::<MsgAction, Position>(move |_, _, p| log.push(format!("{}", p.x)));
    }
    let root = e.create();
    let child = e.create();
    e.attach(root, child);
    e.add_component(root, Position { x: 0, y: 0 });
    e.add_component(child, Position { x: 1, y: 0 });

    e.queue_recursive(0.5, MsgAction { entity: root });
    e.update(1.0);
    assert_eq!(log.take(), vec!["0", "1"]);
}

#[test]
fn message_to_a_dead_entity_is_dropped() {
    let mut e = base_ecs();
    let log = CallLog::new();
    {
        let log = log.clone();
        e.register_system("s", ())
            .on_entity::<MsgAction, Position>(move |_, _, _| log.push("hit"));
    }
    let doomed = e.create();
    e.add_component(doomed, Position::default());
    e.queue(0.5, MsgAction { entity: doomed });
    e.remove(doomed);
    e.update(1.0);
    assert!(log.is_empty());
}

#[test]
fn entity_handler_gathers_multiple_components() {
    use sylva_test_utils::Velocity;
    let mut e = base_ecs();
    e.register_component::<Velocity>("velocity", IndexKind::Flat);
    let log = CallLog::new();
    {
        let log = log.clone();
        e.register_system("s", ())
            .on_entity2::<MsgAction, Position, Velocity>(move |_, _, p, v| {
                log.push(format!("{},{}", p.x, v.dx));
            });
    }
    let both = e.create();
    e.add_component(both, Position { x: 1, y: 0 });
    e.add_component(both, Velocity { dx: 2, dy: 0 });
    let only_pos = e.create();
    e.add_component(only_pos, Position { x: 9, y: 0 });

    e.dispatch(MsgAction { entity: both });
    e.dispatch(MsgAction { entity: only_pos });
    // The second target lacks a Velocity, so it is skipped.
    assert_eq!(log.take(), vec!["1,2"]);
}
