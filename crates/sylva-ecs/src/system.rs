//! System registration.
//!
//! A system is a client-defined value whose methods become message
//! handlers, per-frame callbacks, and component lifecycle callbacks.
//! Capability discovery is explicit: after
//! [`Ecs::register_system`](crate::Ecs::register_system), each
//! [`SystemBuilder`] method wires exactly one capability. Only what is
//! wired runs.
//!
//! Component interfaces are resolved once, at wiring time, and cached
//! inside the registered closures.
//!
//! # Delivery rules
//!
//! Per-entity handlers (`on_entity*`) require a [`TargetedPayload`]. At
//! delivery the target's components are gathered; if any is missing the
//! handler is skipped for that entity. A message whose recursive flag is
//! set delivers over the target's subtree in pre-order, target first.
//! Messages whose target has died are dropped silently.
//!
//! Requesting the same component type twice in one capability panics at
//! delivery (the column is already borrowed).

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;
use sylva_bus::{Payload, TargetedPayload};
use sylva_core::Handle;

use crate::context::Context;
use crate::ecs::Ecs;
use crate::world::World;

/// Wires capabilities of one registered system.
///
/// Returned by [`Ecs::register_system`]; each method registers one
/// callback and hands the builder back for chaining.
pub struct SystemBuilder<'e, S> {
    pub(crate) ecs: &'e mut Ecs,
    pub(crate) system: Rc<RefCell<S>>,
}

/// The entities a message delivers to, in delivery order.
fn delivery_targets(world: &World, target: Handle, recursive: bool) -> SmallVec<[Handle; 8]> {
    let mut targets = SmallVec::new();
    if !world.is_valid(target) {
        return targets;
    }
    if recursive {
        world.recursive_call(target, |h| targets.push(h));
    } else {
        targets.push(target);
    }
    targets
}

impl<S: 'static> SystemBuilder<'_, S> {
    /// Shared handle to the system value.
    pub fn system(&self) -> Rc<RefCell<S>> {
        Rc::clone(&self.system)
    }

    /// Finish wiring, returning the system handle.
    pub fn finish(self) -> Rc<RefCell<S>> {
        self.system
    }

    // ── message handlers ─────────────────────────────────────────

    /// Plain message handler: `f(system, payload)`.
    pub fn on<P: Payload>(self, mut f: impl FnMut(&mut S, &P) + 'static) -> Self {
        let sys = Rc::clone(&self.system);
        self.ecs.handlers.register(
            P::MESSAGE_ID,
            Box::new(move |_clock, _world, msg| {
                f(&mut sys.borrow_mut(), msg.cast::<P>());
            }),
        );
        self
    }

    /// ECS-aware message handler: `f(system, payload, ctx)`.
    pub fn on_ecs<P: Payload>(self, mut f: impl FnMut(&mut S, &P, &mut Context<'_>) + 'static) -> Self {
        let sys = Rc::clone(&self.system);
        self.ecs.handlers.register(
            P::MESSAGE_ID,
            Box::new(move |clock, world, msg| {
                let mut ctx = Context::new(clock, world);
                f(&mut sys.borrow_mut(), msg.cast::<P>(), &mut ctx);
            }),
        );
        self
    }

    /// Per-entity handler over one component.
    pub fn on_entity<P, C1>(self, mut f: impl FnMut(&mut S, &P, &mut C1) + 'static) -> Self
    where
        P: TargetedPayload,
        C1: 'static,
    {
        let sys = Rc::clone(&self.system);
        let i1 = self.ecs.world.registry.typed_rc::<C1>();
        self.ecs.handlers.register(
            P::MESSAGE_ID,
            Box::new(move |_clock, world, msg| {
                let m = msg.cast::<P>();
                for h in delivery_targets(world, m.target(), msg.is_recursive()) {
                    let Some(r1) = i1.row_of(h) else { continue };
                    let mut c1 = i1.column.borrow_mut();
                    f(&mut sys.borrow_mut(), m, &mut c1[r1]);
                }
            }),
        );
        self
    }

    /// Per-entity handler over two components.
    pub fn on_entity2<P, C1, C2>(
        self,
        mut f: impl FnMut(&mut S, &P, &mut C1, &mut C2) + 'static,
    ) -> Self
    where
        P: TargetedPayload,
        C1: 'static,
        C2: 'static,
    {
        let sys = Rc::clone(&self.system);
        let i1 = self.ecs.world.registry.typed_rc::<C1>();
        let i2 = self.ecs.world.registry.typed_rc::<C2>();
        self.ecs.handlers.register(
            P::MESSAGE_ID,
            Box::new(move |_clock, world, msg| {
                let m = msg.cast::<P>();
                for h in delivery_targets(world, m.target(), msg.is_recursive()) {
                    let (Some(r1), Some(r2)) = (i1.row_of(h), i2.row_of(h)) else {
                        continue;
                    };
                    let mut c1 = i1.column.borrow_mut();
                    let mut c2 = i2.column.borrow_mut();
                    f(&mut sys.borrow_mut(), m, &mut c1[r1], &mut c2[r2]);
                }
            }),
        );
        self
    }

    /// Per-entity handler over three components.
    pub fn on_entity3<P, C1, C2, C3>(
        self,
        mut f: impl FnMut(&mut S, &P, &mut C1, &mut C2, &mut C3) + 'static,
    ) -> Self
    where
        P: TargetedPayload,
        C1: 'static,
        C2: 'static,
        C3: 'static,
    {
        let sys = Rc::clone(&self.system);
        let i1 = self.ecs.world.registry.typed_rc::<C1>();
        let i2 = self.ecs.world.registry.typed_rc::<C2>();
        let i3 = self.ecs.world.registry.typed_rc::<C3>();
        self.ecs.handlers.register(
            P::MESSAGE_ID,
            Box::new(move |_clock, world, msg| {
                let m = msg.cast::<P>();
                for h in delivery_targets(world, m.target(), msg.is_recursive()) {
                    let (Some(r1), Some(r2), Some(r3)) =
                        (i1.row_of(h), i2.row_of(h), i3.row_of(h))
                    else {
                        continue;
                    };
                    let mut c1 = i1.column.borrow_mut();
                    let mut c2 = i2.column.borrow_mut();
                    let mut c3 = i3.column.borrow_mut();
                    f(&mut sys.borrow_mut(), m, &mut c1[r1], &mut c2[r2], &mut c3[r3]);
                }
            }),
        );
        self
    }

    /// ECS-aware per-entity handler over one component.
    pub fn on_entity_ecs<P, C1>(
        self,
        mut f: impl FnMut(&mut S, &P, &mut Context<'_>, &mut C1) + 'static,
    ) -> Self
    where
        P: TargetedPayload,
        C1: 'static,
    {
        let sys = Rc::clone(&self.system);
        let i1 = self.ecs.world.registry.typed_rc::<C1>();
        self.ecs.handlers.register(
            P::MESSAGE_ID,
            Box::new(move |clock, world, msg| {
                let m = msg.cast::<P>();
                for h in delivery_targets(world, m.target(), msg.is_recursive()) {
                    if !world.is_valid(h) {
                        continue;
                    }
                    let Some(r1) = i1.row_of(h) else { continue };
                    let mut c1 = i1.column.borrow_mut();
                    let mut ctx = Context::new(clock, world);
                    f(&mut sys.borrow_mut(), m, &mut ctx, &mut c1[r1]);
                }
            }),
        );
        self
    }

    /// ECS-aware per-entity handler over two components.
    pub fn on_entity_ecs2<P, C1, C2>(
        self,
        mut f: impl FnMut(&mut S, &P, &mut Context<'_>, &mut C1, &mut C2) + 'static,
    ) -> Self
    where
        P: TargetedPayload,
        C1: 'static,
        C2: 'static,
    {
        let sys = Rc::clone(&self.system);
        let i1 = self.ecs.world.registry.typed_rc::<C1>();
        let i2 = self.ecs.world.registry.typed_rc::<C2>();
        self.ecs.handlers.register(
            P::MESSAGE_ID,
            Box::new(move |clock, world, msg| {
                let m = msg.cast::<P>();
                for h in delivery_targets(world, m.target(), msg.is_recursive()) {
                    if !world.is_valid(h) {
                        continue;
                    }
                    let (Some(r1), Some(r2)) = (i1.row_of(h), i2.row_of(h)) else {
                        continue;
                    };
                    let mut c1 = i1.column.borrow_mut();
                    let mut c2 = i2.column.borrow_mut();
                    let mut ctx = Context::new(clock, world);
                    f(&mut sys.borrow_mut(), m, &mut ctx, &mut c1[r1], &mut c2[r2]);
                }
            }),
        );
        self
    }

    // ── per-frame callbacks ──────────────────────────────────────

    /// Plain per-frame callback: `f(system, ctx, dt)`.
    pub fn update_ecs(self, mut f: impl FnMut(&mut S, &mut Context<'_>, f32) + 'static) -> Self {
        let sys = Rc::clone(&self.system);
        self.ecs.updates.push(Box::new(move |clock, world, dt| {
            let mut ctx = Context::new(clock, world);
            f(&mut sys.borrow_mut(), &mut ctx, dt);
        }));
        self
    }

    /// Per-frame iteration over the `C1` column: `f(system, c1, dt)` per
    /// row.
    pub fn update_each<C1: 'static>(self, mut f: impl FnMut(&mut S, &mut C1, f32) + 'static) -> Self {
        let sys = Rc::clone(&self.system);
        let i1 = self.ecs.world.registry.typed_rc::<C1>();
        self.ecs.updates.push(Box::new(move |_clock, _world, dt| {
            let mut row = 0;
            loop {
                let mut col = i1.column.borrow_mut();
                if row >= col.len() {
                    break;
                }
                f(&mut sys.borrow_mut(), &mut col[row], dt);
                drop(col);
                row += 1;
            }
        }));
        self
    }

    /// Per-frame iteration over `C1`, gathering the owner's `C2`; rows
    /// whose owner lacks a `C2` are skipped.
    pub fn update_each2<C1, C2>(
        self,
        mut f: impl FnMut(&mut S, &mut C1, &mut C2, f32) + 'static,
    ) -> Self
    where
        C1: 'static,
        C2: 'static,
    {
        let sys = Rc::clone(&self.system);
        let i1 = self.ecs.world.registry.typed_rc::<C1>();
        let i2 = self.ecs.world.registry.typed_rc::<C2>();
        self.ecs.updates.push(Box::new(move |_clock, world, dt| {
            let mut row = 0;
            loop {
                let owner = {
                    let col = i1.column.borrow();
                    if row >= col.len() {
                        break;
                    }
                    world.handle_at(col.owner_slot(row))
                };
                if let Some(r2) = i2.row_of(owner) {
                    let mut c1 = i1.column.borrow_mut();
                    let mut c2 = i2.column.borrow_mut();
                    f(&mut sys.borrow_mut(), &mut c1[row], &mut c2[r2], dt);
                }
                row += 1;
            }
        }));
        self
    }

    /// Per-frame iteration over `C1`, gathering the owner's `C2` and
    /// `C3`.
    pub fn update_each3<C1, C2, C3>(
        self,
        mut f: impl FnMut(&mut S, &mut C1, &mut C2, &mut C3, f32) + 'static,
    ) -> Self
    where
        C1: 'static,
        C2: 'static,
        C3: 'static,
    {
        let sys = Rc::clone(&self.system);
        let i1 = self.ecs.world.registry.typed_rc::<C1>();
        let i2 = self.ecs.world.registry.typed_rc::<C2>();
        let i3 = self.ecs.world.registry.typed_rc::<C3>();
        self.ecs.updates.push(Box::new(move |_clock, world, dt| {
            let mut row = 0;
            loop {
                let owner = {
                    let col = i1.column.borrow();
                    if row >= col.len() {
                        break;
                    }
                    world.handle_at(col.owner_slot(row))
                };
                if let (Some(r2), Some(r3)) = (i2.row_of(owner), i3.row_of(owner)) {
                    let mut c1 = i1.column.borrow_mut();
                    let mut c2 = i2.column.borrow_mut();
                    let mut c3 = i3.column.borrow_mut();
                    f(
                        &mut sys.borrow_mut(),
                        &mut c1[row],
                        &mut c2[r2],
                        &mut c3[r3],
                        dt,
                    );
                }
                row += 1;
            }
        }));
        self
    }

    /// ECS-aware per-frame iteration over `C1`.
    ///
    /// The `C1` column stays borrowed while `f` runs; reaching back into
    /// it through the context panics. Use [`Context::world`] and
    /// `mark_remove` for structural changes.
    pub fn update_each_ecs<C1: 'static>(
        self,
        mut f: impl FnMut(&mut S, &mut Context<'_>, &mut C1, f32) + 'static,
    ) -> Self {
        let sys = Rc::clone(&self.system);
        let i1 = self.ecs.world.registry.typed_rc::<C1>();
        self.ecs.updates.push(Box::new(move |clock, world, dt| {
            let mut row = 0;
            loop {
                let mut col = i1.column.borrow_mut();
                if row >= col.len() {
                    break;
                }
                let mut ctx = Context::new(clock, world);
                f(&mut sys.borrow_mut(), &mut ctx, &mut col[row], dt);
                drop(col);
                row += 1;
            }
        }));
        self
    }

    /// ECS-aware per-frame iteration over `C1`, gathering the owner's
    /// `C2`.
    pub fn update_each_ecs2<C1, C2>(
        self,
        mut f: impl FnMut(&mut S, &mut Context<'_>, &mut C1, &mut C2, f32) + 'static,
    ) -> Self
    where
        C1: 'static,
        C2: 'static,
    {
        let sys = Rc::clone(&self.system);
        let i1 = self.ecs.world.registry.typed_rc::<C1>();
        let i2 = self.ecs.world.registry.typed_rc::<C2>();
        self.ecs.updates.push(Box::new(move |clock, world, dt| {
            let mut row = 0;
            loop {
                let owner = {
                    let col = i1.column.borrow();
                    if row >= col.len() {
                        break;
                    }
                    world.handle_at(col.owner_slot(row))
                };
                if let Some(r2) = i2.row_of(owner) {
                    let mut c1 = i1.column.borrow_mut();
                    let mut c2 = i2.column.borrow_mut();
                    let mut ctx = Context::new(clock, world);
                    f(
                        &mut sys.borrow_mut(),
                        &mut ctx,
                        &mut c1[row],
                        &mut c2[r2],
                        dt,
                    );
                }
                row += 1;
            }
        }));
        self
    }

    // ── lifecycle callbacks ──────────────────────────────────────

    /// Invoke `f(system, handle, component)` after a `C` row is added.
    ///
    /// # Panics
    ///
    /// Panics if `C` is not registered.
    pub fn on_create<C: 'static>(self, mut f: impl FnMut(&mut S, Handle, &mut C) + 'static) -> Self {
        let sys = Rc::clone(&self.system);
        let iface = self.ecs.world.registry.typed_rc::<C>();
        iface
            .on_create
            .borrow_mut()
            .push(Box::new(move |h, c| f(&mut sys.borrow_mut(), h, c)));
        self
    }

    /// Invoke `f(system, component)` before a `C` row is destroyed.
    ///
    /// # Panics
    ///
    /// Panics if `C` is not registered.
    pub fn on_destroy<C: 'static>(self, mut f: impl FnMut(&mut S, &mut C) + 'static) -> Self {
        let sys = Rc::clone(&self.system);
        let iface = self.ecs.world.registry.typed_rc::<C>();
        iface
            .on_destroy
            .borrow_mut()
            .push(Box::new(move |c| f(&mut sys.borrow_mut(), c)));
        self
    }
}
