//! The ECS aggregate.
//!
//! [`Ecs`] wires the pieces together: the world (forest + component
//! registry), the message handler table and its delayed queue, the
//! per-frame update callbacks, and the LIFO cleanup list that makes
//! teardown deterministic.
//!
//! # Update order
//!
//! One [`update`](Ecs::update) call runs three phases, strictly in order:
//!
//! 1. advance the queue clock by `dt` and deliver every due message
//!    (skipped entirely when `dt == 0`);
//! 2. invoke registered update callbacks in registration order;
//! 3. process and empty the deferred-remove list.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use indexmap::IndexMap;
use sylva_bus::{DelayQueue, HandlerTable, Message, Payload};
use sylva_core::{Handle, HasOwner};
use sylva_storage::{Column, FlatIndexTable, HashedIndexTable, IndexTable};

use crate::context::Context;
use crate::interface::{ErasedInterface, Interface};
use crate::iter::{Children, RecursiveComponents};
use crate::registry::IndexKind;
use crate::system::SystemBuilder;
use crate::world::World;

pub(crate) type UpdateFn = Box<dyn FnMut(&mut DelayQueue, &mut World, f32)>;

/// The entity-component-system runtime.
pub struct Ecs {
    pub(crate) world: World,
    pub(crate) handlers: HandlerTable<World>,
    pub(crate) clock: DelayQueue,
    pub(crate) updates: Vec<UpdateFn>,
    pub(crate) systems: IndexMap<String, Rc<dyn Any>>,
    pub(crate) cleanup: Vec<Box<dyn FnOnce()>>,
}

impl Default for Ecs {
    fn default() -> Self {
        Self {
            world: World::new(),
            handlers: HandlerTable::new(),
            clock: DelayQueue::new(),
            updates: Vec::new(),
            systems: IndexMap::new(),
            cleanup: Vec::new(),
        }
    }
}

impl Ecs {
    /// An empty runtime: no components, no systems, clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // ── registration ─────────────────────────────────────────────

    /// Register component type `C` under a stable name, owners tracked in
    /// a sidecar.
    ///
    /// # Panics
    ///
    /// Panics if the type or the name is already registered.
    pub fn register_component<C: 'static>(&mut self, name: &str, kind: IndexKind) {
        self.install_interface::<C>(name, false, Column::with_sidecar(), kind);
    }

    /// Register relational component type `C`: storage rows keep forest
    /// order (parents before children), and the component carries its
    /// owner itself.
    ///
    /// # Panics
    ///
    /// Panics if the type or the name is already registered.
    pub fn register_relational<C: HasOwner + 'static>(&mut self, name: &str, kind: IndexKind) {
        self.install_interface::<C>(name, true, Column::with_intrinsic(<C as HasOwner>::owner), kind);
    }

    fn install_interface<C: 'static>(
        &mut self,
        name: &str,
        relational: bool,
        column: Column<C>,
        kind: IndexKind,
    ) {
        let index: Box<dyn IndexTable> = match kind {
            IndexKind::Flat => Box::new(FlatIndexTable::new()),
            IndexKind::Hashed => Box::new(HashedIndexTable::new()),
        };
        let iface = Rc::new(Interface::new(relational, column, index));
        self.world.registry.insert::<C>(name, iface.clone());
        self.cleanup.push(Box::new(move || iface.teardown()));
    }

    /// Register a system value under a name and return the capability
    /// builder that wires its callbacks.
    ///
    /// # Panics
    ///
    /// Panics if the name is already registered.
    pub fn register_system<S: 'static>(&mut self, name: &str, system: S) -> SystemBuilder<'_, S> {
        assert!(
            !self.systems.contains_key(name),
            "system `{name}` registered twice"
        );
        let sys = Rc::new(RefCell::new(system));
        self.systems.insert(name.to_string(), sys.clone() as Rc<dyn Any>);
        SystemBuilder {
            ecs: self,
            system: sys,
        }
    }

    /// Look a registered system up by name.
    pub fn system<S: 'static>(&self, name: &str) -> Option<Rc<RefCell<S>>> {
        let rc = self.systems.get(name)?.clone();
        rc.downcast::<RefCell<S>>().ok()
    }

    /// Register a raw message handler for `id`, outside any system.
    ///
    /// The builder methods on [`SystemBuilder`] are the usual way in;
    /// this is the low-level hook they are built on.
    pub fn register_callback(&mut self, id: sylva_core::MessageTypeId, handler: sylva_bus::Handler<World>) {
        self.handlers.register(id, handler);
    }

    /// Register a bare per-frame callback, outside any system.
    pub fn register_update(&mut self, mut callback: impl FnMut(&mut Context<'_>, f32) + 'static) {
        self.updates.push(Box::new(move |clock, world, dt| {
            let mut ctx = Context::new(clock, world);
            callback(&mut ctx, dt);
        }));
    }

    /// Names of the registered component types, in registration order.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.world.registry.names()
    }

    /// Whether a component name is taken.
    pub fn has_component_name(&self, name: &str) -> bool {
        self.world.registry.contains_name(name)
    }

    // ── world access ─────────────────────────────────────────────

    /// Shared view of the world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable view of the world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    // ── entity lifecycle (delegated) ─────────────────────────────

    /// Allocate a fresh entity. See [`World::create`].
    pub fn create(&mut self) -> Handle {
        self.world.create()
    }

    /// Whether `h` refers to a live entity.
    pub fn is_valid(&self, h: Handle) -> bool {
        self.world.is_valid(h)
    }

    /// Attach `child` under `parent`. See [`World::attach`].
    pub fn attach(&mut self, parent: Handle, child: Handle) -> bool {
        self.world.attach(parent, child)
    }

    /// Detach `h` from its parent. See [`World::detach`].
    pub fn detach(&mut self, h: Handle) {
        self.world.detach(h);
    }

    /// Queue `h` for removal at the end of the next update.
    pub fn mark_remove(&mut self, h: Handle) {
        self.world.mark_remove(h);
    }

    /// Depth-first destroy `h` and its subtree. See [`World::remove`].
    pub fn remove(&mut self, h: Handle) {
        self.world.remove(h);
    }

    // ── component access (delegated) ─────────────────────────────

    /// Add a `C` row for `h`. See [`World::add_component`].
    pub fn add_component<C: 'static>(&mut self, h: Handle, value: C) -> RefMut<'_, C> {
        self.world.add_component(h, value)
    }

    /// Whether `h` carries a `C`.
    pub fn has_component<C: 'static>(&self, h: Handle) -> bool {
        self.world.has_component::<C>(h)
    }

    /// Shared guard to `h`'s `C`. See [`World::get`].
    pub fn get<C: 'static>(&self, h: Handle) -> Option<Ref<'_, C>> {
        self.world.get(h)
    }

    /// Mutable guard to `h`'s `C`. See [`World::get_mut`].
    pub fn get_mut<C: 'static>(&self, h: Handle) -> Option<RefMut<'_, C>> {
        self.world.get_mut(h)
    }

    /// Overwrite or add `h`'s `C`. See [`World::update_or_create`].
    pub fn update_or_create<C: 'static>(&mut self, h: Handle, value: C) -> RefMut<'_, C> {
        self.world.update_or_create(h, value)
    }

    /// Get or default-construct `h`'s `C`. See [`World::get_or_create`].
    pub fn get_or_create<C: 'static + Default>(&mut self, h: Handle) -> RefMut<'_, C> {
        self.world.get_or_create(h)
    }

    /// Destroy `h`'s `C` row. See [`World::remove_component`].
    pub fn remove_component<C: 'static>(&mut self, h: Handle) {
        self.world.remove_component::<C>(h);
    }

    /// Destroy every `C` row matching `pred`.
    pub fn remove_component_if<C: 'static>(&mut self, pred: impl FnMut(&C) -> bool) {
        self.world.remove_component_if(pred);
    }

    /// The storage row of `h`'s `C`. See [`World::component_row`].
    pub fn component_row<C: 'static>(&self, h: Handle) -> Option<usize> {
        self.world.component_row::<C>(h)
    }

    /// Number of live `C` rows. See [`World::component_count`].
    pub fn component_count<C: 'static>(&self) -> usize {
        self.world.component_count::<C>()
    }

    /// Visit every `C` row. See [`World::for_each`].
    pub fn for_each<C: 'static>(&self, f: impl FnMut(&C)) {
        self.world.for_each(f);
    }

    /// Visit every `C` row mutably. See [`World::for_each_mut`].
    pub fn for_each_mut<C: 'static>(&self, f: impl FnMut(&mut C)) {
        self.world.for_each_mut(f);
    }

    // ── traversal (delegated) ────────────────────────────────────

    /// The parent of `h`, or NULL.
    pub fn parent(&self, h: Handle) -> Handle {
        self.world.parent(h)
    }

    /// The first child of `h`, or NULL.
    pub fn first_child(&self, h: Handle) -> Handle {
        self.world.first_child(h)
    }

    /// The next sibling of `h`, or NULL.
    pub fn next_sibling(&self, h: Handle) -> Handle {
        self.world.next_sibling(h)
    }

    /// Pre-order successor bounded by `root`. See [`World::next_handle`].
    pub fn next_handle(&self, current: Handle, root: Handle) -> Handle {
        self.world.next_handle(current, root)
    }

    /// Iterate over the direct children of `h`.
    pub fn children(&self, h: Handle) -> Children<'_> {
        self.world.children(h)
    }

    /// Iterate over the `C` of every descendant of `root`, pre-order.
    pub fn recursive_components<C: 'static>(&self, root: Handle) -> RecursiveComponents<'_, C> {
        self.world.recursive_components(root)
    }

    /// Call `f` on `h` and every descendant, pre-order.
    pub fn recursive_call(&self, h: Handle, f: impl FnMut(Handle)) {
        self.world.recursive_call(h, f);
    }

    /// Call `f` on the `C` of `h`'s subtree, pre-order.
    pub fn recursive_component_call<C: 'static>(&self, h: Handle, f: impl FnMut(&mut C)) {
        self.world.recursive_component_call(h, f);
    }

    // ── messages ─────────────────────────────────────────────────

    /// Construct and synchronously dispatch a non-recursive message.
    pub fn dispatch<P: Payload>(&mut self, payload: P) {
        let msg = Message::new(payload);
        self.dispatch_message(&msg);
    }

    /// Construct and synchronously dispatch a recursive message.
    pub fn dispatch_recursive<P: Payload>(&mut self, payload: P) {
        let msg = Message::recursive(payload);
        self.dispatch_message(&msg);
    }

    /// Synchronously dispatch a prepared message.
    pub fn dispatch_message(&mut self, msg: &Message) {
        self.handlers.dispatch(&mut self.clock, &mut self.world, msg);
    }

    /// Schedule `payload` for delivery at `now + delay`.
    pub fn queue<P: Payload>(&mut self, delay: f32, payload: P) {
        self.clock.queue(delay, payload);
    }

    /// Schedule `payload` with the recursive flag set.
    pub fn queue_recursive<P: Payload>(&mut self, delay: f32, payload: P) {
        self.clock.queue_recursive(delay, payload);
    }

    /// The current virtual time.
    pub fn now(&self) -> f32 {
        self.clock.now()
    }

    /// Whether any messages are pending.
    pub fn events_pending(&self) -> bool {
        self.clock.pending() > 0
    }

    // ── the update loop ──────────────────────────────────────────

    /// Run one frame: drain due messages, run update callbacks, finalize
    /// deferred removals.
    pub fn update(&mut self, dt: f32) {
        self.update_time(dt);
        for callback in &mut self.updates {
            callback(&mut self.clock, &mut self.world, dt);
        }
        self.world.finalize_removals();
    }

    /// Advance the queue clock by `dt`, delivering every due message.
    /// Returns immediately when `dt == 0`.
    pub fn update_time(&mut self, dt: f32) {
        if dt == 0.0 {
            return;
        }
        self.clock.advance(dt);
        while let Some(msg) = self.clock.pop_due() {
            self.handlers.dispatch(&mut self.clock, &mut self.world, &msg);
        }
    }

    /// Deliver exactly the earliest pending message, snapping the clock
    /// to its time. Returns the clock.
    pub fn update_step(&mut self) -> f32 {
        if let Some(msg) = self.clock.pop_next() {
            self.handlers.dispatch(&mut self.clock, &mut self.world, &msg);
        }
        self.clock.now()
    }

    /// Destroy every entity and component row (on-destroy callbacks
    /// fire), empty the pending queue, and zero the clock. Registrations
    /// survive.
    pub fn clear(&mut self) {
        self.clock.reset();
        self.world.clear_entities();
    }
}

impl Drop for Ecs {
    fn drop(&mut self) {
        // Teardown order is load-bearing: systems (handler, update and
        // lifecycle closures) die before component storages, which die
        // before the handle forest.
        self.handlers.clear();
        self.updates.clear();
        self.systems.clear();
        for action in self.cleanup.drain(..).rev() {
            action();
        }
    }
}
