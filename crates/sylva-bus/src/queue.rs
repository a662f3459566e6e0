//! The combined message queue.
//!
//! [`MessageQueue`] pairs a [`HandlerTable`] with a [`DelayQueue`] into
//! the full bus surface: synchronous dispatch, delayed scheduling, and the
//! two clock-driving operations `update_time` (drain everything due) and
//! `update_step` (deliver exactly the next message).
//!
//! # Ordering
//!
//! - Handlers for one id run in registration order.
//! - `update_time` delivers in non-decreasing time order; everything with
//!   `time <= now` after the advance is delivered before it returns,
//!   including messages enqueued by handlers mid-drain whose time is
//!   already due.

use sylva_core::MessageTypeId;

use crate::delay::DelayQueue;
use crate::handlers::{Handler, HandlerTable};
use crate::message::{Message, Payload};

/// A handler table plus a delayed queue over a caller-supplied context.
pub struct MessageQueue<Ctx> {
    table: HandlerTable<Ctx>,
    clock: DelayQueue,
}

impl<Ctx> Default for MessageQueue<Ctx> {
    fn default() -> Self {
        Self {
            table: HandlerTable::new(),
            clock: DelayQueue::new(),
        }
    }
}

impl<Ctx> MessageQueue<Ctx> {
    /// An empty queue at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler for `id`. One-way; there is no deregistration.
    pub fn register_callback(&mut self, id: MessageTypeId, handler: Handler<Ctx>) {
        self.table.register(id, handler);
    }

    /// Number of handlers registered for `id`.
    pub fn handler_count(&self, id: MessageTypeId) -> usize {
        self.table.handler_count(id)
    }

    /// Construct and synchronously dispatch a non-recursive message.
    pub fn dispatch<P: Payload>(&mut self, ctx: &mut Ctx, payload: P) {
        self.dispatch_message(ctx, &Message::new(payload));
    }

    /// Construct and synchronously dispatch a recursive message.
    pub fn dispatch_recursive<P: Payload>(&mut self, ctx: &mut Ctx, payload: P) {
        self.dispatch_message(ctx, &Message::recursive(payload));
    }

    /// Synchronously dispatch a prepared message.
    pub fn dispatch_message(&mut self, ctx: &mut Ctx, msg: &Message) {
        self.table.dispatch(&mut self.clock, ctx, msg);
    }

    /// Schedule `payload` for delivery at `now + delay`.
    pub fn queue<P: Payload>(&mut self, delay: f32, payload: P) {
        self.clock.queue(delay, payload);
    }

    /// Schedule `payload` with the recursive flag set.
    pub fn queue_recursive<P: Payload>(&mut self, delay: f32, payload: P) {
        self.clock.queue_recursive(delay, payload);
    }

    /// Schedule a prepared message at its own delivery time.
    pub fn push(&mut self, msg: Message) {
        self.clock.push(msg);
    }

    /// Advance the clock by `dt` and deliver every due message.
    ///
    /// Returns immediately when `dt == 0`: the clock does not advance and
    /// nothing is delivered.
    pub fn update_time(&mut self, ctx: &mut Ctx, dt: f32) {
        if dt == 0.0 {
            return;
        }
        self.clock.advance(dt);
        while let Some(msg) = self.clock.pop_due() {
            self.table.dispatch(&mut self.clock, ctx, &msg);
        }
    }

    /// Deliver exactly the earliest pending message, snapping the clock
    /// to its time. A no-op when the queue is empty. Returns the clock.
    pub fn update_step(&mut self, ctx: &mut Ctx) -> f32 {
        if let Some(msg) = self.clock.pop_next() {
            self.table.dispatch(&mut self.clock, ctx, &msg);
        }
        self.clock.now()
    }

    /// Empty the pending queue and zero the clock. Handlers stay
    /// registered.
    pub fn reset_events(&mut self) {
        self.clock.reset();
    }

    /// The current virtual time.
    pub fn now(&self) -> f32 {
        self.clock.now()
    }

    /// Whether any messages are pending.
    pub fn events_pending(&self) -> bool {
        self.clock.pending() > 0
    }

    /// Number of pending messages.
    pub fn pending(&self) -> usize {
        self.clock.pending()
    }

    /// The earliest pending message, without removing it.
    pub fn next_event(&self) -> Option<&Message> {
        self.clock.peek()
    }
}
