//! The ECS-aware callback context.
//!
//! Handlers and update callbacks registered through the ECS-aware builder
//! methods receive a [`Context`]: the world plus the delayed message
//! queue. Follow-up messages scheduled here with a due time are delivered
//! within the same drain.

use sylva_bus::{DelayQueue, Message, Payload};

use crate::world::World;

/// World access plus message scheduling, for ECS-aware callbacks.
pub struct Context<'a> {
    /// Entity and component state.
    pub world: &'a mut World,
    queue: &'a mut DelayQueue,
}

impl<'a> Context<'a> {
    pub(crate) fn new(queue: &'a mut DelayQueue, world: &'a mut World) -> Self {
        Self { world, queue }
    }

    /// Schedule `payload` for delivery at `now + delay`.
    pub fn queue<P: Payload>(&mut self, delay: f32, payload: P) {
        self.queue.queue(delay, payload);
    }

    /// Schedule `payload` with the recursive flag set.
    pub fn queue_recursive<P: Payload>(&mut self, delay: f32, payload: P) {
        self.queue.queue_recursive(delay, payload);
    }

    /// Schedule a prepared message at its own delivery time.
    pub fn push(&mut self, msg: Message) {
        self.queue.push(msg);
    }

    /// The current virtual time.
    pub fn now(&self) -> f32 {
        self.queue.now()
    }
}
