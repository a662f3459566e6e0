//! Per-message-type handler lists.
//!
//! [`HandlerTable`] maps message ids to lists of boxed handlers invoked in
//! registration order. Registration is one-way: there is no deregistration
//! short of clearing the whole table.
//!
//! Handlers receive the [`DelayQueue`] so they can schedule follow-up
//! messages mid-dispatch; messages queued with a due time are delivered in
//! the same drain.

use indexmap::IndexMap;
use sylva_core::MessageTypeId;

use crate::delay::DelayQueue;
use crate::message::Message;

/// A boxed message handler over a caller-supplied context type.
pub type Handler<Ctx> = Box<dyn FnMut(&mut DelayQueue, &mut Ctx, &Message)>;

/// Registration-ordered handler lists keyed by message id.
pub struct HandlerTable<Ctx> {
    handlers: IndexMap<MessageTypeId, Vec<Handler<Ctx>>>,
}

impl<Ctx> Default for HandlerTable<Ctx> {
    fn default() -> Self {
        Self {
            handlers: IndexMap::new(),
        }
    }
}

impl<Ctx> HandlerTable<Ctx> {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the list for `id`.
    pub fn register(&mut self, id: MessageTypeId, handler: Handler<Ctx>) {
        self.handlers.entry(id).or_default().push(handler);
    }

    /// Invoke every handler registered for the message's id, in
    /// registration order. Unknown ids dispatch to nobody.
    pub fn dispatch(&mut self, clock: &mut DelayQueue, ctx: &mut Ctx, msg: &Message) {
        if let Some(list) = self.handlers.get_mut(&msg.id()) {
            for handler in list {
                handler(clock, ctx, msg);
            }
        }
    }

    /// Number of handlers registered for `id`.
    pub fn handler_count(&self, id: MessageTypeId) -> usize {
        self.handlers.get(&id).map_or(0, Vec::len)
    }

    /// Drop every handler.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Payload;

    #[derive(Clone, Copy, Debug)]
    struct Ping;

    impl Payload for Ping {
        const MESSAGE_ID: MessageTypeId = MessageTypeId(1);
    }

    #[derive(Clone, Copy, Debug)]
    struct Pong;

    impl Payload for Pong {
        const MESSAGE_ID: MessageTypeId = MessageTypeId(2);
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let mut table: HandlerTable<Vec<&'static str>> = HandlerTable::new();
        table.register(Ping::MESSAGE_ID, Box::new(|_, log, _| log.push("first")));
        table.register(Ping::MESSAGE_ID, Box::new(|_, log, _| log.push("second")));

        let mut clock = DelayQueue::new();
        let mut log = Vec::new();
        table.dispatch(&mut clock, &mut log, &Message::new(Ping));
        assert_eq!(log, vec!["first", "second"]);
    }

    #[test]
    fn dispatch_routes_by_id() {
        let mut table: HandlerTable<u32> = HandlerTable::new();
        table.register(Ping::MESSAGE_ID, Box::new(|_, n, _| *n += 1));
        table.register(Pong::MESSAGE_ID, Box::new(|_, n, _| *n += 100));

        let mut clock = DelayQueue::new();
        let mut count = 0;
        table.dispatch(&mut clock, &mut count, &Message::new(Pong));
        assert_eq!(count, 100);
        assert_eq!(table.handler_count(Ping::MESSAGE_ID), 1);
        assert_eq!(table.handler_count(MessageTypeId(9)), 0);
    }

    #[test]
    fn unknown_id_dispatches_to_nobody() {
        let mut table: HandlerTable<u32> = HandlerTable::new();
        let mut clock = DelayQueue::new();
        let mut count = 0;
        table.dispatch(&mut clock, &mut count, &Message::new(Ping));
        assert_eq!(count, 0);
    }

    #[test]
    fn handlers_can_enqueue_followups() {
        let mut table: HandlerTable<u32> = HandlerTable::new();
        table.register(
            Ping::MESSAGE_ID,
            Box::new(|clock, _, _| clock.queue(0.5, Pong)),
        );

        let mut clock = DelayQueue::new();
        let mut ctx = 0;
        table.dispatch(&mut clock, &mut ctx, &Message::new(Ping));
        assert_eq!(clock.pending(), 1);
        assert_eq!(clock.peek_time(), Some(0.5));
    }
}
