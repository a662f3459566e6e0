//! The delayed message queue.
//!
//! [`DelayQueue`] owns the virtual clock and a priority queue of pending
//! messages ordered by delivery time. Ties are broken by enqueue order
//! through a monotonic sequence number, so draining is deterministic even
//! when several messages land on the same instant.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::message::{Message, Payload};

struct Scheduled {
    time: f32,
    seq: u64,
    msg: Message,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse both keys so the earliest
        // time, then the earliest enqueue, surfaces first.
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Virtual clock plus a min-heap of scheduled messages.
#[derive(Default)]
pub struct DelayQueue {
    heap: BinaryHeap<Scheduled>,
    now: f32,
    seq: u64,
}

impl DelayQueue {
    /// An empty queue at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current virtual time.
    pub fn now(&self) -> f32 {
        self.now
    }

    /// Schedule `payload` for delivery at `now + delay`.
    pub fn queue<P: Payload>(&mut self, delay: f32, payload: P) {
        let time = self.now + delay;
        self.push_at(Message::new(payload), time);
    }

    /// Schedule `payload` with the recursive flag set.
    pub fn queue_recursive<P: Payload>(&mut self, delay: f32, payload: P) {
        let time = self.now + delay;
        self.push_at(Message::recursive(payload), time);
    }

    /// Schedule a prepared message at its own delivery time.
    pub fn push(&mut self, msg: Message) {
        let time = msg.time();
        self.push_at(msg, time);
    }

    /// Advance the clock by `dt` without delivering anything.
    pub fn advance(&mut self, dt: f32) {
        self.now += dt;
    }

    /// Pop the earliest message whose time is due (`time <= now`).
    pub fn pop_due(&mut self) -> Option<Message> {
        let due = matches!(self.heap.peek(), Some(s) if s.time <= self.now);
        if due {
            self.heap.pop().map(|s| s.msg)
        } else {
            None
        }
    }

    /// Pop the earliest message unconditionally, snapping the clock to
    /// its delivery time. `None` when empty.
    pub fn pop_next(&mut self) -> Option<Message> {
        let s = self.heap.pop()?;
        self.now = s.time;
        Some(s.msg)
    }

    /// Number of pending messages.
    pub fn pending(&self) -> usize {
        self.heap.len()
    }

    /// The delivery time of the earliest pending message.
    pub fn peek_time(&self) -> Option<f32> {
        self.heap.peek().map(|s| s.time)
    }

    /// The earliest pending message, without removing it.
    pub fn peek(&self) -> Option<&Message> {
        self.heap.peek().map(|s| &s.msg)
    }

    /// Empty the queue and zero the clock.
    pub fn reset(&mut self) {
        self.heap.clear();
        self.now = 0.0;
        self.seq = 0;
    }

    fn push_at(&mut self, mut msg: Message, time: f32) {
        msg.set_time(time);
        self.heap.push(Scheduled {
            time,
            seq: self.seq,
            msg,
        });
        self.seq += 1;
    }
}
