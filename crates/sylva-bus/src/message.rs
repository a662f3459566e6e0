//! Message frames and typed payloads.
//!
//! A [`Message`] wraps one payload value together with its routing id, a
//! recursion flag, and a delivery time. Payload types declare their id at
//! compile time; casting a frame back to a payload checks the id, so a
//! frame can never be read as the wrong type.
//!
//! The frame layout is internal and not externally stable.

use std::any::Any;
use std::fmt;
use std::mem;

use sylva_core::{Handle, MessageTypeId};

/// Maximum payload size in bytes.
///
/// The frame budget is 128 bytes with 12 bytes of header; payloads must
/// fit the remainder. The bound is enforced at compile time by the typed
/// message constructors.
pub const MAX_PAYLOAD_BYTES: usize = 116;

/// A message payload.
///
/// Payloads are plain `Copy` data with a compile-time routing id, no
/// larger than [`MAX_PAYLOAD_BYTES`]. Ids must be unique per payload
/// type.
pub trait Payload: Any + Copy {
    /// Routing id of this payload type.
    const MESSAGE_ID: MessageTypeId;
}

/// A payload addressed at a specific entity.
///
/// Required for per-entity delivery: the framework gathers the target's
/// components before invoking a handler, and recursive dispatch walks the
/// target's subtree.
pub trait TargetedPayload: Payload {
    /// The entity this message is addressed to.
    fn target(&self) -> Handle;
}

/// A routed message: type id, recursion flag, delivery time, payload.
pub struct Message {
    id: MessageTypeId,
    recursive: bool,
    time: f32,
    payload: Box<dyn Any>,
}

/// Compile-time payload size check, evaluated per monomorphization.
fn check_payload_size<P: Payload>() {
    const {
        assert!(
            mem::size_of::<P>() <= MAX_PAYLOAD_BYTES,
            "payload size over limit"
        );
    }
}

impl Message {
    /// Wrap `payload` in an immediate, non-recursive message.
    pub fn new<P: Payload>(payload: P) -> Self {
        check_payload_size::<P>();
        Self {
            id: P::MESSAGE_ID,
            recursive: false,
            time: 0.0,
            payload: Box::new(payload),
        }
    }

    /// Wrap `payload` in an immediate message with the recursive flag
    /// set: per-entity handlers deliver it over the target's whole
    /// subtree.
    pub fn recursive<P: Payload>(payload: P) -> Self {
        check_payload_size::<P>();
        Self {
            id: P::MESSAGE_ID,
            recursive: true,
            time: 0.0,
            payload: Box::new(payload),
        }
    }

    /// The routing id.
    pub fn id(&self) -> MessageTypeId {
        self.id
    }

    /// Whether per-entity delivery covers the target's subtree.
    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Scheduled delivery time; zero for immediate messages.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub(crate) fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    /// Read the payload as `P`.
    ///
    /// # Panics
    ///
    /// Panics if `P::MESSAGE_ID` does not match the frame's id.
    pub fn cast<P: Payload>(&self) -> &P {
        assert!(
            P::MESSAGE_ID == self.id,
            "payload cast mismatch: expected message id {}, frame has {}",
            P::MESSAGE_ID,
            self.id
        );
        match self.payload.downcast_ref::<P>() {
            Some(p) => p,
            None => panic!("two payload types share message id {}", self.id),
        }
    }

    /// Read the payload as `P`, or `None` when the id differs.
    pub fn try_cast<P: Payload>(&self) -> Option<&P> {
        if P::MESSAGE_ID == self.id {
            self.payload.downcast_ref::<P>()
        } else {
            None
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("id", &self.id)
            .field("recursive", &self.recursive)
            .field("time", &self.time)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Ping {
        value: u32,
    }

    impl Payload for Ping {
        const MESSAGE_ID: MessageTypeId = MessageTypeId(1);
    }

    #[derive(Clone, Copy, Debug)]
    struct Pong;

    impl Payload for Pong {
        const MESSAGE_ID: MessageTypeId = MessageTypeId(2);
    }

    #[test]
    fn cast_round_trips() {
        let m = Message::new(Ping { value: 42 });
        assert_eq!(m.id(), MessageTypeId(1));
        assert!(!m.is_recursive());
        assert_eq!(m.time(), 0.0);
        assert_eq!(m.cast::<Ping>(), &Ping { value: 42 });
    }

    #[test]
    fn recursive_flag_is_carried() {
        let m = Message::recursive(Ping { value: 0 });
        assert!(m.is_recursive());
    }

    #[test]
    fn try_cast_rejects_other_ids() {
        let m = Message::new(Ping { value: 1 });
        assert!(m.try_cast::<Pong>().is_none());
        assert!(m.try_cast::<Ping>().is_some());
    }

    #[test]
    #[should_panic(expected = "payload cast mismatch")]
    fn cast_to_wrong_id_panics() {
        let m = Message::new(Ping { value: 1 });
        let _ = m.cast::<Pong>();
    }
}
