//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a message type on the bus.
///
/// Payload types declare a compile-time constant of this type; the bus
/// routes each message to the handler list registered for its id. Ids are
/// chosen by the application (typically from an enum of message kinds) and
/// must be unique per payload type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageTypeId(pub u32);

impl fmt::Display for MessageTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for MessageTypeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
