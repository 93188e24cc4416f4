//! Message types carried by the bus.

use crate::input::InputEvent;
use std::sync::Arc;
use std::time::Duration;

/// The closed set of payload kinds a topic can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A world-space position report.
    Position {
        /// X in world pixels.
        x: i32,
        /// Y in world pixels.
        y: i32,
    },
    /// An input event forwarded from the event source.
    Input(InputEvent),
    /// Simulated time elapsed since the clock started.
    Tick(Duration),
    /// A control command, e.g. `"quit"`.
    Control(String),
    /// Free-form text, e.g. a menu action name.
    Text(String),
}

impl Payload {
    /// The `"quit"` control payload.
    pub fn quit() -> Self {
        Self::Control("quit".to_string())
    }

    /// Whether this payload is the `"quit"` control command.
    pub fn is_quit(&self) -> bool {
        matches!(self, Self::Control(c) if c == "quit")
    }
}

/// A published message. Immutable once built; subscribers share it.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Topic the message was published on.
    pub topic: Arc<str>,
    /// The payload.
    pub payload: Payload,
}

impl Message {
    /// Build a message.
    pub fn new(topic: &str, payload: Payload) -> Self {
        Self {
            topic: Arc::from(topic),
            payload,
        }
    }

    /// Check the topic.
    #[inline]
    pub fn is(&self, topic: &str) -> bool {
        &*self.topic == topic
    }
}
