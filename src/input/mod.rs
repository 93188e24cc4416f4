//! Input events consumed by the runtime.
//!
//! The OS event pump is an external collaborator: anything implementing
//! [`EventSource`] can feed the game. [`CrosstermSource`] is the terminal
//! implementation used by the demo.

mod source;

pub use source::CrosstermSource;

use crate::error::Result;
use std::time::Duration;

/// Key codes understood by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable character.
    Char(char),
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Enter/Return key.
    Enter,
    /// Escape key.
    Esc,
}

/// Mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button.
    Left,
    /// Right mouse button.
    Right,
    /// Middle mouse button.
    Middle,
}

/// Input events, in screen pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// The window or terminal asked to close.
    Quit,
    /// A key was pressed.
    KeyDown(KeyCode),
    /// A key was released.
    KeyUp(KeyCode),
    /// Mouse button pressed.
    MouseDown {
        /// X position.
        x: i32,
        /// Y position.
        y: i32,
        /// Button pressed.
        button: MouseButton,
    },
    /// Mouse button released.
    MouseUp {
        /// X position.
        x: i32,
        /// Y position.
        y: i32,
        /// Button released.
        button: MouseButton,
    },
    /// Mouse moved.
    MouseMove {
        /// X position.
        x: i32,
        /// Y position.
        y: i32,
    },
}

impl InputEvent {
    /// The pointer position carried by mouse events.
    pub const fn position(&self) -> Option<(i32, i32)> {
        match *self {
            Self::MouseDown { x, y, .. } | Self::MouseUp { x, y, .. } | Self::MouseMove { x, y } => {
                Some((x, y))
            }
            _ => None,
        }
    }
}

/// A producer of input events.
pub trait EventSource {
    /// Wait up to `timeout` for the next event.
    ///
    /// Returns `Ok(None)` when nothing arrived in time.
    fn next_event(&mut self, timeout: Duration) -> Result<Option<InputEvent>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_only_for_mouse_events() {
        assert_eq!(InputEvent::MouseMove { x: 3, y: 4 }.position(), Some((3, 4)));
        assert_eq!(
            InputEvent::MouseUp { x: 1, y: 2, button: MouseButton::Left }.position(),
            Some((1, 2))
        );
        assert_eq!(InputEvent::KeyDown(KeyCode::Left).position(), None);
        assert_eq!(InputEvent::Quit.position(), None);
    }
}
