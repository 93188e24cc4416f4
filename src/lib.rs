//! # Teleport
//!
//! Runtime core for a small real-time 2D game where every entity is an actor.
//!
//! Each entity (player, door, button, orb, cursor) owns its state and runs
//! its own life loop on its own thread. Entities talk through a
//! publish-subscribe [`Bus`] that routes typed [`Payload`]s by topic into
//! bounded per-entity mailboxes. A single render thread composes the scene
//! once per frame from lock-free snapshots of each entity.
//!
//! ## Core Concepts
//!
//! - **Event bus**: topic registry, in-order fan-out, blocking on full mailboxes
//! - **Actors**: one exclusive writer per state block, message-driven
//! - **Scene graph**: insertion-order painting with depth faked by offsets
//! - **Camera**: dead-zone follow with clamping to the world
//!
//! ## Example
//!
//! ```rust,ignore
//! use teleport::{Game, GameConfig, RecordingRenderer};
//!
//! let mut renderer = RecordingRenderer::new();
//! let mut game = Game::new(&GameConfig::default(), &mut renderer)?;
//! while !game.quitting() {
//!     // feed events with game.handle_event(..)
//!     game.draw(&mut renderer)?;
//! }
//! game.destroy();
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod bus;
pub mod error;
pub mod game;
pub mod input;
pub mod layout;
pub mod render;
pub mod scene;
pub mod terminal;

// Re-exports for convenience
pub use actor::{ActorHandle, Clock, Control, GameState, Snapshot};
pub use bus::{topic, Bus, Mailbox, Message, Payload, Subscriptions};
pub use error::{ActionError, Error, Result};
pub use game::{Game, GameConfig};
pub use input::{CrosstermSource, EventSource, InputEvent, KeyCode, MouseButton};
pub use layout::{Rect, WorldView};
pub use render::{Colour, Flip, OffsetGuard, RecordingRenderer, Renderer, TerminalConfig, TerminalRenderer, Texture};
pub use scene::{Group, Node, Sprite, TemplateLibrary};
pub use terminal::{SessionConfig, TerminalSession};
