//! Actor Model: one thread per entity, message-driven.
//!
//! Every entity owns a private state block and runs a sequential life loop
//! on its own thread. The loop is the only writer of that state. It reads
//! from up to three sources through crossbeam `select!`:
//!
//! - its **mailbox**, fed by the [`Bus`](crate::bus::Bus);
//! - an optional **control channel** for direct commands;
//! - a **stop channel** owned by its [`ActorHandle`].
//!
//! After each state change the loop stores a small `Copy` view of itself in
//! a [`Snapshot`], which the render thread loads once per frame. Actors
//! never draw on their own thread.
//!
//! # Architecture
//!
//! ```text
//! ┌───────┐ Tick  ┌─────────────┐ Position ┌──────────┐
//! │ Clock │ ────▶ │ Player/Orbs │ ───────▶ │ Director │──▶ camera
//! └───────┘       └─────────────┘    │     └──────────┘
//!                                    └────▶ Doors
//! ┌─────────────┐ InputEvent ┌──────────────────────────┐
//! │ Game (main) │ ─────────▶ │ Buttons, Cursor, Director│
//! └─────────────┘            └──────────────────────────┘
//! ```
//!
//! The publish graph is acyclic: no actor publishes to a topic that one of
//! its own publishers consumes, so bounded mailboxes cannot deadlock.

mod button;
mod clock;
mod cursor;
mod director;
mod door;
mod orb;
mod player;

pub use button::{Action, Button, ButtonLogic, ButtonView, PRESS_OFFSET};
pub use clock::Clock;
pub use cursor::{Cursor, CursorView};
pub use director::{Director, DirectorLogic, DirectorView, GameState};
pub use door::{Door, DoorCommand, DoorLogic, DoorState, DoorView};
pub use orb::{jiggle, Orb};
pub use player::{Animation, Control, Facing, Player, PlayerState, PlayerView};

use crate::error::{Error, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use crossbeam_utils::atomic::AtomicCell;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info};

/// A value shared between one writer thread and any number of readers.
///
/// Loads and stores are whole-value, so a reader always sees a view that
/// the writer stored in one piece.
pub struct Snapshot<T: Copy>(Arc<AtomicCell<T>>);

impl<T: Copy> Snapshot<T> {
    /// Create a snapshot holding `value`.
    pub fn new(value: T) -> Self {
        Self(Arc::new(AtomicCell::new(value)))
    }

    /// Read the latest value.
    #[inline]
    pub fn load(&self) -> T {
        self.0.load()
    }

    /// Replace the value.
    #[inline]
    pub fn store(&self, value: T) {
        self.0.store(value);
    }
}

impl<T: Copy> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: Copy + std::fmt::Debug> std::fmt::Debug for Snapshot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Snapshot").field(&self.load()).finish()
    }
}

/// Owns an actor thread and its stop channel.
///
/// Dropping the handle signals the actor to stop but does not wait.
/// Call [`shutdown`](Self::shutdown) to stop and wait for completion.
#[derive(Debug)]
pub struct ActorHandle {
    name: String,
    /// Dropping this sender disconnects the actor's stop receiver.
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ActorHandle {
    /// Spawn a named actor thread running `life`.
    ///
    /// `life` receives the stop receiver; it must return once that receiver
    /// reports disconnection.
    pub fn spawn<F>(name: &str, life: F) -> Result<Self>
    where
        F: FnOnce(Receiver<()>) + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let actor = name.to_string();
        let thread = thread::Builder::new()
            .name(format!("teleport-{name}"))
            .spawn(move || {
                life(stop_rx);
                info!(actor = %actor, "actor stopped");
            })
            .map_err(|source| Error::Spawn {
                name: name.to_string(),
                source,
            })?;
        info!(actor = name, "actor started");

        Ok(Self {
            name: name.to_string(),
            stop: Some(stop_tx),
            thread: Some(thread),
        })
    }

    /// The actor's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signal the actor to stop.
    pub fn stop(&mut self) {
        self.stop.take();
    }

    /// Wait for the actor thread to finish. Returns immediately after the
    /// first call.
    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!(actor = %self.name, "actor panicked");
            }
        }
    }

    /// Signal, then wait.
    pub fn shutdown(&mut self) {
        self.stop();
        self.join();
    }

    /// Whether the thread has finished (or was already joined).
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for ActorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
