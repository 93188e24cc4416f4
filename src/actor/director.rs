//! Director: the controller's life loop.
//!
//! Tracks the game state, moves the camera after the player and tells the
//! player when it has reached the floor. It consumes four topics and never
//! publishes on the bus, so it can not close a cycle with any publisher.

use super::{ActorHandle, Control, Snapshot};
use crate::bus::{topic, Bus, Mailbox, Message, Payload, Subscriptions};
use crate::error::Result;
use crate::input::{InputEvent, KeyCode};
use crate::layout::{Rect, WorldView};
use crossbeam_channel::{select, Receiver, Sender, TrySendError};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Top-level game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameState {
    /// The menu is up and the clock is silent.
    Menu,
    /// Playing.
    Running,
    /// Shutting down.
    Quitting,
}

/// What the render thread reads from the director each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectorView {
    /// Game state.
    pub state: GameState,
    /// Camera rectangle in world coordinates.
    pub view: Rect,
    /// Whether the menu is shown.
    pub menu_visible: bool,
}

/// The director's private state.
#[derive(Debug, Clone)]
pub struct DirectorLogic {
    camera: WorldView,
    floor_y: i32,
    state: GameState,
    menu_visible: bool,
}

impl DirectorLogic {
    /// Start in `state` with the camera at `camera`. The menu is shown in
    /// [`GameState::Menu`].
    pub const fn new(camera: WorldView, floor_y: i32, state: GameState) -> Self {
        Self {
            camera,
            floor_y,
            state,
            menu_visible: matches!(state, GameState::Menu),
        }
    }

    /// Current state.
    pub const fn state(&self) -> GameState {
        self.state
    }

    /// Snapshot for the renderer.
    pub const fn view(&self) -> DirectorView {
        DirectorView {
            state: self.state,
            view: self.camera.view(),
            menu_visible: self.menu_visible,
        }
    }

    /// React to one message.
    ///
    /// Continues with `Some(Control::Land)` when the player should be told
    /// it touched the floor. Breaks once the game is quitting.
    pub fn on_message(&mut self, message: &Message) -> ControlFlow<(), Option<Control>> {
        match &message.payload {
            payload if payload.is_quit() => return self.quit(),
            Payload::Text(action) if message.is(topic::MENU_ACTION) => match action.as_str() {
                "start" => {
                    self.menu_visible = false;
                    self.state = GameState::Running;
                }
                "quit" => return self.quit(),
                other => debug!(action = other, "ignoring menu action"),
            },
            &Payload::Position { x, y } if message.is(topic::PLAYER_LOCATION) => {
                self.camera.focus(x, y);
                if y >= self.floor_y {
                    return ControlFlow::Continue(Some(Control::Land));
                }
            }
            Payload::Input(InputEvent::Quit | InputEvent::KeyUp(KeyCode::Char('q'))) => {
                return self.quit();
            }
            _ => {}
        }
        ControlFlow::Continue(None)
    }

    fn quit(&mut self) -> ControlFlow<(), Option<Control>> {
        self.state = GameState::Quitting;
        ControlFlow::Break(())
    }
}

/// The controller actor.
#[derive(Debug)]
pub struct Director {
    handle: ActorHandle,
    view: Snapshot<DirectorView>,
}

impl Director {
    /// Subscribe to `quit`, `player.location`, `input.event` and
    /// `menu.action` and start the life loop.
    ///
    /// `player` receives landing commands; `menu_visible` mirrors the menu
    /// flag so buttons stop responding as soon as the game starts.
    pub fn new(
        bus: &Bus,
        logic: DirectorLogic,
        player: Sender<Control>,
        menu_visible: Arc<AtomicBool>,
        capacity: usize,
    ) -> Result<Self> {
        menu_visible.store(logic.view().menu_visible, Ordering::Release);
        let view = Snapshot::new(logic.view());
        let mailbox = Mailbox::new(capacity);
        let subscriptions = Subscriptions::new(
            bus,
            &[topic::QUIT, topic::PLAYER_LOCATION, topic::INPUT, topic::MENU_ACTION],
            &mailbox,
        );

        let handle = {
            let view = view.clone();
            ActorHandle::spawn("director", move |stop| {
                Self::life(logic, &mailbox, &stop, &player, &menu_visible, &view);
                drop(subscriptions);
            })?
        };
        Ok(Self { handle, view })
    }

    /// Latest published view.
    pub fn view(&self) -> DirectorView {
        self.view.load()
    }

    /// A reader of the published view that can move to another thread.
    pub fn snapshot(&self) -> Snapshot<DirectorView> {
        self.view.clone()
    }

    /// Current game state.
    pub fn state(&self) -> GameState {
        self.view.load().state
    }

    /// Stop the life loop and wait for it.
    pub fn shutdown(&mut self) {
        self.handle.shutdown();
    }

    fn life(
        mut logic: DirectorLogic,
        mailbox: &Mailbox,
        stop: &Receiver<()>,
        player: &Sender<Control>,
        menu_visible: &AtomicBool,
        view: &Snapshot<DirectorView>,
    ) {
        loop {
            select! {
                recv(stop) -> _ => break,
                recv(mailbox.receiver()) -> message => {
                    let Ok(message) = message else { break };
                    let flow = logic.on_message(&message);
                    menu_visible.store(logic.view().menu_visible, Ordering::Release);
                    view.store(logic.view());
                    match flow {
                        ControlFlow::Break(()) => break,
                        ControlFlow::Continue(Some(control)) => {
                            // Never block here: the player may be publishing to us.
                            match player.try_send(control) {
                                Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                                Err(TrySendError::Full(_)) => {
                                    warn!(?control, "player control channel full, command dropped");
                                }
                            }
                        }
                        ControlFlow::Continue(None) => {}
                    }
                }
            }
        }
        info!(state = ?logic.state(), "director finished");
    }
}
