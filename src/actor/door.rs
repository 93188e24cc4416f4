//! Door Actor: opens when the player comes near.
//!
//! The door listens to `player.location`. Its logical state flips
//! instantly; the drawn frame eases toward the state one step per local
//! tick, so a door that closes mid-open animates back down.
//!
//! There is a single threshold for both directions: a player standing on
//! the boundary can make the door flip on consecutive updates.

use super::{ActorHandle, Snapshot};
use crate::bus::{topic, Bus, Mailbox, Payload, Subscriptions};
use crate::error::Result;
use crate::layout::Rect;
use crate::render::{Renderer, Texture};
use crate::scene::{Node, SpriteTemplate, TemplateLibrary};
use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

/// Template key of the door's sprite sheet.
pub const DOOR_TEMPLATE: &str = "door";
/// Last frame of the opening animation.
const MAX_FRAME: i32 = 3;
/// Half-width of the square around the door that counts as near.
pub const PROXIMITY: i32 = 200;

/// Logical door state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoorState {
    /// Closed (frame eases to 0).
    Closed,
    /// Open (frame eases to the last frame).
    Open,
    /// Life loop ended.
    Quit,
}

/// Direct commands overriding the proximity logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoorCommand {
    /// Force open.
    Open,
    /// Force closed.
    Close,
    /// End the life loop.
    Quit,
}

/// Render-thread view of a door.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorView {
    /// Logical state.
    pub state: DoorState,
    /// Animation frame, 0 (shut) to 3 (open).
    pub frame: i32,
}

/// The door's private state machine.
#[derive(Debug, Clone)]
pub struct DoorLogic {
    x: i32,
    y: i32,
    state: DoorState,
    frame: i32,
}

impl DoorLogic {
    /// A closed door at `(x, y)`.
    pub const fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            state: DoorState::Closed,
            frame: 0,
        }
    }

    /// Current state.
    pub const fn state(&self) -> DoorState {
        self.state
    }

    /// Current frame.
    pub const fn frame(&self) -> i32 {
        self.frame
    }

    /// Snapshot for the renderer.
    pub const fn view(&self) -> DoorView {
        DoorView {
            state: self.state,
            frame: self.frame,
        }
    }

    /// React to a reported player position.
    pub fn on_position(&mut self, px: i32, py: i32) {
        let near = px > self.x - PROXIMITY
            && px < self.x + PROXIMITY
            && py > self.y - PROXIMITY
            && py < self.y + PROXIMITY;
        match self.state {
            DoorState::Closed if near => self.state = DoorState::Open,
            DoorState::Open if !near => self.state = DoorState::Closed,
            _ => {}
        }
    }

    /// Advance the animation one step toward the logical state.
    pub fn on_tick(&mut self) {
        match self.state {
            DoorState::Closed if self.frame > 0 => self.frame -= 1,
            DoorState::Open if self.frame < MAX_FRAME => self.frame += 1,
            _ => {}
        }
    }

    /// Apply a direct command. Breaks on [`DoorCommand::Quit`].
    pub fn apply(&mut self, command: DoorCommand) -> ControlFlow<()> {
        match command {
            DoorCommand::Open => self.state = DoorState::Open,
            DoorCommand::Close => self.state = DoorState::Closed,
            DoorCommand::Quit => {
                self.state = DoorState::Quit;
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }
}

/// A door entity.
#[derive(Debug)]
pub struct Door {
    handle: ActorHandle,
    control: Sender<DoorCommand>,
    view: Snapshot<DoorView>,
    template: Arc<SpriteTemplate>,
    texture: Texture,
    x: i32,
    y: i32,
}

impl Door {
    /// Load the door texture and start its life loop.
    ///
    /// `tick_interval` paces the open/close animation.
    pub fn new(
        renderer: &mut dyn Renderer,
        bus: &Bus,
        templates: &TemplateLibrary,
        position: (i32, i32),
        tick_interval: Duration,
        capacity: usize,
    ) -> Result<Self> {
        let template = templates.get(DOOR_TEMPLATE)?;
        let texture = template.load(renderer)?;
        let (x, y) = position;

        let logic = DoorLogic::new(x, y);
        let view = Snapshot::new(logic.view());
        let mailbox = Mailbox::new(capacity);
        let subscriptions = Subscriptions::new(bus, &[topic::PLAYER_LOCATION], &mailbox);
        let (control, control_rx) = bounded(capacity);

        let handle = {
            let view = view.clone();
            ActorHandle::spawn("door", move |stop| {
                Self::life(logic, &mailbox, &control_rx, &stop, tick_interval, &view);
                drop(subscriptions);
            })?
        };

        Ok(Self {
            handle,
            control,
            view,
            template,
            texture,
            x,
            y,
        })
    }

    /// A sender for direct commands.
    pub fn controller(&self) -> Sender<DoorCommand> {
        self.control.clone()
    }

    /// Latest published view.
    pub fn view(&self) -> DoorView {
        self.view.load()
    }

    fn life(
        mut logic: DoorLogic,
        mailbox: &Mailbox,
        control: &Receiver<DoorCommand>,
        stop: &Receiver<()>,
        tick_interval: Duration,
        view: &Snapshot<DoorView>,
    ) {
        let ticker = tick(tick_interval);
        loop {
            select! {
                recv(stop) -> _ => break,
                recv(control) -> command => {
                    let Ok(command) = command else { break };
                    let flow = logic.apply(command);
                    view.store(logic.view());
                    if flow.is_break() {
                        break;
                    }
                }
                recv(mailbox.receiver()) -> message => {
                    let Ok(message) = message else { break };
                    if let Payload::Position { x, y } = message.payload {
                        logic.on_position(x, y);
                        view.store(logic.view());
                    }
                }
                recv(ticker) -> _ => {
                    logic.on_tick();
                    view.store(logic.view());
                }
            }
        }
        // The ticker only stops firing once its receiver is gone.
        drop(ticker);
    }
}

impl Node for Door {
    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        let frame = self.view.load().frame;
        let (w, h) = self.template.frame_size;
        renderer.copy(
            self.texture,
            self.template.frame_rect(frame),
            Rect::new(self.x, self.y, w, h),
        )
    }

    /// Sends [`DoorCommand::Quit`] and waits for the life loop to end.
    fn destroy(&mut self) {
        let _ = self.control.send(DoorCommand::Quit);
        self.handle.join();
    }
}
