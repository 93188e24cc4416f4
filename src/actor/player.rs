//! Player Actor: movement and animation state machine.
//!
//! Commands arrive on a dedicated control channel; simulated time arrives
//! as ticks on the `clock` topic. After every physics update the player
//! publishes its position on `player.location`.
//!
//! ```text
//!            StartWalk*              StartJump            StopJump
//! Standing ◀──────────▶ Walking ──────────────▶ Jumping ──────────▶ Falling
//!    ▲      StopWalk*      │                       ▲                   │
//!    │                     └───────────────────────┘                   │
//!    └────────────────────────────── Land ─────────────────────────────┘
//! ```
//!
//! Commands that do not apply in the current state are ignored.

use super::{ActorHandle, Snapshot};
use crate::bus::{topic, Bus, Mailbox, Payload, Subscriptions};
use crate::error::Result;
use crate::layout::Rect;
use crate::render::{Renderer, Texture};
use crate::scene::{Node, SpriteTemplate, TemplateLibrary};
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Template key of the player's sprite sheet.
pub const PLAYER_TEMPLATE: &str = "player";

/// Horizontal walk speed in pixels per second.
pub const WALK_SPEED: f64 = 256.0;
/// Vertical velocity when a jump is released.
pub const JUMP_SPEED: f64 = -512.0;
/// Downward acceleration while falling.
pub const GRAVITY: f64 = 2048.0;
/// Base smoothing factor toward the desired velocity.
pub const TAU: f64 = 0.2;

/// Which way the player faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    /// Facing left (sprite as drawn).
    Left,
    /// Facing right (sprite mirrored).
    Right,
}

/// Animation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Animation {
    /// Idle.
    Standing,
    /// Moving horizontally.
    Walking,
    /// Crouched for a jump; nothing moves until the jump is released.
    Jumping,
    /// Airborne under gravity.
    Falling,
}

/// Commands accepted on the player's control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// End the life loop.
    Quit,
    /// Begin walking left.
    StartWalkLeft,
    /// Stop walking.
    StopWalkLeft,
    /// Begin walking right.
    StartWalkRight,
    /// Stop walking.
    StopWalkRight,
    /// Start charging a jump.
    StartJump,
    /// Release the jump.
    StopJump,
    /// Accepted, no effect yet.
    StartFire,
    /// Accepted, no effect yet.
    StopFire,
    /// Touch the ground.
    Land,
    /// Accepted, no effect yet.
    Teleport,
}

/// What the render thread needs to draw the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerView {
    /// Draw position.
    pub x: i32,
    /// Draw position.
    pub y: i32,
    /// Frame within the walk strip.
    pub frame: i32,
    /// Facing.
    pub facing: Facing,
    /// Animation state.
    pub animation: Animation,
}

/// The player's private state. Mutated only by its life loop.
#[derive(Debug, Clone)]
pub struct PlayerState {
    facing: Facing,
    animation: Animation,
    last_tick: Option<Duration>,
    frame: i32,
    /// Desired velocity.
    want: (f64, f64),
    position: (f64, f64),
    velocity: (f64, f64),
    acceleration: (f64, f64),
}

impl PlayerState {
    /// A standing player at `(x, y)`.
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            facing: Facing::Left,
            animation: Animation::Standing,
            last_tick: None,
            frame: 0,
            want: (0.0, 0.0),
            position: (x, y),
            velocity: (0.0, 0.0),
            acceleration: (0.0, 0.0),
        }
    }

    /// Current animation state.
    pub const fn animation(&self) -> Animation {
        self.animation
    }

    /// Current facing.
    pub const fn facing(&self) -> Facing {
        self.facing
    }

    /// Continuous position.
    pub const fn position(&self) -> (f64, f64) {
        self.position
    }

    /// Velocity in pixels per second.
    pub const fn velocity(&self) -> (f64, f64) {
        self.velocity
    }

    /// Acceleration in pixels per second squared.
    pub const fn acceleration(&self) -> (f64, f64) {
        self.acceleration
    }

    /// Position truncated for drawing.
    pub fn draw_position(&self) -> (i32, i32) {
        (self.position.0 as i32, self.position.1 as i32)
    }

    /// Snapshot for the renderer.
    pub fn view(&self) -> PlayerView {
        let (x, y) = self.draw_position();
        PlayerView {
            x,
            y,
            frame: self.frame,
            facing: self.facing,
            animation: self.animation,
        }
    }

    /// Apply one command. Breaks on [`Control::Quit`].
    pub fn apply(&mut self, control: Control) -> ControlFlow<()> {
        use Animation::{Falling, Jumping, Standing, Walking};

        match (control, self.animation) {
            (Control::Quit, _) => return ControlFlow::Break(()),
            (Control::StartWalkLeft, Standing | Walking) => {
                self.animation = Walking;
                self.facing = Facing::Left;
                self.want.0 = -WALK_SPEED;
            }
            (Control::StartWalkRight, Standing | Walking) => {
                self.animation = Walking;
                self.facing = Facing::Right;
                self.want.0 = WALK_SPEED;
            }
            (Control::StopWalkLeft | Control::StopWalkRight, Walking) => {
                self.animation = Standing;
                self.want.0 = 0.0;
            }
            (Control::StartJump, Standing | Walking) => {
                self.animation = Jumping;
            }
            (Control::StopJump, Jumping) => {
                self.animation = Falling;
                self.velocity.1 = JUMP_SPEED;
                self.acceleration.1 = GRAVITY;
            }
            (Control::Land, Falling) => {
                self.animation = Standing;
                self.velocity.1 = 0.0;
                self.acceleration.1 = 0.0;
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }

    /// Advance physics to simulated time `t`.
    ///
    /// The first tick only records a baseline. Returns whether the state
    /// advanced.
    pub fn update(&mut self, t: Duration) -> bool {
        let Some(last) = self.last_tick else {
            self.last_tick = Some(t);
            return false;
        };
        let delta = t.saturating_sub(last).as_secs_f64();

        match self.animation {
            Animation::Falling => {
                self.frame = 0;
                self.velocity.0 += self.acceleration.0 * delta;
                self.velocity.1 += self.acceleration.1 * delta;
            }
            animation => {
                self.frame = if animation == Animation::Walking {
                    walk_frame(t)
                } else {
                    0
                };
                // Grows with delta; a long stall overshoots.
                let tau = TAU * delta.exp();
                self.velocity.0 = tau * self.want.0 + (1.0 - tau) * self.velocity.0;
                self.velocity.1 = tau * self.want.1 + (1.0 - tau) * self.velocity.1;
            }
        }

        self.position.0 += self.velocity.0 * delta;
        self.position.1 += self.velocity.1 * delta;
        self.last_tick = Some(t);
        true
    }
}

/// Frame of the 4-frame walk cycle at absolute time `t` (two cycles per second).
fn walk_frame(t: Duration) -> i32 {
    ((2 * t.as_millis()) % 1000 / 250) as i32
}

/// The player entity: a life loop plus the sprite the render thread draws.
#[derive(Debug)]
pub struct Player {
    handle: ActorHandle,
    control: Sender<Control>,
    view: Snapshot<PlayerView>,
    template: Arc<SpriteTemplate>,
    texture: Texture,
}

impl Player {
    /// Load the player's texture and start its life loop at `start`.
    pub fn new(
        renderer: &mut dyn Renderer,
        bus: &Bus,
        templates: &TemplateLibrary,
        start: (f64, f64),
        capacity: usize,
    ) -> Result<Self> {
        let template = templates.get(PLAYER_TEMPLATE)?;
        let texture = template.load(renderer)?;

        let state = PlayerState::new(start.0, start.1);
        let view = Snapshot::new(state.view());
        let mailbox = Mailbox::new(capacity);
        let subscriptions = Subscriptions::new(bus, &[topic::CLOCK], &mailbox);
        let (control, control_rx) = bounded(capacity);

        let handle = {
            let bus = bus.clone();
            let view = view.clone();
            ActorHandle::spawn("player", move |stop| {
                Self::life(state, &mailbox, &control_rx, &stop, &bus, &view);
                drop(subscriptions);
            })?
        };

        Ok(Self {
            handle,
            control,
            view,
            template,
            texture,
        })
    }

    /// A sender for direct commands.
    pub fn controller(&self) -> Sender<Control> {
        self.control.clone()
    }

    /// Latest published view.
    pub fn view(&self) -> PlayerView {
        self.view.load()
    }

    fn life(
        mut state: PlayerState,
        mailbox: &Mailbox,
        control: &Receiver<Control>,
        stop: &Receiver<()>,
        bus: &Bus,
        view: &Snapshot<PlayerView>,
    ) {
        loop {
            select! {
                recv(stop) -> _ => break,
                recv(control) -> command => {
                    let Ok(command) = command else { break };
                    if state.apply(command).is_break() {
                        break;
                    }
                    view.store(state.view());
                }
                recv(mailbox.receiver()) -> message => {
                    let Ok(message) = message else { break };
                    if let Payload::Tick(t) = message.payload {
                        if state.update(t) {
                            let (x, y) = state.draw_position();
                            view.store(state.view());
                            bus.publish(topic::PLAYER_LOCATION, Payload::Position { x, y });
                        }
                    }
                }
            }
        }
        debug!(?state, "player life loop finished");
    }
}

impl Node for Player {
    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        let view = self.view.load();
        let src = self.template.frame_rect(view.frame);
        let (w, h) = self.template.frame_size;
        let dst = Rect::new(view.x, view.y, w, h);
        match view.facing {
            Facing::Left => renderer.copy(self.texture, src, dst),
            Facing::Right => renderer.copy_flipped_horizontal(self.texture, src, dst),
        }
    }

    /// Sends [`Control::Quit`] and waits for the life loop to end.
    fn destroy(&mut self) {
        let _ = self.control.send(Control::Quit);
        self.handle.join();
    }
}
