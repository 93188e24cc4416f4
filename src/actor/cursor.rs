//! Cursor Actor: follows the pointer in screen space.

use super::{ActorHandle, Snapshot};
use crate::bus::{topic, Bus, Mailbox, Payload, Subscriptions, DEFAULT_MAILBOX_CAPACITY};
use crate::error::Result;
use crate::input::InputEvent;
use crate::render::Renderer;
use crate::scene::{Node, Sprite, TemplateLibrary};
use crossbeam_channel::{select, Receiver};

/// Pointer position and button state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorView {
    /// Screen X.
    pub x: i32,
    /// Screen Y.
    pub y: i32,
    /// 1 while a mouse button is held.
    pub frame: i32,
}

impl CursorView {
    /// The view after `event`.
    pub const fn apply(self, event: &InputEvent) -> Self {
        let Some((x, y)) = event.position() else {
            return self;
        };
        let frame = match event {
            InputEvent::MouseDown { .. } => 1,
            InputEvent::MouseUp { .. } => 0,
            _ => self.frame,
        };
        Self { x, y, frame }
    }
}

/// The on-screen pointer.
#[derive(Debug)]
pub struct Cursor {
    handle: ActorHandle,
    view: Snapshot<CursorView>,
    sprite: Sprite,
}

impl Cursor {
    /// Subscribe to `input.event` and `quit` and start tracking.
    pub fn new(bus: &Bus, templates: &TemplateLibrary) -> Result<Self> {
        let sprite = templates.sprite("cursor")?;
        let view = Snapshot::new(CursorView::default());
        let mailbox = Mailbox::new(DEFAULT_MAILBOX_CAPACITY);
        let subscriptions = Subscriptions::new(bus, &[topic::INPUT, topic::QUIT], &mailbox);

        let handle = {
            let view = view.clone();
            ActorHandle::spawn("cursor", move |stop| {
                Self::life(&mailbox, &stop, &view);
                drop(subscriptions);
            })?
        };
        Ok(Self { handle, view, sprite })
    }

    /// Latest pointer state.
    pub fn view(&self) -> CursorView {
        self.view.load()
    }

    fn life(mailbox: &Mailbox, stop: &Receiver<()>, view: &Snapshot<CursorView>) {
        let mut current = view.load();
        loop {
            select! {
                recv(stop) -> _ => break,
                recv(mailbox.receiver()) -> message => {
                    let Ok(message) = message else { break };
                    match message.payload {
                        Payload::Input(event) => {
                            current = current.apply(&event);
                            view.store(current);
                        }
                        ref payload if payload.is_quit() => break,
                        _ => {}
                    }
                }
            }
        }
    }
}

impl Node for Cursor {
    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        let view = self.view.load();
        self.sprite.x = view.x;
        self.sprite.y = view.y;
        self.sprite.frame = view.frame;
        self.sprite.draw(renderer)
    }

    fn destroy(&mut self) {
        self.handle.shutdown();
    }
}
