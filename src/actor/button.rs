//! Button Actor: press, release, drag-away.
//!
//! The frame index doubles as the press state: frame 0 is idle, frame 1 is
//! pressed. Pointer events arrive on `input.event`; a `quit` broadcast ends
//! the life loop.

use super::{ActorHandle, Snapshot};
use crate::bus::{topic, Bus, Mailbox, Payload, Subscriptions, DEFAULT_MAILBOX_CAPACITY};
use crate::error::{ActionError, Result};
use crate::input::InputEvent;
use crate::layout::Rect;
use crate::render::{Colour, OffsetGuard, Renderer};
use crate::scene::{Label, Node, Sprite, SpriteTemplate};
use crossbeam_channel::{select, Receiver};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// How far the label drops while the button is held.
pub const PRESS_OFFSET: i32 = 8;

/// Callback run when a press completes inside the button.
pub type Action = Box<dyn FnMut() -> std::result::Result<(), ActionError> + Send>;

/// What the render thread needs to draw a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonView {
    /// Sprite frame: 0 idle, 1 pressed.
    pub frame: i32,
    /// Extra vertical offset of the label.
    pub label_dy: i32,
}

/// Press state machine over a fixed hit rectangle.
#[derive(Debug, Clone)]
pub struct ButtonLogic {
    bounds: Rect,
    view: ButtonView,
}

impl ButtonLogic {
    /// An idle button covering `bounds` (edges included).
    pub const fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            view: ButtonView {
                frame: 0,
                label_dy: 0,
            },
        }
    }

    /// Current view.
    pub const fn view(&self) -> ButtonView {
        self.view
    }

    /// Whether the button is held down.
    pub const fn is_pressed(&self) -> bool {
        self.view.frame == 1
    }

    /// Point-in-rectangle test. A hidden button is never hit.
    pub const fn hit_test(&self, x: i32, y: i32, visible: bool) -> bool {
        visible && self.bounds.contains_inclusive(x, y)
    }

    /// Feed one input event. Returns `true` when the action should run.
    pub fn on_input(&mut self, event: &InputEvent, visible: bool) -> bool {
        match *event {
            InputEvent::MouseDown { x, y, .. } if self.hit_test(x, y, visible) => {
                self.view = ButtonView {
                    frame: 1,
                    label_dy: PRESS_OFFSET,
                };
                false
            }
            InputEvent::MouseUp { x, y, .. } if self.is_pressed() && self.hit_test(x, y, visible) => {
                self.view = ButtonView::default();
                true
            }
            InputEvent::MouseMove { x, y } if self.is_pressed() && !self.hit_test(x, y, visible) => {
                self.view = ButtonView::default();
                false
            }
            _ => false,
        }
    }
}

/// A clickable button with a centred text label.
#[derive(Debug)]
pub struct Button {
    handle: ActorHandle,
    view: Snapshot<ButtonView>,
    sprite: Sprite,
    label: Label,
    label_y: i32,
    visible: Arc<AtomicBool>,
}

impl Button {
    /// Render the label, subscribe to `input.event` and `quit`, and start
    /// the life loop.
    ///
    /// `visible` is shared with whoever shows and hides the button; hit
    /// testing honours it too.
    pub fn new(
        renderer: &mut dyn Renderer,
        bus: &Bus,
        template: Arc<SpriteTemplate>,
        label: &str,
        origin: (i32, i32),
        visible: Arc<AtomicBool>,
        action: Action,
    ) -> Result<Self> {
        let sprite = Sprite::new(template).at(origin.0, origin.1, 0);
        let (fw, fh) = sprite.template.frame_size;
        let mut label = Label::new(renderer, label, Colour::BLACK)?;
        let (lw, lh) = label.size();
        label.x = (fw - lw) / 2;
        label.y = (fh - lh) / 2;
        let label_y = label.y;

        let logic = ButtonLogic::new(sprite.bounds());
        let view = Snapshot::new(logic.view());
        let mailbox = Mailbox::new(DEFAULT_MAILBOX_CAPACITY);
        let subscriptions = Subscriptions::new(bus, &[topic::QUIT, topic::INPUT], &mailbox);

        let handle = {
            let view = view.clone();
            let visible = Arc::clone(&visible);
            let name = label.text().to_string();
            ActorHandle::spawn("button", move |stop| {
                Self::life(logic, action, &name, &mailbox, &stop, &visible, &view);
                drop(subscriptions);
            })?
        };

        Ok(Self {
            handle,
            view,
            sprite,
            label,
            label_y,
            visible,
        })
    }

    /// Latest published view.
    pub fn view(&self) -> ButtonView {
        self.view.load()
    }

    /// Screen rectangle of the button.
    pub fn bounds(&self) -> Rect {
        self.sprite.bounds()
    }

    /// The label text.
    pub fn text(&self) -> &str {
        self.label.text()
    }

    fn life(
        mut logic: ButtonLogic,
        mut action: Action,
        name: &str,
        mailbox: &Mailbox,
        stop: &Receiver<()>,
        visible: &AtomicBool,
        view: &Snapshot<ButtonView>,
    ) {
        loop {
            select! {
                recv(stop) -> _ => break,
                recv(mailbox.receiver()) -> message => {
                    let Ok(message) = message else { break };
                    match &message.payload {
                        payload if payload.is_quit() => break,
                        Payload::Input(event) => {
                            let fire = logic.on_input(event, visible.load(Ordering::Acquire));
                            view.store(logic.view());
                            if fire {
                                if let Err(err) = action() {
                                    warn!(button = name, %err, "button action failed");
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

impl Node for Button {
    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        if !self.visible.load(Ordering::Acquire) {
            return Ok(());
        }
        let view = self.view.load();
        self.sprite.frame = view.frame;
        self.sprite.draw(renderer)?;

        let mut r = OffsetGuard::push(renderer, self.sprite.x, self.sprite.y);
        self.label.y = self.label_y + view.label_dy;
        self.label.draw(&mut *r)
    }

    fn destroy(&mut self) {
        self.handle.shutdown();
        self.label.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::testing::wait_until;
    use crate::input::MouseButton;
    use crate::render::RecordingRenderer;
    use crate::scene::TemplateLibrary;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn down(x: i32, y: i32) -> InputEvent {
        InputEvent::MouseDown { x, y, button: MouseButton::Left }
    }

    fn up(x: i32, y: i32) -> InputEvent {
        InputEvent::MouseUp { x, y, button: MouseButton::Left }
    }

    fn logic() -> ButtonLogic {
        ButtonLogic::new(Rect::new(100, 100, 256, 64))
    }

    #[test]
    fn test_press_and_release_inside_fires_once() {
        let mut b = logic();
        assert!(!b.on_input(&down(150, 120), true));
        assert_eq!(b.view(), ButtonView { frame: 1, label_dy: PRESS_OFFSET });
        assert!(b.on_input(&up(150, 121), true));
        assert_eq!(b.view(), ButtonView::default());
        assert!(!b.on_input(&up(150, 121), true));
    }

    #[test]
    fn test_drag_away_cancels() {
        let mut b = logic();
        b.on_input(&down(150, 120), true);
        assert!(!b.on_input(&InputEvent::MouseMove { x: 10, y: 10 }, true));
        assert!(!b.is_pressed());
        assert!(!b.on_input(&up(150, 120), true));
        assert!(!b.on_input(&up(10, 10), true));
    }

    #[test]
    fn test_hit_test_includes_edges_and_respects_visibility() {
        let b = logic();
        assert!(b.hit_test(100, 100, true));
        assert!(b.hit_test(356, 164, true));
        assert!(!b.hit_test(357, 164, true));
        assert!(!b.hit_test(150, 120, false));
    }

    #[test]
    fn test_hidden_button_ignores_presses() {
        let mut b = logic();
        b.on_input(&down(150, 120), false);
        assert!(!b.is_pressed());
    }

    #[test]
    fn test_release_outside_keeps_press() {
        let mut b = logic();
        b.on_input(&down(150, 120), true);
        assert!(!b.on_input(&up(0, 0), true));
        assert!(b.is_pressed());
    }

    #[test]
    fn test_actor_runs_action_and_recovers_from_failure() {
        let bus = Bus::new();
        let lib = TemplateLibrary::default();
        let mut r = RecordingRenderer::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let action: Action = {
            let calls = Arc::clone(&calls);
            Box::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ActionError::new("boom"))
            })
        };
        let visible = Arc::new(AtomicBool::new(true));
        let mut button = Button::new(
            &mut r,
            &bus,
            lib.get("button").unwrap(),
            "Start",
            (384, 300),
            visible,
            action,
        )
        .unwrap();
        assert_eq!(button.bounds(), Rect::new(384, 300, 256, 64));

        bus.publish(topic::INPUT, Payload::Input(down(400, 310)));
        assert!(wait_until(Duration::from_secs(2), || button.view().frame == 1));

        button.draw(&mut r).unwrap();
        let label = r.copies().nth(1).unwrap().1;
        // "Start" renders 40x16, centred in 256x64, then pressed down.
        assert_eq!(label, Rect::new(384 + 108, 300 + 24 + PRESS_OFFSET, 40, 16));
        assert_eq!(r.offset_depth(), 0);

        bus.publish(topic::INPUT, Payload::Input(up(400, 310)));
        assert!(wait_until(Duration::from_secs(2), || calls.load(Ordering::SeqCst) == 1));
        assert!(wait_until(Duration::from_secs(2), || button.view().frame == 0));

        bus.publish(topic::QUIT, Payload::quit());
        button.destroy();
        assert_eq!(bus.subscriber_count(topic::INPUT), 0);
    }

    #[test]
    fn test_invisible_button_draws_nothing() {
        let bus = Bus::new();
        let lib = TemplateLibrary::default();
        let mut r = RecordingRenderer::new();
        let visible = Arc::new(AtomicBool::new(false));
        let mut button = Button::new(
            &mut r,
            &bus,
            lib.get("button").unwrap(),
            "Quit",
            (0, 0),
            visible,
            Box::new(|| Ok(())),
        )
        .unwrap();
        button.draw(&mut r).unwrap();
        assert_eq!(r.copies().count(), 0);
        button.destroy();
    }
}
