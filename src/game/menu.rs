//! Start menu: a centred stack of buttons.

use crate::actor::{Action, Button};
use crate::bus::{topic, Bus, Payload};
use crate::error::Result;
use crate::layout::Rect;
use crate::render::Renderer;
use crate::scene::{Group, Node, TemplateLibrary};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Vertical gap between buttons.
const BUTTON_GAP: i32 = 16;

/// Menu entries as `(label, action published on menu.action)`.
const ENTRIES: [(&str, &str); 2] = [("Start", "start"), ("Quit", "quit")];

/// The start menu.
///
/// Every button shares one visibility flag, so hiding the menu also stops
/// its buttons from reacting to clicks.
#[derive(Debug)]
pub struct Menu {
    buttons: Group,
    visible: Arc<AtomicBool>,
}

impl Menu {
    /// Build the menu centred in `screen`.
    pub fn new(
        renderer: &mut dyn Renderer,
        bus: &Bus,
        templates: &TemplateLibrary,
        screen: Rect,
        visible: Arc<AtomicBool>,
    ) -> Result<Self> {
        let template = templates.get("button")?;
        let (width, height) = template.frame_size;
        let count = ENTRIES.len() as i32;
        let x = screen.x + (screen.width - width) / 2;
        let top = screen.y + (screen.height - count * height - (count - 1) * BUTTON_GAP) / 2;

        let mut buttons = Group::new();
        for (row, (label, name)) in (0..).zip(ENTRIES) {
            let action: Action = {
                let bus = bus.clone();
                Box::new(move || {
                    bus.publish(topic::MENU_ACTION, Payload::Text(name.to_string()));
                    Ok(())
                })
            };
            let y = top + row * (height + BUTTON_GAP);
            buttons.add_child(Button::new(
                renderer,
                bus,
                Arc::clone(&template),
                label,
                (x, y),
                Arc::clone(&visible),
                action,
            )?);
        }
        Ok(Self { buttons, visible })
    }

    /// Whether the menu is shown.
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    /// Show or hide the menu.
    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Release);
    }

    /// Number of buttons.
    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    /// Whether the menu has no buttons.
    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }
}

impl Node for Menu {
    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        if !self.is_visible() {
            return Ok(());
        }
        self.buttons.draw(renderer)
    }

    fn destroy(&mut self) {
        self.buttons.destroy();
    }
}
