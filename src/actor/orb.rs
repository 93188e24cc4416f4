//! Orb Actor: a floating orb bobbing on the clock.

use super::{ActorHandle, Snapshot};
use crate::bus::{topic, Bus, Mailbox, Payload, Subscriptions, DEFAULT_MAILBOX_CAPACITY};
use crate::error::Result;
use crate::render::{OffsetGuard, Renderer};
use crate::scene::{Node, Sprite, SpriteTemplate, TemplateLibrary};
use crossbeam_channel::{select, Receiver};
use std::sync::Arc;
use std::time::Duration;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Vertical bob at simulated time `elapsed`: `3 * sin(3t)`, truncated.
pub fn jiggle(elapsed: Duration) -> i32 {
    (3.0 * (3.0 * elapsed.as_secs_f64()).sin()) as i32
}

/// Sprites and life loop, created on first draw.
#[derive(Debug)]
struct OrbParts {
    body: Sprite,
    shadow: Sprite,
    selection: Sprite,
    jiggle: Snapshot<i32>,
    handle: ActorHandle,
}

/// A floating orb with a foreshortened shadow and an optional selection ring.
#[derive(Debug)]
pub struct Orb {
    /// X position.
    pub x: i32,
    /// Height above the ground.
    pub y: i32,
    /// Depth.
    pub z: i32,
    /// Draw the selection ring.
    pub selected: bool,
    /// Skip drawing while set.
    pub invisible: bool,
    bus: Bus,
    templates: [Arc<SpriteTemplate>; 3],
    parts: Option<OrbParts>,
    destroyed: bool,
}

impl Orb {
    /// An orb at `(x, y, z)`. Nothing is loaded or started until the first draw.
    pub fn new(bus: &Bus, templates: &TemplateLibrary, position: (i32, i32, i32)) -> Result<Self> {
        let (x, y, z) = position;
        Ok(Self {
            x,
            y,
            z,
            selected: false,
            invisible: false,
            bus: bus.clone(),
            templates: [
                templates.get("orb")?,
                templates.get("orb.shadow")?,
                templates.get("orb.selection")?,
            ],
            parts: None,
            destroyed: false,
        })
    }

    /// Current bob offset, 0 before the first draw.
    pub fn jiggle_offset(&self) -> i32 {
        self.parts.as_ref().map_or(0, |parts| parts.jiggle.load())
    }

    /// Whether the life loop has been started.
    pub const fn is_live(&self) -> bool {
        self.parts.is_some()
    }

    fn start(&self) -> Result<OrbParts> {
        let [body, shadow, selection] = self.templates.clone();
        let jiggle = Snapshot::new(0);
        let mailbox = Mailbox::new(DEFAULT_MAILBOX_CAPACITY);
        let subscriptions = Subscriptions::new(&self.bus, &[topic::CLOCK, topic::QUIT], &mailbox);
        let handle = {
            let jiggle = jiggle.clone();
            ActorHandle::spawn("orb", move |stop| {
                Self::life(&mailbox, &stop, &jiggle);
                drop(subscriptions);
            })?
        };
        Ok(OrbParts {
            body: Sprite::new(body),
            shadow: Sprite::new(shadow),
            selection: Sprite::new(selection),
            jiggle,
            handle,
        })
    }

    fn life(mailbox: &Mailbox, stop: &Receiver<()>, offset: &Snapshot<i32>) {
        loop {
            select! {
                recv(stop) -> _ => break,
                recv(mailbox.receiver()) -> message => {
                    let Ok(message) = message else { break };
                    match message.payload {
                        Payload::Tick(elapsed) => offset.store(jiggle(elapsed)),
                        ref payload if payload.is_quit() => break,
                        _ => {}
                    }
                }
            }
        }
    }
}

impl Node for Orb {
    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        if self.invisible || self.destroyed {
            return Ok(());
        }
        if self.parts.is_none() {
            self.parts = Some(self.start()?);
        }
        let Some(parts) = self.parts.as_mut() else {
            return Ok(());
        };

        let mut r = OffsetGuard::push(renderer, self.x, self.z);
        let y = self.y + parts.jiggle.load();
        {
            let dx = (2.0 * f64::from(y) / SQRT_3) as i32;
            let mut shadow = OffsetGuard::push(&mut *r, dx, y / 2);
            parts.shadow.draw(&mut *shadow)?;
        }
        if self.selected {
            parts.selection.draw(&mut *r)?;
        }
        let mut body = OffsetGuard::push(&mut *r, 0, -y);
        parts.body.draw(&mut *body)
    }

    /// Stops the life loop. The orb never restarts afterwards.
    fn destroy(&mut self) {
        self.destroyed = true;
        if let Some(parts) = self.parts.as_mut() {
            parts.handle.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::testing::wait_until;
    use crate::layout::Rect;
    use crate::render::RecordingRenderer;

    #[test]
    fn test_jiggle_is_bounded_sinusoid() {
        assert_eq!(jiggle(Duration::ZERO), 0);
        assert_eq!(jiggle(Duration::from_millis(500)), 2);
        assert_eq!(jiggle(Duration::from_millis(1500)), -2);
        for ms in (0..10_000).step_by(7) {
            assert!(jiggle(Duration::from_millis(ms)).abs() <= 3);
        }
    }

    #[test]
    fn test_draw_order_and_offsets() {
        let bus = Bus::new();
        let lib = TemplateLibrary::default();
        let mut orb = Orb::new(&bus, &lib, (150, 22, 100)).unwrap();
        orb.selected = true;
        assert!(!orb.is_live());

        let mut r = RecordingRenderer::new();
        orb.draw(&mut r).unwrap();
        assert!(orb.is_live());

        let drawn: Vec<_> = r
            .copies()
            .map(|(t, dst, _)| (r.texture_name(t).unwrap().to_string(), dst))
            .collect();
        assert_eq!(
            drawn,
            [
                ("assets/orb_shadow.png".to_string(), Rect::new(159, 103, 32, 16)),
                ("assets/selection.png".to_string(), Rect::new(140, 94, 20, 12)),
                ("assets/orb.png".to_string(), Rect::new(134, 46, 32, 32)),
            ]
        );
        assert_eq!(r.offset_depth(), 0);
        orb.destroy();
    }

    #[test]
    fn test_unselected_orb_skips_ring() {
        let bus = Bus::new();
        let lib = TemplateLibrary::default();
        let mut orb = Orb::new(&bus, &lib, (0, 0, 0)).unwrap();
        let mut r = RecordingRenderer::new();
        orb.draw(&mut r).unwrap();
        assert_eq!(r.copies_of("assets/selection.png").count(), 0);
        orb.destroy();
    }

    #[test]
    fn test_clock_moves_orb_and_destroy_unsubscribes() {
        let bus = Bus::new();
        let lib = TemplateLibrary::default();
        let mut orb = Orb::new(&bus, &lib, (0, 40, 0)).unwrap();
        let mut r = RecordingRenderer::new();
        orb.draw(&mut r).unwrap();
        assert_eq!(bus.subscriber_count(topic::CLOCK), 1);

        bus.publish(topic::CLOCK, Payload::Tick(Duration::from_millis(500)));
        assert!(wait_until(Duration::from_secs(2), || orb.jiggle_offset() == 2));

        orb.destroy();
        orb.destroy();
        assert_eq!(bus.subscriber_count(topic::CLOCK), 0);
        r.clear_calls();
        orb.draw(&mut r).unwrap();
        assert_eq!(r.copies().count(), 0);
    }

    #[test]
    fn test_quit_broadcast_ends_life_loop() {
        let bus = Bus::new();
        let lib = TemplateLibrary::default();
        let mut orb = Orb::new(&bus, &lib, (0, 0, 0)).unwrap();
        orb.draw(&mut RecordingRenderer::new()).unwrap();
        bus.publish(topic::QUIT, Payload::quit());
        assert!(wait_until(Duration::from_secs(2), || bus.subscriber_count(topic::QUIT) == 0));
        orb.destroy();
    }

    #[test]
    fn test_missing_template_is_an_error() {
        let bus = Bus::new();
        assert!(Orb::new(&bus, &TemplateLibrary::empty(), (0, 0, 0)).is_err());
    }
}
