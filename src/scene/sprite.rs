//! Sprites drawn from shared, lazily loaded sprite sheets.

use super::{project, Node};
use crate::error::{Error, Result};
use crate::layout::Rect;
use crate::render::{Renderer, Texture};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

/// A sprite sheet laid out as a grid of equally sized frames.
///
/// The texture is loaded on first use and shared by every sprite built
/// from the template.
#[derive(Debug)]
pub struct SpriteTemplate {
    /// Asset path of the sheet.
    pub sheet: String,
    /// Point within a frame that is drawn at the sprite's position.
    pub base: (i32, i32),
    /// Frames along each axis.
    pub frames: (i32, i32),
    /// Size of one frame.
    pub frame_size: (i32, i32),
    texture: OnceCell<Texture>,
}

impl SpriteTemplate {
    /// Describe a sheet of `frames.0 * frames.1` frames.
    pub fn new(sheet: &str, frames: (i32, i32), frame_size: (i32, i32)) -> Self {
        Self {
            sheet: sheet.to_string(),
            base: (0, 0),
            frames,
            frame_size,
            texture: OnceCell::new(),
        }
    }

    /// Set the anchor point within the frame.
    #[must_use]
    pub fn with_base(mut self, x: i32, y: i32) -> Self {
        self.base = (x, y);
        self
    }

    /// Load the sheet once; later calls return the same texture.
    pub fn load(&self, renderer: &mut dyn Renderer) -> Result<Texture> {
        self.texture
            .get_or_try_init(|| renderer.load_image(&self.sheet))
            .copied()
    }

    /// Source rectangle of `frame`, wrapping on both axes.
    pub const fn frame_rect(&self, frame: i32) -> Rect {
        let (fx, fy) = self.frames;
        let (w, h) = self.frame_size;
        let col = frame.rem_euclid(fx);
        let row = (frame / fx).rem_euclid(fy);
        Rect::new(col * w, row * h, w, h)
    }
}

/// Named sprite templates.
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    templates: HashMap<String, Arc<SpriteTemplate>>,
}

impl TemplateLibrary {
    /// An empty library.
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Add or replace a template.
    pub fn insert(&mut self, key: &str, template: SpriteTemplate) {
        self.templates.insert(key.to_string(), Arc::new(template));
    }

    /// Look up a template.
    pub fn get(&self, key: &str) -> Result<Arc<SpriteTemplate>> {
        self.templates
            .get(key)
            .cloned()
            .ok_or_else(|| Error::UnknownTemplate(key.to_string()))
    }

    /// Build a sprite from a template at the origin.
    pub fn sprite(&self, key: &str) -> Result<Sprite> {
        Ok(Sprite::new(self.get(key)?))
    }
}

impl Default for TemplateLibrary {
    fn default() -> Self {
        let mut lib = Self::empty();
        lib.insert("player", SpriteTemplate::new("assets/spacepsn.png", (4, 1), (32, 32)));
        lib.insert("door", SpriteTemplate::new("assets/door.png", (4, 1), (64, 64)));
        lib.insert("cursor", SpriteTemplate::new("assets/cursor.png", (2, 1), (16, 16)));
        lib.insert(
            "orb",
            SpriteTemplate::new("assets/orb.png", (1, 1), (32, 32)).with_base(16, 32),
        );
        lib.insert(
            "orb.shadow",
            SpriteTemplate::new("assets/orb_shadow.png", (1, 1), (32, 16)).with_base(16, 8),
        );
        lib.insert(
            "orb.selection",
            SpriteTemplate::new("assets/selection.png", (1, 1), (20, 12)).with_base(10, 6),
        );
        lib.insert("button", SpriteTemplate::new("assets/button.png", (1, 2), (256, 64)));
        lib.insert(
            "hex",
            SpriteTemplate::new("assets/hex.png", (1, 1), (192, 128)).with_base(96, 64),
        );
        lib
    }
}

/// One frame of a template at a world position.
#[derive(Debug, Clone)]
pub struct Sprite {
    /// Template the frames come from.
    pub template: Arc<SpriteTemplate>,
    /// X position.
    pub x: i32,
    /// Y position.
    pub y: i32,
    /// Depth.
    pub z: i32,
    /// Frame index.
    pub frame: i32,
    /// Skip drawing while set.
    pub invisible: bool,
}

impl Sprite {
    /// A visible sprite at the origin showing frame 0.
    pub const fn new(template: Arc<SpriteTemplate>) -> Self {
        Self {
            template,
            x: 0,
            y: 0,
            z: 0,
            frame: 0,
            invisible: false,
        }
    }

    /// Place the sprite.
    #[must_use]
    pub fn at(mut self, x: i32, y: i32, z: i32) -> Self {
        self.x = x;
        self.y = y;
        self.z = z;
        self
    }

    /// Screen rectangle covered by the current frame.
    pub fn bounds(&self) -> Rect {
        let (x, y) = project(self.x, self.y, self.z);
        let (w, h) = self.template.frame_size;
        Rect::new(x - self.template.base.0, y - self.template.base.1, w, h)
    }
}

impl Node for Sprite {
    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        if self.invisible {
            return Ok(());
        }
        let texture = self.template.load(renderer)?;
        renderer.copy(texture, self.template.frame_rect(self.frame), self.bounds())
    }
}
