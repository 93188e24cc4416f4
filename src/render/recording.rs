//! Headless renderer that records draw calls.

use super::{Colour, Flip, OffsetStack, Renderer, Texture};
use crate::error::{Error, Result};
use crate::layout::Rect;
use std::collections::{HashMap, HashSet};

/// Default size of images with no configured size.
const DEFAULT_IMAGE_SIZE: (i32, i32) = (64, 64);
/// Pixel size of one character of rendered text.
const GLYPH_SIZE: (i32, i32) = (8, 16);

/// One recorded renderer operation. Rectangles are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCall {
    /// Target cleared.
    Clear,
    /// Texture region copied.
    Copy {
        /// Texture drawn.
        texture: Texture,
        /// Source region within the texture.
        src: Rect,
        /// Destination with the offset stack applied.
        dst: Rect,
        /// Mirroring.
        flip: Flip,
    },
    /// Frame presented.
    Present,
}

/// A [`Renderer`] that draws nothing and remembers everything.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    offsets: OffsetStack,
    calls: Vec<DrawCall>,
    names: Vec<String>,
    sizes: HashMap<String, (i32, i32)>,
    loads: HashMap<String, usize>,
    failing_paths: HashSet<String>,
    fail_copies: bool,
}

impl RecordingRenderer {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Give the image at `path` a pixel size.
    #[must_use]
    pub fn with_image_size(mut self, path: &str, width: i32, height: i32) -> Self {
        self.sizes.insert(path.to_string(), (width, height));
        self
    }

    /// Make every load of `path` fail.
    pub fn fail_on(&mut self, path: &str) {
        self.failing_paths.insert(path.to_string());
    }

    /// Make every copy fail while set.
    pub fn set_fail_copies(&mut self, fail: bool) {
        self.fail_copies = fail;
    }

    /// All recorded calls, oldest first.
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Forget recorded calls.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Recorded copies as `(texture, absolute destination, flip)`.
    pub fn copies(&self) -> impl Iterator<Item = (Texture, Rect, Flip)> + '_ {
        self.calls.iter().filter_map(|call| match *call {
            DrawCall::Copy { texture, dst, flip, .. } => Some((texture, dst, flip)),
            _ => None,
        })
    }

    /// Recorded copies of textures named `name` (image path or text).
    pub fn copies_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = (Texture, Rect, Flip)> + 'a {
        self.copies()
            .filter(move |(texture, _, _)| self.texture_name(*texture) == Some(name))
    }

    /// The path or text a texture was created from.
    pub fn texture_name(&self, texture: Texture) -> Option<&str> {
        self.names.get(texture.id() as usize).map(String::as_str)
    }

    /// How many times `path` was loaded.
    pub fn load_count(&self, path: &str) -> usize {
        self.loads.get(path).copied().unwrap_or(0)
    }

    /// Number of outstanding offset pushes.
    pub fn offset_depth(&self) -> usize {
        self.offsets.depth()
    }

    /// The accumulated offset.
    pub const fn offset(&self) -> (i32, i32) {
        self.offsets.current()
    }

    fn mint(&mut self, name: &str, width: i32, height: i32) -> Texture {
        let id = self.names.len() as u32;
        self.names.push(name.to_string());
        Texture::new(id, width, height)
    }
}

impl Renderer for RecordingRenderer {
    fn load_image(&mut self, path: &str) -> Result<Texture> {
        *self.loads.entry(path.to_string()).or_default() += 1;
        if self.failing_paths.contains(path) {
            return Err(Error::ImageLoad {
                path: path.to_string(),
                reason: "no such file".to_string(),
            });
        }
        let (width, height) = self.sizes.get(path).copied().unwrap_or(DEFAULT_IMAGE_SIZE);
        Ok(self.mint(path, width, height))
    }

    fn render_text(&mut self, text: &str, _colour: Colour) -> Result<Texture> {
        let width = GLYPH_SIZE.0 * text.chars().count() as i32;
        Ok(self.mint(text, width, GLYPH_SIZE.1))
    }

    fn copy_ex(&mut self, texture: Texture, src: Rect, dst: Rect, flip: Flip) -> Result<()> {
        if self.fail_copies {
            return Err(Error::Draw("copy rejected".to_string()));
        }
        self.calls.push(DrawCall::Copy {
            texture,
            src,
            dst: self.offsets.apply(dst),
            flip,
        });
        Ok(())
    }

    fn push_offset(&mut self, dx: i32, dy: i32) {
        self.offsets.push(dx, dy);
    }

    fn pop_offset(&mut self) {
        self.offsets.pop();
    }

    fn reset_offset(&mut self) {
        self.offsets.reset();
    }

    fn clear(&mut self) -> Result<()> {
        self.calls.push(DrawCall::Clear);
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.calls.push(DrawCall::Present);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_failure_is_reported() {
        let mut r = RecordingRenderer::new();
        r.fail_on("assets/missing.png");
        let err = r.load_image("assets/missing.png").unwrap_err();
        assert!(matches!(err, Error::ImageLoad { .. }));
        assert_eq!(r.load_count("assets/missing.png"), 1);
    }

    #[test]
    fn test_text_size_follows_length() {
        let mut r = RecordingRenderer::new();
        let tex = r.render_text("Start", Colour::BLACK).unwrap();
        assert_eq!((tex.width(), tex.height()), (40, 16));
        assert_eq!(r.texture_name(tex), Some("Start"));
    }

    #[test]
    fn test_configured_image_size() {
        let mut r = RecordingRenderer::new().with_image_size("assets/door.png", 256, 64);
        let tex = r.load_image("assets/door.png").unwrap();
        assert_eq!(tex.bounds(), Rect::new(0, 0, 256, 64));
    }
}
