//! Renderer capability consumed by the compositor.
//!
//! The runtime never talks to a graphics API directly. Everything it needs
//! is the [`Renderer`] trait: load an image, render a text string, copy a
//! region of a texture to a target rectangle, and keep a stack of
//! coordinate offsets. Two implementations ship with the crate:
//!
//! - [`RecordingRenderer`]: headless, records every draw call in absolute
//!   coordinates. Used by tests and for dry runs.
//! - [`TerminalRenderer`]: rasterises copies into a character grid and
//!   flushes it through crossterm.
//!
//! All rendering happens on one thread. Actors never hold a renderer.

mod recording;
mod terminal;

pub use recording::{DrawCall, RecordingRenderer};
pub use terminal::{TerminalConfig, TerminalRenderer};

use crate::error::Result;
use crate::layout::Rect;
use bitflags::bitflags;
use std::ops::{Deref, DerefMut};
use tracing::warn;

/// RGBA colour.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Colour {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Colour {
    /// Create an opaque colour.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(0xFF, 0xFF, 0xFF);
}

impl std::fmt::Debug for Colour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

bitflags! {
    /// Mirroring applied by [`Renderer::copy_ex`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flip: u8 {
        /// Mirror left to right.
        const HORIZONTAL = 0b01;
    }
}

/// Opaque handle to a texture owned by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Texture {
    id: u32,
    width: i32,
    height: i32,
}

impl Texture {
    /// Create a handle. Only renderers mint these.
    pub const fn new(id: u32, width: i32, height: i32) -> Self {
        Self { id, width, height }
    }

    /// Renderer-specific id.
    #[inline]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Pixel width of the whole texture.
    #[inline]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Pixel height of the whole texture.
    #[inline]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// The full texture as a source rectangle.
    #[inline]
    pub const fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }
}

/// The drawing capability the compositor needs.
pub trait Renderer {
    /// Load an image by asset path.
    fn load_image(&mut self, path: &str) -> Result<Texture>;

    /// Render a string to a texture. The texture carries the pixel size.
    fn render_text(&mut self, text: &str, colour: Colour) -> Result<Texture>;

    /// Copy `src` of `texture` to `dst`, relative to the current offset.
    fn copy_ex(&mut self, texture: Texture, src: Rect, dst: Rect, flip: Flip) -> Result<()>;

    /// Copy without mirroring.
    fn copy(&mut self, texture: Texture, src: Rect, dst: Rect) -> Result<()> {
        self.copy_ex(texture, src, dst, Flip::empty())
    }

    /// Copy mirrored left to right.
    fn copy_flipped_horizontal(&mut self, texture: Texture, src: Rect, dst: Rect) -> Result<()> {
        self.copy_ex(texture, src, dst, Flip::HORIZONTAL)
    }

    /// Push an offset on top of the current one.
    fn push_offset(&mut self, dx: i32, dy: i32);

    /// Undo the most recent push.
    fn pop_offset(&mut self);

    /// Drop every pushed offset.
    fn reset_offset(&mut self);

    /// Clear the target.
    fn clear(&mut self) -> Result<()>;

    /// Show what has been drawn since the last clear.
    fn present(&mut self) -> Result<()>;
}

/// A cumulative stack of coordinate offsets.
///
/// Renderer implementations embed one of these and apply
/// [`current`](Self::current) to every destination rectangle.
#[derive(Debug, Clone, Default)]
pub struct OffsetStack {
    stack: Vec<(i32, i32)>,
    current: (i32, i32),
}

impl OffsetStack {
    /// Create an empty stack.
    pub const fn new() -> Self {
        Self {
            stack: Vec::new(),
            current: (0, 0),
        }
    }

    /// Push a relative offset.
    pub fn push(&mut self, dx: i32, dy: i32) {
        self.stack.push(self.current);
        self.current = (self.current.0 + dx, self.current.1 + dy);
    }

    /// Restore the offset active before the last push.
    pub fn pop(&mut self) {
        match self.stack.pop() {
            Some(previous) => self.current = previous,
            None => warn!("offset stack underflow"),
        }
    }

    /// Clear all pushes.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.current = (0, 0);
    }

    /// The accumulated offset.
    #[inline]
    pub const fn current(&self) -> (i32, i32) {
        self.current
    }

    /// Number of outstanding pushes.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Translate a rectangle by the accumulated offset.
    #[inline]
    pub const fn apply(&self, rect: Rect) -> Rect {
        rect.translate(self.current.0, self.current.1)
    }
}

/// Pushes an offset on creation and pops it when dropped.
///
/// Every exit path, including `?` returns, pops exactly once.
///
/// ```rust,ignore
/// let mut r = OffsetGuard::push(renderer, x, z);
/// shadow.draw(&mut *r)?;
/// ```
pub struct OffsetGuard<'a, R: Renderer + ?Sized> {
    renderer: &'a mut R,
}

impl<'a, R: Renderer + ?Sized> OffsetGuard<'a, R> {
    /// Push `(dx, dy)` onto `renderer`.
    pub fn push(renderer: &'a mut R, dx: i32, dy: i32) -> Self {
        renderer.push_offset(dx, dy);
        Self { renderer }
    }
}

impl<R: Renderer + ?Sized> Deref for OffsetGuard<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.renderer
    }
}

impl<R: Renderer + ?Sized> DerefMut for OffsetGuard<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        self.renderer
    }
}

impl<R: Renderer + ?Sized> Drop for OffsetGuard<'_, R> {
    fn drop(&mut self) {
        self.renderer.pop_offset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_offset_stack_is_cumulative() {
        let mut stack = OffsetStack::new();
        stack.push(10, 20);
        stack.push(-3, 4);
        assert_eq!(stack.current(), (7, 24));
        assert_eq!(stack.depth(), 2);
        stack.pop();
        assert_eq!(stack.current(), (10, 20));
        stack.reset();
        assert_eq!(stack.current(), (0, 0));
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_offset_stack_underflow_is_harmless() {
        let mut stack = OffsetStack::new();
        stack.pop();
        assert_eq!(stack.current(), (0, 0));
    }

    #[test]
    fn test_guard_pops_on_early_return() {
        fn failing(r: &mut dyn Renderer) -> Result<()> {
            let mut r = OffsetGuard::push(r, 5, 5);
            let _inner = OffsetGuard::push(&mut *r, 1, 1);
            Err(Error::Draw("boom".into()))
        }

        let mut renderer = RecordingRenderer::new();
        assert!(failing(&mut renderer).is_err());
        assert_eq!(renderer.offset_depth(), 0);
        assert_eq!(renderer.offset(), (0, 0));
    }

    #[test]
    fn test_guard_applies_offset_to_copies() {
        let mut renderer = RecordingRenderer::new();
        let tex = renderer.load_image("assets/orb.png").unwrap();
        {
            let mut r = OffsetGuard::push(&mut renderer, 100, 50);
            r.copy(tex, tex.bounds(), Rect::new(1, 2, 10, 10)).unwrap();
        }
        let copies: Vec<_> = renderer.copies().collect();
        assert_eq!(copies[0].1, Rect::new(101, 52, 10, 10));
    }
}
