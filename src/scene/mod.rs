//! Scene graph: drawable nodes composed into trees.
//!
//! A [`Group`] owns its children and draws them in the order returned by
//! [`draw_order`]. Entities fake depth by converting their `z` into a
//! vertical offset with [`project`]; there is no depth sort. Both policies
//! live here so that actors never encode draw ordering themselves.
//!
//! Coordinate transforms go through [`OffsetGuard`](crate::render::OffsetGuard),
//! which pops on every exit path.

mod label;
mod sprite;

pub use label::Label;
pub use sprite::{Sprite, SpriteTemplate, TemplateLibrary};

use crate::error::Result;
use crate::render::Renderer;

/// A child slot. `None` is an absent node: never drawn, never destroyed.
pub type Child = Option<Box<dyn Node>>;

/// Something that can be drawn each frame.
pub trait Node {
    /// Draw relative to the renderer's current offset.
    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<()>;

    /// Release resources and stop any life loop. Must be safe to call twice.
    fn destroy(&mut self) {}

    /// Child slots, for composite nodes.
    fn children(&self) -> &[Child] {
        &[]
    }
}

/// Screen-space offset of a point at depth `z`.
///
/// Depth shears the point downwards by `z`, which together with
/// insertion-order drawing approximates back-to-front painting.
#[inline]
pub const fn project(x: i32, y: i32, z: i32) -> (i32, i32) {
    (x, y + z)
}

/// Indices of `children` in the order they are painted.
///
/// Currently insertion order.
pub fn draw_order(children: &[Child]) -> Vec<usize> {
    (0..children.len()).collect()
}

/// A composite node owning an ordered list of children.
#[derive(Default)]
pub struct Group {
    children: Vec<Child>,
    /// Skip drawing while set.
    pub invisible: bool,
}

impl Group {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child.
    pub fn add_child(&mut self, node: impl Node + 'static) {
        self.children.push(Some(Box::new(node)));
    }

    /// Append a possibly absent child.
    pub fn add_slot(&mut self, node: Child) {
        self.children.push(node);
    }

    /// Number of slots, absent ones included.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the group has no slots.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Node for Group {
    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        if self.invisible {
            return Ok(());
        }
        for index in draw_order(&self.children) {
            if let Some(child) = self.children[index].as_mut() {
                child.draw(renderer)?;
            }
        }
        Ok(())
    }

    /// Destroys each child once; the group is empty afterwards.
    fn destroy(&mut self) {
        for mut child in self.children.drain(..).flatten() {
            child.destroy();
        }
    }

    fn children(&self) -> &[Child] {
        &self.children
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("children", &self.children.len())
            .field("invisible", &self.invisible)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::layout::Rect;
    use crate::render::{OffsetGuard, RecordingRenderer};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Draws a fixed texture at its position and counts destroys.
    struct Probe {
        name: &'static str,
        at: (i32, i32),
        destroyed: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Probe {
        fn new(name: &'static str, at: (i32, i32), destroyed: &Arc<AtomicUsize>) -> Self {
            Self { name, at, destroyed: destroyed.clone(), fail: false }
        }
    }

    impl Node for Probe {
        fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
            if self.fail {
                return Err(Error::Draw(self.name.to_string()));
            }
            let tex = renderer.load_image(self.name)?;
            renderer.copy(tex, tex.bounds(), Rect::new(self.at.0, self.at.1, 1, 1))
        }

        fn destroy(&mut self) {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_absent_child_is_skipped() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let mut group = Group::new();
        group.add_child(Probe::new("a", (0, 0), &destroyed));
        group.add_slot(None);
        group.add_child(Probe::new("b", (1, 1), &destroyed));

        let mut r = RecordingRenderer::new();
        group.draw(&mut r).unwrap();
        let names: Vec<_> = r.copies().map(|(t, _, _)| r.texture_name(t).unwrap().to_string()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(group.len(), 3);
    }

    #[test]
    fn test_destroy_releases_each_child_once() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let mut inner = Group::new();
        inner.add_child(Probe::new("c", (0, 0), &destroyed));
        let mut group = Group::new();
        group.add_child(Probe::new("a", (0, 0), &destroyed));
        group.add_slot(None);
        group.add_child(inner);

        group.destroy();
        group.destroy();
        assert_eq!(destroyed.load(Ordering::SeqCst), 2);
        assert!(group.is_empty());
    }

    #[test]
    fn test_children_drawn_in_insertion_order_with_offsets() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let mut group = Group::new();
        group.add_child(Probe::new("back", (0, 10), &destroyed));
        group.add_child(Probe::new("front", (0, 5), &destroyed));

        let mut r = RecordingRenderer::new();
        {
            let mut shifted = OffsetGuard::push(&mut r as &mut dyn Renderer, 100, 0);
            group.draw(&mut *shifted).unwrap();
        }
        let xs: Vec<_> = r.copies().map(|(_, dst, _)| (dst.x, dst.y)).collect();
        assert_eq!(xs, [(100, 10), (100, 5)]);
        assert_eq!(r.offset_depth(), 0);
    }

    #[test]
    fn test_failing_child_aborts_draw() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let mut bad = Probe::new("bad", (0, 0), &destroyed);
        bad.fail = true;
        let mut group = Group::new();
        group.add_child(bad);
        group.add_child(Probe::new("never", (0, 0), &destroyed));

        let mut r = RecordingRenderer::new();
        assert!(group.draw(&mut r).is_err());
        assert_eq!(r.copies().count(), 0);
    }

    #[test]
    fn test_invisible_group_draws_nothing() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let mut group = Group::new();
        group.add_child(Probe::new("a", (0, 0), &destroyed));
        group.invisible = true;
        let mut r = RecordingRenderer::new();
        group.draw(&mut r).unwrap();
        assert_eq!(r.copies().count(), 0);
    }

    #[test]
    fn test_project_shears_by_depth() {
        assert_eq!(project(10, 20, 32), (10, 52));
        assert_eq!(draw_order(&[None, None, None]), vec![0, 1, 2]);
    }
}
