//! Camera: keeps a tracked point inside a dead zone of the view rectangle.

use super::Rect;

/// A view rectangle moving inside a larger world rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldView {
    view: Rect,
    world: Rect,
}

impl WorldView {
    /// Create a view over the given world. The view is not clamped until the
    /// first [`focus`](Self::focus).
    pub const fn new(view: Rect, world: Rect) -> Self {
        Self { view, world }
    }

    /// The current view rectangle in world coordinates.
    #[inline]
    pub const fn view(&self) -> Rect {
        self.view
    }

    /// The world rectangle.
    #[inline]
    pub const fn world(&self) -> Rect {
        self.world
    }

    /// Move the view so that `(x, y)` lies inside the central dead zone.
    ///
    /// The dead zone spans 1/4 to 3/4 of the view on each axis. The view snaps
    /// by exactly the distance needed to put the point back on the zone
    /// boundary, then is clamped to the world. When the world is smaller than
    /// the view on an axis, the upper clamp wins on that axis.
    pub fn focus(&mut self, x: i32, y: i32) {
        let v = &mut self.view;
        let w = &self.world;

        let (left, right) = (v.width / 4, 3 * v.width / 4);
        if x - v.x > right {
            v.x = x - right;
        }
        if x - v.x < left {
            v.x = x - left;
        }
        if v.x < w.x {
            v.x = w.x;
        }
        if v.right() > w.right() {
            v.x = w.right() - v.width;
        }

        let (top, bottom) = (v.height / 4, 3 * v.height / 4);
        if y - v.y < top {
            v.y = y - top;
        }
        if y - v.y > bottom {
            v.y = y - bottom;
        }
        if v.y < w.y {
            v.y = w.y;
        }
        if v.bottom() > w.bottom() {
            v.y = w.bottom() - v.height;
        }
    }
}
