//! Rendered text.

use super::Node;
use crate::error::Result;
use crate::layout::Rect;
use crate::render::{Colour, Renderer, Texture};

/// A string rendered once to a texture and drawn at a position.
#[derive(Debug, Clone)]
pub struct Label {
    text: String,
    texture: Option<Texture>,
    /// X position.
    pub x: i32,
    /// Y position.
    pub y: i32,
}

impl Label {
    /// Render `text` in `colour`. Fails if the renderer cannot render text.
    pub fn new(renderer: &mut dyn Renderer, text: &str, colour: Colour) -> Result<Self> {
        let texture = renderer.render_text(text, colour)?;
        Ok(Self {
            text: text.to_string(),
            texture: Some(texture),
            x: 0,
            y: 0,
        })
    }

    /// The label's text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Pixel size of the rendered text, zero once destroyed.
    pub fn size(&self) -> (i32, i32) {
        self.texture.map_or((0, 0), |t| (t.width(), t.height()))
    }
}

impl Node for Label {
    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        let Some(texture) = self.texture else {
            return Ok(());
        };
        renderer.copy(
            texture,
            texture.bounds(),
            Rect::new(self.x, self.y, texture.width(), texture.height()),
        )
    }

    fn destroy(&mut self) {
        self.texture = None;
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "text: {:?}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingRenderer;

    #[test]
    fn test_label_draws_at_position() {
        let mut r = RecordingRenderer::new();
        let mut label = Label::new(&mut r, "Quit", Colour::BLACK).unwrap();
        label.x = 5;
        label.y = 7;
        label.draw(&mut r).unwrap();
        let (_, dst, _) = r.copies().next().unwrap();
        assert_eq!(dst, Rect::new(5, 7, 32, 16));
        assert_eq!(label.to_string(), "text: \"Quit\"");
    }

    #[test]
    fn test_destroyed_label_draws_nothing() {
        let mut r = RecordingRenderer::new();
        let mut label = Label::new(&mut r, "Quit", Colour::BLACK).unwrap();
        label.destroy();
        label.destroy();
        label.draw(&mut r).unwrap();
        assert_eq!(r.copies().count(), 0);
        assert_eq!(label.size(), (0, 0));
    }
}
