//! Terminal renderer: rasterises texture copies into a character grid.
//!
//! Each terminal cell stands for a `cell_width` x `cell_height` block of
//! pixels. Image copies fill their destination cells with the image's glyph;
//! text copies print their graphemes starting at the destination's top-left
//! cell. A frame is flushed with one write per row.

use super::{Colour, Flip, OffsetStack, Renderer, Texture};
use crate::error::Result;
use crate::layout::Rect;
use crossterm::{cursor::MoveTo, queue, style::Print};
use std::collections::HashMap;
use std::io::Write;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Configuration for the terminal renderer.
#[derive(Debug, Clone)]
pub struct TerminalConfig {
    /// Pixels per cell horizontally.
    pub cell_width: i32,
    /// Pixels per cell vertically.
    pub cell_height: i32,
    /// Image sizes and glyphs by asset path.
    pub images: HashMap<String, (char, i32, i32)>,
    /// Size used for unknown images.
    pub default_image_size: (i32, i32),
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            cell_width: 8,
            cell_height: 16,
            images: HashMap::new(),
            default_image_size: (32, 32),
        }
    }
}

impl TerminalConfig {
    /// Register the glyph and full pixel size of an image.
    #[must_use]
    pub fn with_image(mut self, path: &str, glyph: char, width: i32, height: i32) -> Self {
        self.images.insert(path.to_string(), (glyph, width, height));
        self
    }
}

#[derive(Debug)]
enum Surface {
    Image(char),
    Text(String),
}

/// A [`Renderer`] writing to a terminal through crossterm.
pub struct TerminalRenderer<W: Write> {
    out: W,
    config: TerminalConfig,
    cols: u16,
    rows: u16,
    /// Row-major cell contents. An empty string marks the second column of a
    /// wide grapheme.
    cells: Vec<String>,
    surfaces: Vec<Surface>,
    offsets: OffsetStack,
}

impl<W: Write> TerminalRenderer<W> {
    /// Create a renderer for a `cols` x `rows` terminal.
    pub fn new(out: W, cols: u16, rows: u16, config: TerminalConfig) -> Self {
        let size = usize::from(cols) * usize::from(rows);
        Self {
            out,
            config,
            cols,
            rows,
            cells: vec![" ".to_string(); size],
            surfaces: Vec::new(),
            offsets: OffsetStack::new(),
        }
    }

    /// The output sink.
    pub const fn writer(&self) -> &W {
        &self.out
    }

    /// Consume the renderer and return the output sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Text of one grid row, as it will be flushed.
    pub fn row_text(&self, row: u16) -> String {
        if row >= self.rows {
            return String::new();
        }
        let start = usize::from(row) * usize::from(self.cols);
        self.cells[start..start + usize::from(self.cols)].concat()
    }

    fn index_of(&self, col: i32, row: i32) -> Option<usize> {
        let (cols, rows) = (i32::from(self.cols), i32::from(self.rows));
        if col < 0 || row < 0 || col >= cols || row >= rows {
            return None;
        }
        Some((row * cols + col) as usize)
    }

    fn set(&mut self, col: i32, row: i32, grapheme: &str) {
        if let Some(i) = self.index_of(col, row) {
            self.cells[i] = grapheme.to_string();
        }
    }

    fn mint(&mut self, surface: Surface, width: i32, height: i32) -> Texture {
        let id = self.surfaces.len() as u32;
        self.surfaces.push(surface);
        Texture::new(id, width, height)
    }

    fn fill(&mut self, dst: Rect, glyph: char) {
        let (cw, ch) = (self.config.cell_width, self.config.cell_height);
        let col0 = dst.x.div_euclid(cw);
        let row0 = dst.y.div_euclid(ch);
        let col1 = (dst.right() + cw - 1).div_euclid(cw);
        let row1 = (dst.bottom() + ch - 1).div_euclid(ch);
        let mut buf = [0u8; 4];
        let glyph = glyph.encode_utf8(&mut buf);
        for row in row0..row1 {
            for col in col0..col1 {
                self.set(col, row, glyph);
            }
        }
    }

    fn print(&mut self, dst: Rect, text: &str) {
        let row = dst.y.div_euclid(self.config.cell_height);
        let mut col = dst.x.div_euclid(self.config.cell_width);
        for grapheme in text.graphemes(true) {
            let width = grapheme.width() as i32;
            if width == 0 {
                continue;
            }
            self.set(col, row, grapheme);
            for extra in 1..width {
                self.set(col + extra, row, "");
            }
            col += width;
        }
    }
}

/// Mirror a glyph left to right where a mirrored form exists.
const fn mirror(glyph: char) -> char {
    match glyph {
        '<' => '>',
        '>' => '<',
        '(' => ')',
        ')' => '(',
        '/' => '\\',
        '\\' => '/',
        '[' => ']',
        ']' => '[',
        other => other,
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn load_image(&mut self, path: &str) -> Result<Texture> {
        let (glyph, width, height) = self.config.images.get(path).copied().unwrap_or_else(|| {
            let stem = path.rsplit('/').next().unwrap_or(path);
            let glyph = stem
                .chars()
                .find(char::is_ascii_alphanumeric)
                .map_or('#', |c| c.to_ascii_uppercase());
            let (w, h) = self.config.default_image_size;
            (glyph, w, h)
        });
        Ok(self.mint(Surface::Image(glyph), width, height))
    }

    fn render_text(&mut self, text: &str, _colour: Colour) -> Result<Texture> {
        let width = text.width() as i32 * self.config.cell_width;
        let height = self.config.cell_height;
        Ok(self.mint(Surface::Text(text.to_string()), width, height))
    }

    fn copy_ex(&mut self, texture: Texture, _src: Rect, dst: Rect, flip: Flip) -> Result<()> {
        let dst = self.offsets.apply(dst);
        match self.surfaces.get(texture.id() as usize) {
            Some(Surface::Image(glyph)) => {
                let glyph = if flip.contains(Flip::HORIZONTAL) {
                    mirror(*glyph)
                } else {
                    *glyph
                };
                self.fill(dst, glyph);
            }
            Some(Surface::Text(text)) => {
                let text = text.clone();
                self.print(dst, &text);
            }
            None => {}
        }
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
        for cell in &mut self.cells {
            cell.clear();
            cell.push(' ');
        }
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        for row in 0..self.rows {
            let line = self.row_text(row);
            queue!(self.out, MoveTo(0, row), Print(line))?;
        }
        self.out.flush()?;
        Ok(())
    }
}
