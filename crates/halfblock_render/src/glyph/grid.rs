use super::style::GlyphStyle;

/// Lower half block: the upper half shows the cell background, the lower half the glyph.
pub const LOWER_HALF_BLOCK: char = '\u{2584}';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellGlyph {
    /// Unstyled space for a transparent top pixel.
    Blank,
    /// Two stacked pixels, colors encoded as RGB bytes.
    HalfBlock { top: [u8; 3], bottom: [u8; 3] },
}

impl CellGlyph {
    pub fn from_pair(top: [u8; 4], bottom: [u8; 4]) -> Self {
        // Transparency is binary and only the top pixel decides it.
        if top[3] == 0 {
            return CellGlyph::Blank;
        }

        CellGlyph::HalfBlock {
            top: [top[0], top[1], top[2]],
            bottom: [bottom[0], bottom[1], bottom[2]],
        }
    }

    pub fn ch(&self) -> char {
        match self {
            CellGlyph::Blank => ' ',
            CellGlyph::HalfBlock { .. } => LOWER_HALF_BLOCK,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphGrid {
    pub width: u32,
    pub height: u32,
    pub cells: Vec<CellGlyph>,
}

impl GlyphGrid {
    pub fn new(width: u32, height: u32, cells: Vec<CellGlyph>) -> Self {
        assert_eq!(width as usize * height as usize, cells.len());
        Self { width, height, cells }
    }

    pub fn cell(&self, column: u32, row: u32) -> Option<&CellGlyph> {
        if column >= self.width || row >= self.height {
            return None;
        }
        self.cells.get((row * self.width + column) as usize)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[CellGlyph]> + '_ {
        let width = self.width as usize;
        (0..self.height as usize).map(move |row| &self.cells[row * width..(row + 1) * width])
    }

    /// Unstyled glyph characters, one string per row.
    pub fn plain_rows(&self) -> impl Iterator<Item = String> + '_ {
        self.rows().map(|row| row.iter().map(CellGlyph::ch).collect())
    }

    /// Styles every cell and terminates every row with a newline.
    pub fn render<S: GlyphStyle + ?Sized>(&self, style: &S) -> String {
        let mut text = String::new();
        for row in self.rows() {
            for cell in row {
                match *cell {
                    CellGlyph::Blank => style.blank(&mut text),
                    CellGlyph::HalfBlock { top, bottom } => style.half_block(&mut text, top, bottom),
                }
            }
            text.push('\n');
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_top_ignores_bottom() {
        assert_eq!(CellGlyph::from_pair([9, 9, 9, 0], [255, 0, 0, 255]), CellGlyph::Blank);
    }

    #[test]
    fn bottom_alpha_is_ignored() {
        assert_eq!(
            CellGlyph::from_pair([1, 2, 3, 1], [4, 5, 6, 0]),
            CellGlyph::HalfBlock { top: [1, 2, 3], bottom: [4, 5, 6] }
        );
    }

    #[test]
    fn zero_width_grid_keeps_empty_rows() {
        let grid = GlyphGrid::new(0, 3, Vec::new());
        assert_eq!(grid.plain_rows().collect::<Vec<_>>(), vec!["", "", ""]);
        assert!(grid.cell(0, 0).is_none());
    }
}
