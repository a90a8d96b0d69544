use crate::image_pipeline::loader::PixelGrid;

use super::{
    grid::{CellGlyph, GlyphGrid},
    style::GlyphStyle,
};

/// Pairs pixel rows `(y, y + 1)` into one row of cells.
///
/// An odd final pixel row has no partner and is dropped.
pub fn quantize_grid(grid: &PixelGrid) -> GlyphGrid {
    let (width, height) = grid.dimensions();
    let rows = height / 2;
    let mut cells = Vec::with_capacity(width as usize * rows as usize);

    for y in (0..height.saturating_sub(1)).step_by(2) {
        for x in 0..width {
            let top = grid.get_pixel(x, y).0;
            let bottom = grid.get_pixel(x, y + 1).0;
            cells.push(CellGlyph::from_pair(top, bottom));
        }
    }

    GlyphGrid::new(width, rows, cells)
}

/// Quantizes and styles the grid into newline-terminated text.
pub fn quantize<S: GlyphStyle + ?Sized>(grid: &PixelGrid, style: &S) -> String {
    quantize_grid(grid).render(style)
}
