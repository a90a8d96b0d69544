use std::fmt::Write;

use nu_ansi_term::{Color, Style};

use super::grid::LOWER_HALF_BLOCK;

/// Turns quantized cells into terminal text.
pub trait GlyphStyle {
    /// Appends a half block whose upper half is `top` and lower half is `bottom`.
    fn half_block(&self, out: &mut String, top: [u8; 3], bottom: [u8; 3]);

    /// Appends a default-styled space.
    fn blank(&self, out: &mut String);
}

/// 24-bit color escape sequences, no palette reduction.
#[derive(Clone, Copy, Debug, Default)]
pub struct TruecolorStyle;

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::Rgb(r, g, b)
}

impl GlyphStyle for TruecolorStyle {
    fn half_block(&self, out: &mut String, top: [u8; 3], bottom: [u8; 3]) {
        let style = Style::new().on(rgb(top)).fg(rgb(bottom));
        let _ = write!(out, "{}", style.paint(LOWER_HALF_BLOCK.to_string()));
    }

    fn blank(&self, out: &mut String) {
        let _ = write!(out, "{}", Style::default().paint(" "));
    }
}
