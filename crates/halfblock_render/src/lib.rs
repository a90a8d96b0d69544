mod glyph;
mod image_pipeline;
mod terminal;

use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

pub use glyph::{
    grid::{CellGlyph, GlyphGrid, LOWER_HALF_BLOCK},
    mapping::{quantize, quantize_grid},
    style::{GlyphStyle, TruecolorStyle},
};
pub use image_pipeline::{
    loader::{decode, PixelGrid, RawImage},
    resize::{best_fit, resize, resolve, DimensionRequest, DimensionValue, TargetSize},
};
pub use terminal::{CrosstermTerminal, TerminalSize, TerminalSizeSource, ROW_OFFSET};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("{0} is not a valid dimension value")]
    InvalidDimension(String),
    #[error("pixel buffer for {width}x{height} image holds {actual} bytes, expected {expected}")]
    PixelBuffer { width: u32, height: u32, expected: usize, actual: usize },
    #[error("cannot render an empty {width}x{height} image")]
    EmptyImage { width: u32, height: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    /// Requested width in columns, or a percentage of the terminal width.
    pub width: Option<DimensionValue>,
    /// Requested height in rows, or a percentage of the usable terminal rows.
    pub height: Option<DimensionValue>,
    /// Fit inside the requested box instead of stretching when both sides are given.
    pub preserve_aspect_ratio: bool,
    /// Resampling filter used for the resize.
    pub filter: FilterType,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            preserve_aspect_ratio: false,
            filter: FilterType::Triangle,
        }
    }
}

impl RenderOptions {
    pub fn request(&self) -> DimensionRequest {
        DimensionRequest {
            width: self.width,
            height: self.height,
            preserve_aspect_ratio: self.preserve_aspect_ratio,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RenderedFrame {
    /// The image after resizing to the target size.
    pub image: PixelGrid,
    pub text: String,
}

impl RenderedFrame {
    pub fn target(&self) -> TargetSize {
        let (width, height) = self.image.dimensions();
        TargetSize { width, height }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.text.lines()
    }
}

/// Renders images as half-block text sized for the terminal.
///
/// The terminal size is read from `terminal` on every call.
#[derive(Clone, Debug, Default)]
pub struct BlockRenderer<T = CrosstermTerminal, S = TruecolorStyle> {
    terminal: T,
    style: S,
}

impl BlockRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: TerminalSizeSource, S: GlyphStyle> BlockRenderer<T, S> {
    pub fn with_parts(terminal: T, style: S) -> Self {
        Self { terminal, style }
    }

    pub fn with_terminal<U: TerminalSizeSource>(self, terminal: U) -> BlockRenderer<U, S> {
        BlockRenderer { terminal, style: self.style }
    }

    pub fn with_style<U: GlyphStyle>(self, style: U) -> BlockRenderer<T, U> {
        BlockRenderer { terminal: self.terminal, style }
    }

    /// Renders caller-owned RGBA pixels.
    pub fn render(
        &self,
        image: RawImage,
        options: &RenderOptions,
    ) -> Result<RenderedFrame, RenderError> {
        let grid = image.into_grid()?;
        self.render_grid(&grid, options)
    }

    /// Decodes encoded image bytes, then renders them.
    pub fn render_bytes(
        &self,
        bytes: &[u8],
        options: &RenderOptions,
    ) -> Result<RenderedFrame, RenderError> {
        let grid = decode(bytes)?;
        self.render_grid(&grid, options)
    }

    pub fn render_path<P: AsRef<Path>>(
        &self,
        path: P,
        options: &RenderOptions,
    ) -> Result<RenderedFrame, RenderError> {
        let grid = image_pipeline::loader::open(path)?;
        self.render_grid(&grid, options)
    }

    pub fn render_image(
        &self,
        image: DynamicImage,
        options: &RenderOptions,
    ) -> Result<RenderedFrame, RenderError> {
        let grid = image_pipeline::loader::from_dynamic(image);
        self.render_grid(&grid, options)
    }

    pub fn render_grid(
        &self,
        grid: &PixelGrid,
        options: &RenderOptions,
    ) -> Result<RenderedFrame, RenderError> {
        let terminal = self.terminal.current_size();
        debug!("rendering for terminal {}x{}", terminal.columns, terminal.rows);

        let (width, height) = grid.dimensions();
        let target = resolve(width, height, &options.request(), terminal)?;
        let image = resize(grid, target, options.filter);
        let text = quantize(&image, &self.style);

        Ok(RenderedFrame { image, text })
    }
}
