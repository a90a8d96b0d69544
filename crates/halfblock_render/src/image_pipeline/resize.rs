use std::fmt;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use tracing::debug;

use super::loader::PixelGrid;
use crate::terminal::TerminalSize;
use crate::RenderError;

/// A requested width or height: an absolute cell count or a share of the terminal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DimensionValue {
    Cells(u32),
    /// Percentage in the range (0, 100].
    Percent(f64),
}

impl DimensionValue {
    pub fn cells(cells: u32) -> Result<Self, RenderError> {
        if cells == 0 {
            return Err(RenderError::InvalidDimension(cells.to_string()));
        }
        Ok(DimensionValue::Cells(cells))
    }

    pub fn percent(percent: f64) -> Result<Self, RenderError> {
        if !percent.is_finite() || percent <= 0.0 || percent > 100.0 {
            return Err(RenderError::InvalidDimension(format!("{percent}%")));
        }
        Ok(DimensionValue::Percent(percent))
    }

    /// Resolves the value against `base` cells. Percentages are floored.
    pub fn resolve(&self, base: u32) -> u32 {
        match *self {
            DimensionValue::Cells(cells) => cells,
            DimensionValue::Percent(percent) => (percent / 100.0 * f64::from(base)).floor() as u32,
        }
    }
}

impl FromStr for DimensionValue {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RenderError::InvalidDimension(s.to_owned());
        let trimmed = s.trim();

        match trimmed.strip_suffix('%') {
            Some(number) => {
                let percent = number.trim().parse::<f64>().map_err(|_| invalid())?;
                DimensionValue::percent(percent).map_err(|_| invalid())
            },
            None => {
                let cells = trimmed.parse::<u32>().map_err(|_| invalid())?;
                DimensionValue::cells(cells).map_err(|_| invalid())
            },
        }
    }
}

impl fmt::Display for DimensionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionValue::Cells(cells) => write!(f, "{cells}"),
            DimensionValue::Percent(percent) => write!(f, "{percent}%"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DimensionRequest {
    pub width: Option<DimensionValue>,
    pub height: Option<DimensionValue>,
    pub preserve_aspect_ratio: bool,
}

/// Pixel size the image is resized to before quantization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    /// Number of text lines the quantizer produces for this size.
    pub fn lines(&self) -> u32 {
        self.height / 2
    }
}

/// Uniformly scales `natural` so it fits inside the box, limited by the tighter side.
pub fn best_fit(
    box_width: f64,
    box_height: f64,
    natural_width: f64,
    natural_height: f64,
) -> (f64, f64) {
    let natural_ratio = natural_width / natural_height;
    let factor = if box_width / box_height > natural_ratio {
        box_height / natural_height
    } else {
        box_width / natural_width
    };

    (factor * natural_width, factor * natural_height)
}

/// Computes the pixel size the image must be resized to.
///
/// Widths map one pixel per column. Heights given in rows are doubled, since every text
/// row carries two pixel rows.
pub fn resolve(
    image_width: u32,
    image_height: u32,
    request: &DimensionRequest,
    terminal: TerminalSize,
) -> Result<TargetSize, RenderError> {
    if image_width == 0 || image_height == 0 {
        return Err(RenderError::EmptyImage { width: image_width, height: image_height });
    }

    let columns = terminal.column_budget();
    let rows = terminal.row_budget();
    let box_width = f64::from(columns);
    let box_height = f64::from(rows) * 2.0;
    let natural_width = f64::from(image_width);
    let natural_height = f64::from(image_height);

    let (mut width, mut height) = match (request.width, request.height) {
        (Some(width), Some(height)) => {
            let width = f64::from(width.resolve(columns));
            let height = f64::from(height.resolve(rows)) * 2.0;
            if request.preserve_aspect_ratio {
                best_fit(width, height, natural_width, natural_height)
            } else {
                (width, height)
            }
        },
        (Some(width), None) => {
            let width = f64::from(width.resolve(columns));
            (width, natural_height * width / natural_width)
        },
        (None, Some(height)) => {
            let height = f64::from(height.resolve(rows)) * 2.0;
            (natural_width * height / natural_height, height)
        },
        (None, None) => best_fit(box_width, box_height, natural_width, natural_height),
    };

    if width > box_width {
        (width, height) = best_fit(box_width, box_height, width, height);
    }

    let target = TargetSize { width: round_pixels(width), height: round_pixels(height) };
    debug!(
        "resolved {image_width}x{image_height} to {}x{} within {columns}x{rows} cells",
        target.width, target.height
    );

    Ok(target)
}

fn round_pixels(value: f64) -> u32 {
    if value.is_finite() {
        (value.round() as u32).max(1)
    } else {
        1
    }
}

/// Resamples the grid to exactly the target size.
pub fn resize(grid: &PixelGrid, target: TargetSize, filter: FilterType) -> PixelGrid {
    if grid.dimensions() == (target.width, target.height) {
        return grid.clone();
    }

    imageops::resize(grid, target.width, target.height, filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TERMINAL: TerminalSize = TerminalSize { columns: 80, rows: 26 };

    fn request(width: Option<&str>, height: Option<&str>, preserve: bool) -> DimensionRequest {
        DimensionRequest {
            width: width.map(|w| w.parse().unwrap()),
            height: height.map(|h| h.parse().unwrap()),
            preserve_aspect_ratio: preserve,
        }
    }

    #[test]
    fn percentages_floor_against_base() {
        assert_eq!("50%".parse::<DimensionValue>().unwrap().resolve(80), 40);
        assert_eq!("100%".parse::<DimensionValue>().unwrap().resolve(24), 24);
        assert_eq!("33%".parse::<DimensionValue>().unwrap().resolve(10), 3);
        assert_eq!("12.5%".parse::<DimensionValue>().unwrap().resolve(80), 10);
    }

    #[test]
    fn out_of_range_percentages_are_rejected() {
        for text in ["0%", "101%", "-5%", "NaN%", "inf%", "%", "abc%"] {
            let err = text.parse::<DimensionValue>().unwrap_err();
            assert!(matches!(err, RenderError::InvalidDimension(ref value) if value == text));
        }
    }

    #[test]
    fn cell_counts_must_be_positive_integers() {
        assert_eq!("40".parse::<DimensionValue>().unwrap(), DimensionValue::Cells(40));
        assert!("0".parse::<DimensionValue>().is_err());
        assert!("-3".parse::<DimensionValue>().is_err());
        assert!("4.5".parse::<DimensionValue>().is_err());
        assert!("wide".parse::<DimensionValue>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for text in ["40", "50%", "12.5%"] {
            let value: DimensionValue = text.parse().unwrap();
            assert_eq!(value.to_string(), text);
        }
    }

    #[test]
    fn best_fit_picks_limiting_side() {
        let close = |(w, h): (f64, f64), (ew, eh): (f64, f64)| {
            (w - ew).abs() < 1e-9 && (h - eh).abs() < 1e-9
        };
        assert!(close(best_fit(80.0, 48.0, 200.0, 100.0), (80.0, 40.0)));
        assert!(close(best_fit(80.0, 48.0, 100.0, 200.0), (24.0, 48.0)));
    }

    #[test]
    fn width_only_locks_aspect() {
        let target =
            resolve(200, 100, &request(Some("50"), None, false), TERMINAL).unwrap();
        assert_eq!(target, TargetSize { width: 50, height: 25 });
    }

    #[test]
    fn height_only_doubles_rows_and_locks_aspect() {
        let target =
            resolve(200, 100, &request(None, Some("10"), false), TERMINAL).unwrap();
        assert_eq!(target, TargetSize { width: 40, height: 20 });
    }

    #[test]
    fn height_percentage_uses_row_budget() {
        // 26 rows minus the offset leaves 24; half of that is 12 rows, 24 pixels.
        let target =
            resolve(100, 100, &request(None, Some("50%"), false), TERMINAL).unwrap();
        assert_eq!(target, TargetSize { width: 24, height: 24 });
    }

    #[test]
    fn both_given_without_preservation_stretches() {
        let target =
            resolve(200, 100, &request(Some("30"), Some("20"), false), TERMINAL).unwrap();
        assert_eq!(target, TargetSize { width: 30, height: 40 });
    }

    #[test]
    fn both_given_with_preservation_fits_inside_box() {
        let target =
            resolve(200, 100, &request(Some("30"), Some("20"), true), TERMINAL).unwrap();
        assert_eq!(target, TargetSize { width: 30, height: 15 });
    }

    #[test]
    fn neither_given_fills_terminal() {
        let target = resolve(1000, 500, &DimensionRequest::default(), TERMINAL).unwrap();
        assert_eq!(target, TargetSize { width: 80, height: 40 });

        let tall = resolve(500, 1000, &DimensionRequest::default(), TERMINAL).unwrap();
        assert_eq!(tall, TargetSize { width: 24, height: 48 });
    }

    #[test]
    fn overflowing_width_is_clamped_to_columns() {
        let target =
            resolve(200, 100, &request(Some("500"), None, false), TERMINAL).unwrap();
        assert_eq!(target.width, 80);
        assert!(target.height <= 48);
    }

    #[test]
    fn tiny_results_never_round_to_zero() {
        let target = resolve(1, 1000, &request(Some("1"), None, false), TERMINAL).unwrap();
        assert_eq!(target.width, 1);
        assert_eq!(target.height, 1000);

        let target = resolve(1000, 1, &request(Some("1%"), None, false), TERMINAL).unwrap();
        assert_eq!(target, TargetSize { width: 1, height: 1 });
    }

    #[test]
    fn empty_images_are_rejected() {
        let err = resolve(0, 10, &DimensionRequest::default(), TERMINAL).unwrap_err();
        assert!(matches!(err, RenderError::EmptyImage { width: 0, height: 10 }));
    }

    #[test]
    fn resize_hits_target_exactly() {
        let grid = PixelGrid::from_pixel(10, 7, image::Rgba([1, 2, 3, 255]));
        let resized = resize(&grid, TargetSize { width: 4, height: 3 }, FilterType::Triangle);
        assert_eq!(resized.dimensions(), (4, 3));
        assert_eq!(resized.get_pixel(0, 0), &image::Rgba([1, 2, 3, 255]));
    }
}
