use crossterm::tty::IsTty;
use tracing::debug;

/// Rows left free below the rendered block for the in-place redraw cursor.
pub const ROW_OFFSET: u16 = 2;

/// Row budget used when the terminal leaves no usable rows after the offset.
const FALLBACK_ROW_BUDGET: u32 = 24;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerminalSize {
    pub columns: u16,
    pub rows: u16,
}

impl TerminalSize {
    /// Used when stdout is not a terminal or reports no size. This leaves a 22 row
    /// budget, where the `rows - 2 || 24` form would have left 24.
    pub const FALLBACK: TerminalSize = TerminalSize { columns: 80, rows: 24 };

    pub fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows }
    }

    /// Columns available to the image, one pixel per column.
    pub fn column_budget(&self) -> u32 {
        if self.columns == 0 {
            u32::from(Self::FALLBACK.columns)
        } else {
            u32::from(self.columns)
        }
    }

    /// Text rows available to the image. Each row holds two pixel rows.
    pub fn row_budget(&self) -> u32 {
        match self.rows.checked_sub(ROW_OFFSET) {
            Some(rows) if rows > 0 => u32::from(rows),
            _ => FALLBACK_ROW_BUDGET,
        }
    }
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self::FALLBACK
    }
}

/// Source of the terminal dimensions, queried once per render.
pub trait TerminalSizeSource {
    fn current_size(&self) -> TerminalSize;
}

impl TerminalSizeSource for TerminalSize {
    fn current_size(&self) -> TerminalSize {
        *self
    }
}

/// Reads the size of the controlling terminal while stdout is attached to it.
#[derive(Clone, Copy, Debug)]
pub struct CrosstermTerminal {
    output_is_tty: fn() -> bool,
}

fn stdout_is_tty() -> bool {
    std::io::stdout().is_tty()
}

impl CrosstermTerminal {
    /// Uses `output_is_tty` instead of checking stdout.
    pub fn with_tty_check(output_is_tty: fn() -> bool) -> Self {
        Self { output_is_tty }
    }
}

impl Default for CrosstermTerminal {
    fn default() -> Self {
        Self { output_is_tty: stdout_is_tty }
    }
}

impl TerminalSizeSource for CrosstermTerminal {
    fn current_size(&self) -> TerminalSize {
        // Redirected output is not drawn on the terminal, so its size does not apply.
        if !(self.output_is_tty)() {
            debug!("stdout is not a terminal, using {:?}", TerminalSize::FALLBACK);
            return TerminalSize::FALLBACK;
        }

        match crossterm::terminal::size() {
            Ok((columns, rows)) if columns > 0 && rows > 0 => TerminalSize { columns, rows },
            Ok(_) => TerminalSize::FALLBACK,
            Err(err) => {
                debug!("terminal size unavailable, using {:?}: {err}", TerminalSize::FALLBACK);
                TerminalSize::FALLBACK
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_budget_reserves_offset() {
        assert_eq!(TerminalSize::new(80, 24).row_budget(), 22);
        assert_eq!(TerminalSize::new(120, 50).row_budget(), 48);
    }

    #[test]
    fn row_budget_falls_back_when_exhausted() {
        assert_eq!(TerminalSize::new(80, 2).row_budget(), 24);
        assert_eq!(TerminalSize::new(80, 1).row_budget(), 24);
        assert_eq!(TerminalSize::new(80, 0).row_budget(), 24);
    }

    #[test]
    fn zero_columns_use_fallback() {
        assert_eq!(TerminalSize::new(0, 24).column_budget(), 80);
    }

    #[test]
    fn redirected_output_uses_fallback() {
        let terminal = CrosstermTerminal::with_tty_check(|| false);
        assert_eq!(terminal.current_size(), TerminalSize::FALLBACK);
        assert_eq!(terminal.current_size().column_budget(), 80);
    }

    #[test]
    fn attached_output_reports_usable_size() {
        let size = CrosstermTerminal::with_tty_check(|| true).current_size();
        assert!(size.columns > 0 && size.rows > 0);
    }

    #[test]
    fn fixed_size_is_a_source() {
        let size = TerminalSize::new(33, 11);
        assert_eq!(size.current_size(), size);
    }
}
