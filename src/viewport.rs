use glam::DVec2;

/// Fallback cell size in pixels when the terminal does not report one
pub const DEFAULT_CELL_WIDTH: f64 = 8.0;
pub const DEFAULT_CELL_HEIGHT: f64 = 16.0;

/// Terminal viewport: a grid of character cells, each covering a block of
/// screen pixels. Screen-space coordinates are pixels from the top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
    pub cell_width: f64,
    pub cell_height: f64,
}

impl Viewport {
    pub fn new(cols: u16, rows: u16) -> Self {
        Viewport {
            cols: cols.max(1),
            rows: rows.max(1),
            cell_width: DEFAULT_CELL_WIDTH,
            cell_height: DEFAULT_CELL_HEIGHT,
        }
    }

    pub fn with_cell_size(mut self, cell_width: f64, cell_height: f64) -> Self {
        if cell_width > 0.0 && cell_height > 0.0 {
            self.cell_width = cell_width;
            self.cell_height = cell_height;
        }
        self
    }

    /// Width in screen pixels
    pub fn width(&self) -> f64 {
        self.cols as f64 * self.cell_width
    }

    /// Height in screen pixels
    pub fn height(&self) -> f64 {
        self.rows as f64 * self.cell_height
    }

    pub fn aspect(&self) -> f64 {
        self.width() / self.height()
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width() / 2.0, self.height() / 2.0)
    }

    /// Screen position of the middle of a cell
    #[cfg(test)]
    pub fn cell_center(&self, col: u16, row: u16) -> (f64, f64) {
        (
            (col as f64 + 0.5) * self.cell_width,
            (row as f64 + 0.5) * self.cell_height,
        )
    }

    /// Converts a screen-space point to normalized device coordinates
    pub fn to_ndc(&self, x: f64, y: f64) -> DVec2 {
        DVec2::new(
            (x / self.width()) * 2.0 - 1.0,
            -(y / self.height()) * 2.0 + 1.0,
        )
    }

    /// Converts normalized device coordinates back to screen space
    #[cfg(test)]
    pub fn from_ndc(&self, ndc: DVec2) -> (f64, f64) {
        (
            (ndc.x + 1.0) / 2.0 * self.width(),
            (1.0 - ndc.y) / 2.0 * self.height(),
        )
    }
}
