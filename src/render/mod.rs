//! Terminal rendering: the scene is rasterised at two pixels per cell
//! (upper-half blocks), optionally supersampled, overlaid with text, and only
//! changed cells are written out.

pub mod mesh;
pub mod overlay;
pub mod raster;
pub mod scene_view;
pub mod shading;
pub mod vertex;

use crate::error::HallResult;
use crate::hall::Hall;
use crate::scene::Rgb;
use crate::scheduler::{FrameStats, RenderSurface};
use crossterm::{
    cursor, queue,
    style::{Color, Print, SetBackgroundColor, SetForegroundColor},
    terminal::{BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate},
};
use overlay::{draw_overlay, Cell, CellGrid, CONTINUATION};
use raster::Framebuffer;
use std::io::Write;
use tracing::debug;

const HALF_BLOCK: char = '▀';

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.0,
        g: rgb.1,
        b: rgb.2,
    }
}

/// Box-filters a supersampled frame down by `factor` in each direction
pub fn downsample(frame: &Framebuffer, factor: usize) -> Vec<Rgb> {
    let factor = factor.max(1);
    let (width, height) = (frame.width() / factor, frame.height() / factor);
    let samples = (factor * factor) as u32;
    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let (mut r, mut g, mut b) = (0u32, 0u32, 0u32);
            for sy in 0..factor {
                for sx in 0..factor {
                    let pixel = frame.pixel(x * factor + sx, y * factor + sy);
                    r += pixel.0 as u32;
                    g += pixel.1 as u32;
                    b += pixel.2 as u32;
                }
            }
            out.push(Rgb(
                (r / samples) as u8,
                (g / samples) as u8,
                (b / samples) as u8,
            ));
        }
    }
    out
}

/// Draws frames to a terminal writer
pub struct Renderer<W: Write> {
    out: W,
    frame: Framebuffer,
    supersample: usize,
    cols: u16,
    rows: u16,
    previous: Vec<Option<Cell>>,
    current: Vec<Cell>,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, supersample: usize) -> Self {
        Renderer {
            out,
            frame: Framebuffer::new(0, 0),
            supersample: supersample.max(1),
            cols: 0,
            rows: 0,
            previous: Vec::new(),
            current: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Cells of the last composed frame, row-major
    #[cfg(test)]
    pub fn cells(&self) -> &[Cell] {
        &self.current
    }

    /// Renders the scene and overlay into the cell buffer
    pub fn compose(&mut self, hall: &Hall, stats: &FrameStats) {
        let viewport = hall.viewport();
        let (cols, rows) = (viewport.cols, viewport.rows);
        if (cols, rows) != (self.cols, self.rows) {
            debug!(cols, rows, "render surface resized");
            self.cols = cols;
            self.rows = rows;
            self.previous = vec![None; cols as usize * rows as usize];
        }

        let ss = self.supersample;
        self.frame
            .resize(cols as usize * ss, rows as usize * 2 * ss);
        scene_view::draw_scene(hall, &mut self.frame);
        let pixels = downsample(&self.frame, ss);

        let mut grid = CellGrid::new(cols, rows);
        draw_overlay(&mut grid, hall, stats);

        let width = cols as usize;
        self.current.clear();
        for row in 0..rows {
            for col in 0..cols {
                let cell = grid.get(col, row).unwrap_or_else(|| {
                    let top = pixels[(row as usize * 2) * width + col as usize];
                    let bottom = pixels[(row as usize * 2 + 1) * width + col as usize];
                    Cell {
                        ch: HALF_BLOCK,
                        fg: top,
                        bg: bottom,
                    }
                });
                self.current.push(cell);
            }
        }
    }

    /// Writes the cells that changed since the last flush
    pub fn flush_diff(&mut self) -> HallResult<usize> {
        let cleared = self.previous.iter().all(Option::is_none);
        queue!(self.out, BeginSynchronizedUpdate)?;
        if cleared {
            queue!(self.out, Clear(ClearType::All))?;
        }

        let mut written = 0;
        let mut pen: Option<(Rgb, Rgb)> = None;
        let width = self.cols as usize;
        for (index, cell) in self.current.iter().enumerate() {
            if self.previous[index] == Some(*cell) {
                continue;
            }
            self.previous[index] = Some(*cell);
            if cell.ch == CONTINUATION {
                continue;
            }
            let (col, row) = ((index % width) as u16, (index / width) as u16);
            queue!(self.out, cursor::MoveTo(col, row))?;
            if pen != Some((cell.fg, cell.bg)) {
                queue!(
                    self.out,
                    SetForegroundColor(to_color(cell.fg)),
                    SetBackgroundColor(to_color(cell.bg))
                )?;
                pen = Some((cell.fg, cell.bg));
            }
            queue!(self.out, Print(cell.ch))?;
            written += 1;
        }

        queue!(self.out, EndSynchronizedUpdate)?;
        self.out.flush()?;
        Ok(written)
    }
}

impl<W: Write> RenderSurface for Renderer<W> {
    fn submit(&mut self, hall: &Hall, stats: &FrameStats) -> HallResult<()> {
        self.compose(hall, stats);
        self.flush_diff()?;
        Ok(())
    }
}
