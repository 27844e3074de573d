//! Character-cell layer drawn over the 3D image: HUD, crosshair, menu and
//! exhibit panel.

use crate::config::DeviceTier;
use crate::hall::Hall;
use crate::panel::{content_lines, menu_lines, LineStyle, MenuLayout, PanelLayout, Rect};
use crate::resolver::CursorAffordance;
use crate::scene::Rgb;
use crate::scheduler::FrameStats;

const TEXT: Rgb = Rgb::hex(0x222831);
const MUTED: Rgb = Rgb::hex(0x6b7280);
const ACCENT: Rgb = Rgb::hex(0x00897b);
const LINK: Rgb = Rgb::hex(0x1565c0);
const PANEL_BG: Rgb = Rgb::hex(0xffffff);
const HUD_BG: Rgb = Rgb::hex(0x1f2933);
const HUD_FG: Rgb = Rgb::hex(0xf8f9fa);
const CROSSHAIR: Rgb = Rgb::hex(0x64ffda);

/// Placeholder for the right half of a wide glyph; never printed
pub const CONTINUATION: char = '\0';

/// Glyphs most terminals draw two cells wide
pub fn is_wide(ch: char) -> bool {
    matches!(
        ch as u32,
        0x1100..=0x115F
            | 0x2600..=0x27BF
            | 0x2E80..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x1F300..=0x1FAFF
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Rgb,
    pub bg: Rgb,
}

/// Sparse text layer; empty cells let the image through
#[derive(Debug, Clone)]
pub struct CellGrid {
    cols: u16,
    rows: u16,
    cells: Vec<Option<Cell>>,
}

impl CellGrid {
    pub fn new(cols: u16, rows: u16) -> Self {
        CellGrid {
            cols,
            rows,
            cells: vec![None; cols as usize * rows as usize],
        }
    }

    pub fn get(&self, col: u16, row: u16) -> Option<Cell> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.cells[row as usize * self.cols as usize + col as usize]
    }

    pub fn put(&mut self, col: u16, row: u16, cell: Cell) {
        if col < self.cols && row < self.rows {
            self.cells[row as usize * self.cols as usize + col as usize] = Some(cell);
        }
    }

    /// Writes a string, clipped at `max_width` cells and at the grid edge.
    /// Wide glyphs take two cells, the second holding [`CONTINUATION`].
    pub fn write_str(&mut self, col: u16, row: u16, text: &str, max_width: u16, fg: Rgb, bg: Rgb) {
        let mut offset: u16 = 0;
        for ch in text.chars() {
            let width = if is_wide(ch) { 2 } else { 1 };
            if offset + width > max_width {
                break;
            }
            self.put(col.saturating_add(offset), row, Cell { ch, fg, bg });
            if width == 2 {
                let ch = CONTINUATION;
                self.put(col.saturating_add(offset + 1), row, Cell { ch, fg, bg });
            }
            offset += width;
        }
    }

    pub fn fill(&mut self, rect: Rect, bg: Rgb) {
        for row in rect.row..rect.row.saturating_add(rect.height) {
            for col in rect.col..rect.col.saturating_add(rect.width) {
                self.put(col, row, Cell { ch: ' ', fg: TEXT, bg });
            }
        }
    }

    pub fn box_draw(&mut self, rect: Rect, fg: Rgb, bg: Rgb) {
        if rect.width < 2 || rect.height < 2 {
            return;
        }
        let right = rect.col + rect.width - 1;
        let bottom = rect.row + rect.height - 1;
        for col in rect.col + 1..right {
            self.put(col, rect.row, Cell { ch: '─', fg, bg });
            self.put(col, bottom, Cell { ch: '─', fg, bg });
        }
        for row in rect.row + 1..bottom {
            self.put(rect.col, row, Cell { ch: '│', fg, bg });
            self.put(right, row, Cell { ch: '│', fg, bg });
        }
        self.put(rect.col, rect.row, Cell { ch: '┌', fg, bg });
        self.put(right, rect.row, Cell { ch: '┐', fg, bg });
        self.put(rect.col, bottom, Cell { ch: '└', fg, bg });
        self.put(right, bottom, Cell { ch: '┘', fg, bg });
    }
}

pub fn draw_overlay(grid: &mut CellGrid, hall: &Hall, stats: &FrameStats) {
    draw_hud(grid, hall, stats);
    if hall.resolver().cursor() == CursorAffordance::Crosshair && !hall.resolver().is_open() {
        let viewport = hall.viewport();
        let cell = Cell {
            ch: '+',
            fg: CROSSHAIR,
            bg: HUD_BG,
        };
        grid.put(viewport.cols / 2, viewport.rows / 2, cell);
    }
    if hall.is_paused() {
        let label = " Paused ";
        let col = (grid.cols.saturating_sub(label.len() as u16)) / 2;
        grid.write_str(col, 0, label, grid.cols, HUD_FG, HUD_BG);
    }
    if hall.is_menu_open() {
        draw_menu(grid, hall);
    }
    if hall.resolver().is_open() {
        draw_panel(grid, hall);
    }
}

fn draw_hud(grid: &mut CellGrid, hall: &Hall, stats: &FrameStats) {
    let cols = grid.cols;
    let hint = match hall.config().tier {
        _ if hall.is_navigating() => " travelling... | Esc menu | Q quit ",
        DeviceTier::Desktop if hall.input().pointer_locked => {
            " WASD move | click open | Esc menu | Q quit "
        }
        DeviceTier::Desktop => " click to look | WASD move | Esc menu | Q quit ",
        DeviceTier::Touch => " drag look | wheel zoom | tap open | Esc menu ",
    };
    grid.write_str(0, grid.rows.saturating_sub(1), hint, cols, HUD_FG, HUD_BG);

    if !hall.is_debug() {
        return;
    }
    let rig = hall.rig();
    let lines = [
        format!(" {} {} ", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        format!(" FPS: {:.2} ", stats.fps),
        format!(
            " Position: ({:.2}, {:.2}, {:.2}) ",
            rig.position.x, rig.position.y, rig.position.z
        ),
        format!(" Yaw: {:.2}, Pitch: {:.2} ", rig.yaw, rig.pitch),
        format!(" Tier: {:?} ", hall.config().tier),
        format!(
            " Sky momentum: {:.3}{} ",
            hall.sim().momentum().length(),
            if hall.is_paused() { " (paused)" } else { "" }
        ),
    ];
    for (row, line) in lines.iter().enumerate() {
        grid.write_str(0, row as u16, line, cols, HUD_FG, HUD_BG);
    }
}

fn draw_menu(grid: &mut CellGrid, hall: &Hall) {
    let viewport = hall.viewport();
    let layout = MenuLayout::for_viewport(viewport, hall.store().len());
    let frame = layout.frame;
    grid.fill(frame, PANEL_BG);
    grid.box_draw(frame, ACCENT, PANEL_BG);
    grid.write_str(frame.col + 2, frame.row, " Navigate ", frame.width.saturating_sub(4), ACCENT, PANEL_BG);
    let inner = frame.width.saturating_sub(4);
    for (i, line) in menu_lines(hall.store()).iter().enumerate() {
        let row = layout.first_item_row + i as u16;
        if row + 1 >= frame.row + frame.height {
            break;
        }
        grid.write_str(frame.col + 2, row, line, inner, TEXT, PANEL_BG);
    }
}

fn draw_panel(grid: &mut CellGrid, hall: &Hall) {
    let Some(exhibit) = hall.open_exhibit() else {
        return;
    };
    let layout = PanelLayout::for_viewport(hall.viewport());
    let frame = layout.frame;
    grid.fill(frame, PANEL_BG);
    grid.box_draw(frame, ACCENT, PANEL_BG);

    let inner = frame.width.saturating_sub(4);
    let title = format!("{} {}", exhibit.icon, exhibit.title);
    grid.write_str(frame.col + 2, frame.row + 1, &title, inner, TEXT, PANEL_BG);
    grid.write_str(frame.col + 2, frame.row + 2, &exhibit.category, inner, ACCENT, PANEL_BG);
    let close = layout.close;
    grid.write_str(close.col, close.row, PanelLayout::close_label(), close.width, TEXT, PANEL_BG);

    let body = layout.body;
    let lines = content_lines(exhibit, body.width as usize);
    for (row, line) in lines
        .iter()
        .skip(hall.panel_scroll())
        .take(body.height as usize)
        .enumerate()
    {
        let fg = match line.style {
            LineStyle::Heading => ACCENT,
            LineStyle::Caption | LineStyle::Tags | LineStyle::Markup => MUTED,
            LineStyle::Link => LINK,
            LineStyle::Body | LineStyle::Bullet | LineStyle::Blank => TEXT,
        };
        grid.write_str(body.col, body.row + row as u16, &line.text, body.width, fg, PANEL_BG);
    }
    if lines.len() > body.height as usize {
        let hint = " ↑/↓ scroll  x close ";
        let col = frame.col + frame.width.saturating_sub(hint.chars().count() as u16 + 2);
        grid.write_str(col, frame.row + frame.height - 1, hint, frame.width, MUTED, PANEL_BG);
    }
}
