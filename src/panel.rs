//! Text layout for the exhibit detail panel and the navigation menu, in
//! terminal cells.

use crate::exhibit::{ContentNode, ContentStore, Exhibit};
use crate::viewport::Viewport;

const PANEL_MAX_WIDTH: u16 = 76;
const MENU_WIDTH: u16 = 34;
const CLOSE_LABEL: &str = "[x]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Heading,
    Body,
    Caption,
    Bullet,
    Tags,
    Link,
    Markup,
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLine {
    pub text: String,
    pub style: LineStyle,
}

impl PanelLine {
    fn new(text: impl Into<String>, style: LineStyle) -> Self {
        PanelLine {
            text: text.into(),
            style,
        }
    }

    fn blank() -> Self {
        Self::new("", LineStyle::Blank)
    }
}

/// Cell rectangle, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub col: u16,
    pub row: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn contains(&self, col: u16, row: u16) -> bool {
        col >= self.col
            && row >= self.row
            && col < self.col.saturating_add(self.width)
            && row < self.row.saturating_add(self.height)
    }
}

/// Cell under a screen-space point
pub fn cell_at(viewport: &Viewport, x: f64, y: f64) -> Option<(u16, u16)> {
    if x < 0.0 || y < 0.0 {
        return None;
    }
    let col = (x / viewport.cell_width) as u16;
    let row = (y / viewport.cell_height) as u16;
    (col < viewport.cols && row < viewport.rows).then_some((col, row))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelLayout {
    pub frame: Rect,
    pub close: Rect,
    /// Where content lines go, below the title and category
    pub body: Rect,
}

impl PanelLayout {
    pub fn for_viewport(viewport: &Viewport) -> Self {
        let width = viewport.cols.saturating_sub(4).clamp(1, PANEL_MAX_WIDTH);
        let height = viewport.rows.saturating_sub(2).max(1);
        let frame = Rect {
            col: (viewport.cols - width) / 2,
            row: (viewport.rows - height) / 2,
            width,
            height,
        };
        let close_width = CLOSE_LABEL.len() as u16;
        let close = Rect {
            col: (frame.col + frame.width).saturating_sub(close_width + 1),
            row: frame.row,
            width: close_width,
            height: 1,
        };
        let body = Rect {
            col: frame.col + 2,
            row: frame.row + 3,
            width: frame.width.saturating_sub(4).max(1),
            height: frame.height.saturating_sub(4),
        };
        PanelLayout { frame, close, body }
    }

    pub fn close_label() -> &'static str {
        CLOSE_LABEL
    }

    /// Whether a screen-space point lands on the close button
    pub fn hits_close(&self, viewport: &Viewport, x: f64, y: f64) -> bool {
        cell_at(viewport, x, y).is_some_and(|(col, row)| self.close.contains(col, row))
    }

    /// Largest useful scroll offset for a body of `lines` lines
    pub fn max_scroll(&self, lines: usize) -> usize {
        lines.saturating_sub(self.body.height as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuLayout {
    pub frame: Rect,
    pub first_item_row: u16,
    pub items: usize,
}

impl MenuLayout {
    pub fn for_viewport(viewport: &Viewport, items: usize) -> Self {
        let width = MENU_WIDTH.min(viewport.cols);
        let height = (items as u16 + 4).min(viewport.rows);
        let frame = Rect {
            col: (viewport.cols - width) / 2,
            row: (viewport.rows - height) / 2,
            width,
            height,
        };
        MenuLayout {
            frame,
            first_item_row: frame.row + 2,
            items,
        }
    }

    /// Menu entry under a screen-space point
    pub fn item_at(&self, viewport: &Viewport, x: f64, y: f64) -> Option<usize> {
        let (col, row) = cell_at(viewport, x, y)?;
        if !self.frame.contains(col, row) || row < self.first_item_row {
            return None;
        }
        let index = (row - self.first_item_row) as usize;
        (index < self.items).then_some(index)
    }
}

/// Menu entries, numbered from 1
pub fn menu_lines(store: &ContentStore) -> Vec<String> {
    store
        .iter()
        .map(|exhibit| format!("{}  {} {}", exhibit.index + 1, exhibit.icon, exhibit.title))
        .collect()
}

/// Flattens an exhibit's content into lines no wider than `width` characters
pub fn content_lines(exhibit: &Exhibit, width: usize) -> Vec<PanelLine> {
    let mut lines = Vec::new();
    for node in &exhibit.content {
        push_node(&mut lines, node, width.max(8), 0);
    }
    while lines.last().is_some_and(|line| line.style == LineStyle::Blank) {
        lines.pop();
    }
    lines
}

fn push_node(lines: &mut Vec<PanelLine>, node: &ContentNode, width: usize, indent: usize) {
    let pad = " ".repeat(indent);
    match node {
        ContentNode::Heading { text, .. } => {
            push_wrapped(lines, text, width, &pad, &pad, LineStyle::Heading);
        }
        ContentNode::Paragraph(text) => {
            push_wrapped(lines, text, width, &pad, &pad, LineStyle::Body);
            lines.push(PanelLine::blank());
        }
        ContentNode::Caption(text) => {
            push_wrapped(lines, text, width, &pad, &pad, LineStyle::Caption);
        }
        ContentNode::Field { label, value } => {
            let text = format!("{label}: {value}");
            push_wrapped(lines, &text, width, &pad, &pad, LineStyle::Body);
        }
        ContentNode::List(items) => {
            let first = format!("{pad}- ");
            let rest = format!("{pad}  ");
            for item in items {
                push_wrapped(lines, item, width, &first, &rest, LineStyle::Bullet);
            }
            lines.push(PanelLine::blank());
        }
        ContentNode::Tags(items) => {
            let text = items
                .iter()
                .map(|tag| format!("[{tag}]"))
                .collect::<Vec<_>>()
                .join(" ");
            push_wrapped(lines, &text, width, &pad, &pad, LineStyle::Tags);
            lines.push(PanelLine::blank());
        }
        ContentNode::Links(links) => {
            for link in links {
                let text = format!("> {} ({})", link.label, link.href);
                push_wrapped(lines, &text, width, &pad, &pad, LineStyle::Link);
            }
            lines.push(PanelLine::blank());
        }
        ContentNode::Section { title, children } => {
            push_wrapped(lines, title, width, &pad, &pad, LineStyle::Heading);
            for child in children {
                push_node(lines, child, width, indent + 2);
            }
            if lines.last().is_some_and(|line| line.style != LineStyle::Blank) {
                lines.push(PanelLine::blank());
            }
        }
        ContentNode::TrustedMarkup(markup) => {
            for raw in markup.lines() {
                push_wrapped(lines, raw, width, &pad, &pad, LineStyle::Markup);
            }
        }
    }
}

fn push_wrapped(
    lines: &mut Vec<PanelLine>,
    text: &str,
    width: usize,
    first_prefix: &str,
    rest_prefix: &str,
    style: LineStyle,
) {
    for line in wrap(text, width, first_prefix, rest_prefix) {
        lines.push(PanelLine::new(line, style));
    }
}

/// Greedy word wrap; words longer than a line are split
pub fn wrap(text: &str, width: usize, first_prefix: &str, rest_prefix: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = first_prefix.to_string();
    let mut current_len = first_prefix.chars().count();
    let mut line_has_word = false;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        loop {
            let needed = word.len() + usize::from(line_has_word);
            if current_len + needed <= width {
                if line_has_word {
                    current.push(' ');
                }
                current.extend(word.iter());
                current_len += needed;
                line_has_word = true;
                break;
            }
            if line_has_word {
                out.push(std::mem::replace(&mut current, rest_prefix.to_string()));
                current_len = rest_prefix.chars().count();
                line_has_word = false;
                continue;
            }
            // Word alone does not fit: hard split it
            let room = width.saturating_sub(current_len).max(1);
            let tail = word.split_off(room.min(word.len()));
            current.extend(word.iter());
            out.push(std::mem::replace(&mut current, rest_prefix.to_string()));
            current_len = rest_prefix.chars().count();
            if tail.is_empty() {
                break;
            }
            word = tail;
        }
    }
    if line_has_word || out.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_respects_width() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 12, "", "");
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps over", "the lazy dog"]);
        assert!(lines.iter().all(|line| line.chars().count() <= 12));
    }

    #[test]
    fn wrap_splits_long_words() {
        let lines = wrap("abcdefghij", 4, "", "");
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn wrap_uses_hanging_prefix() {
        let lines = wrap("one two three", 9, "- ", "  ");
        assert_eq!(lines, vec!["- one two", "  three"]);
    }

    #[test]
    fn empty_text_yields_one_line() {
        assert_eq!(wrap("", 10, "", ""), vec![String::new()]);
    }

    #[test]
    fn every_builtin_exhibit_lays_out_within_width() {
        let store = ContentStore::builtin();
        for exhibit in store.iter() {
            let lines = content_lines(exhibit, 40);
            assert!(!lines.is_empty(), "{} has no content lines", exhibit.id);
            for line in &lines {
                assert!(line.text.chars().count() <= 40, "{:?} too wide", line.text);
            }
        }
    }

    #[test]
    fn sections_indent_children() {
        let store = ContentStore::builtin();
        let projects = store.find("projects").unwrap();
        let lines = content_lines(projects, 60);
        assert!(lines
            .iter()
            .any(|line| line.style == LineStyle::Caption && line.text.starts_with("  ")));
    }

    #[test]
    fn close_button_hit_test() {
        let viewport = Viewport::new(100, 30);
        let layout = PanelLayout::for_viewport(&viewport);
        let (x, y) = viewport.cell_center(layout.close.col + 1, layout.close.row);
        assert!(layout.hits_close(&viewport, x, y));
        let (x, y) = viewport.center();
        assert!(!layout.hits_close(&viewport, x, y));
    }

    #[test]
    fn panel_fits_small_terminals() {
        let viewport = Viewport::new(20, 8);
        let layout = PanelLayout::for_viewport(&viewport);
        assert!(layout.frame.col + layout.frame.width <= viewport.cols);
        assert!(layout.frame.row + layout.frame.height <= viewport.rows);
    }

    #[test]
    fn menu_rows_map_to_items() {
        let viewport = Viewport::new(100, 30);
        let layout = MenuLayout::for_viewport(&viewport, 7);
        let (x, y) = viewport.cell_center(layout.frame.col + 2, layout.first_item_row + 3);
        assert_eq!(layout.item_at(&viewport, x, y), Some(3));
        let (x, y) = viewport.cell_center(layout.frame.col + 2, layout.first_item_row + 7);
        assert_eq!(layout.item_at(&viewport, x, y), None);
    }

    #[test]
    fn menu_lines_are_numbered_from_one() {
        let store = ContentStore::builtin();
        let lines = menu_lines(&store);
        assert_eq!(lines.len(), 7);
        assert!(lines[0].starts_with("1 "));
        assert!(lines[6].starts_with("7 "));
    }
}
