//! Terminal host: raw-mode setup, crossterm event translation and the frame loop.

use crate::config::DeviceTier;
use crate::error::{HallError, HallResult};
use crate::hall::Hall;
use crate::input::{InputEvent, KeyHoldTracker};
use crate::render::Renderer;
use crate::scheduler::FrameScheduler;
use crate::viewport::Viewport;
use crossterm::{
    cursor,
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
        KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags, MouseButton,
        MouseEvent, MouseEventKind, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    style::ResetColor,
    terminal::{self, DisableLineWrap, EnableLineWrap, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, IsTerminal, Write};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Spread change reported per wheel notch when the wheel stands in for a pinch
pub const PINCH_STEP: f64 = 24.0;
const PINCH_BASELINE: f64 = 200.0;

/// Puts the terminal into raw, alternate-screen mode with mouse reporting and
/// restores it on drop
#[derive(Debug)]
pub struct TerminalGuard {
    keyboard_enhanced: bool,
}

impl TerminalGuard {
    pub fn enter() -> HallResult<Self> {
        let mut out = io::stdout();
        if !out.is_terminal() {
            return Err(HallError::Terminal("stdout is not a terminal".to_string()));
        }
        terminal::enable_raw_mode()?;
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            EnableMouseCapture,
            EnableFocusChange
        )?;

        let keyboard_enhanced = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
        if keyboard_enhanced {
            execute!(
                out,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        info!(keyboard_enhanced, "terminal ready");
        Ok(TerminalGuard { keyboard_enhanced })
    }

    /// Whether the terminal reports key releases
    pub fn reports_releases(&self) -> bool {
        self.keyboard_enhanced
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut out = io::stdout();
        if self.keyboard_enhanced {
            let _ = execute!(out, PopKeyboardEnhancementFlags);
        }
        let _ = execute!(
            out,
            DisableFocusChange,
            DisableMouseCapture,
            ResetColor,
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        );
        if let Err(err) = terminal::disable_raw_mode() {
            warn!(%err, "failed to leave raw mode");
        }
    }
}

/// Current terminal size, with the pixel size of a cell when the terminal reports one
pub fn probe_viewport() -> Viewport {
    let (cols, rows) = termsize::get()
        .map(|size| (size.cols, size.rows))
        .unwrap_or((80, 24));
    let viewport = Viewport::new(cols, rows);
    match terminal::window_size() {
        Ok(size) if size.width > 0 && size.height > 0 && size.columns > 0 && size.rows > 0 => {
            viewport.with_cell_size(
                size.width as f64 / size.columns as f64,
                size.height as f64 / size.rows as f64,
            )
        }
        _ => viewport,
    }
}

/// Maps crossterm events onto hall input events.
///
/// Pointer positions are cell centres in pixels, which depend only on the cell
/// size. They stay valid while a resize is still being debounced and the hall
/// keeps rendering at the previous size.
#[derive(Debug)]
pub struct EventTranslator {
    tier: DeviceTier,
    cell_width: f64,
    cell_height: f64,
    rows: u16,
    reports_releases: bool,
    holds: KeyHoldTracker,
    last_mouse: Option<(f64, f64)>,
    pinch_spread: Option<f64>,
}

fn movement_key(code: KeyCode) -> Option<&'static str> {
    match code {
        KeyCode::Char('w') | KeyCode::Char('W') => Some("KeyW"),
        KeyCode::Char('a') | KeyCode::Char('A') => Some("KeyA"),
        KeyCode::Char('s') | KeyCode::Char('S') => Some("KeyS"),
        KeyCode::Char('d') | KeyCode::Char('D') => Some("KeyD"),
        KeyCode::Up => Some("ArrowUp"),
        KeyCode::Down => Some("ArrowDown"),
        KeyCode::Left => Some("ArrowLeft"),
        KeyCode::Right => Some("ArrowRight"),
        _ => None,
    }
}

impl EventTranslator {
    pub fn new(tier: DeviceTier, viewport: Viewport, reports_releases: bool) -> Self {
        EventTranslator {
            tier,
            cell_width: viewport.cell_width,
            cell_height: viewport.cell_height,
            rows: viewport.rows,
            reports_releases,
            holds: KeyHoldTracker::default(),
            last_mouse: None,
            pinch_spread: None,
        }
    }

    pub fn translate(&mut self, event: Event, now: Instant) -> Vec<InputEvent> {
        match event {
            Event::Key(key) => self.translate_key(key, now),
            Event::Mouse(mouse) => self.translate_mouse(mouse, now),
            Event::FocusLost => {
                self.last_mouse = None;
                vec![InputEvent::PointerLockLost]
            }
            Event::Resize(cols, rows) => {
                self.rows = rows;
                let viewport =
                    Viewport::new(cols, rows).with_cell_size(self.cell_width, self.cell_height);
                vec![InputEvent::Resize { viewport, at: now }]
            }
            _ => Vec::new(),
        }
    }

    /// Releases held keys whose repeats stopped, on terminals without release events
    pub fn expire(&mut self, now: Instant) -> Vec<InputEvent> {
        if self.reports_releases {
            return Vec::new();
        }
        self.holds.expire(now)
    }

    fn translate_key(&mut self, key: KeyEvent, now: Instant) -> Vec<InputEvent> {
        if let Some(name) = movement_key(key.code) {
            let event = match (key.kind, self.reports_releases) {
                (KeyEventKind::Release, _) => self.holds.release(name),
                (KeyEventKind::Press, true) => {
                    self.holds.press(name, now);
                    Some(InputEvent::Key {
                        name: name.to_string(),
                        pressed: true,
                    })
                }
                (KeyEventKind::Repeat, true) => None,
                (_, false) => self.holds.press(name, now),
            };
            return event.into_iter().collect();
        }

        let page = (self.rows / 2).max(1) as i32;
        let scroll = match key.code {
            KeyCode::PageUp => Some(-page),
            KeyCode::PageDown => Some(page),
            KeyCode::Char('k') => Some(-1),
            KeyCode::Char('j') => Some(1),
            _ => None,
        };
        if let Some(lines) = scroll {
            return match key.kind {
                KeyEventKind::Release => Vec::new(),
                _ => vec![InputEvent::ScrollPanel(lines)],
            };
        }

        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                vec![InputEvent::Quit]
            }
            KeyCode::Esc => vec![InputEvent::PointerLockLost, InputEvent::ToggleMenu],
            KeyCode::Char('m') | KeyCode::Char('M') => vec![InputEvent::ToggleMenu],
            KeyCode::Char(digit @ '1'..='9') => {
                vec![InputEvent::MenuSelect(digit as usize - '1' as usize)]
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => vec![InputEvent::Quit],
            KeyCode::Char('p') | KeyCode::Char('P') => vec![InputEvent::TogglePause],
            KeyCode::Char('`') | KeyCode::F(3) => vec![InputEvent::ToggleDebug],
            KeyCode::Char('x') | KeyCode::Char('X') | KeyCode::Backspace => {
                vec![InputEvent::CloseExhibit]
            }
            _ => Vec::new(),
        }
    }

    fn translate_mouse(&mut self, mouse: MouseEvent, now: Instant) -> Vec<InputEvent> {
        let (x, y) = (
            (mouse.column as f64 + 0.5) * self.cell_width,
            (mouse.row as f64 + 0.5) * self.cell_height,
        );
        match (self.tier, mouse.kind) {
            (DeviceTier::Desktop, MouseEventKind::Moved | MouseEventKind::Drag(_)) => {
                let previous = self.last_mouse.replace((x, y));
                previous
                    .map(|(px, py)| InputEvent::PointerMove {
                        dx: x - px,
                        dy: y - py,
                    })
                    .into_iter()
                    .collect()
            }
            (DeviceTier::Desktop, MouseEventKind::Down(MouseButton::Left)) => {
                self.last_mouse = Some((x, y));
                vec![InputEvent::Click { x, y }]
            }
            (DeviceTier::Desktop, MouseEventKind::ScrollUp) => vec![InputEvent::ScrollPanel(-1)],
            (DeviceTier::Desktop, MouseEventKind::ScrollDown) => vec![InputEvent::ScrollPanel(1)],
            (DeviceTier::Touch, MouseEventKind::Down(MouseButton::Left)) => {
                // A new touch ends any wheel pinch in progress
                let mut events = Vec::with_capacity(2);
                if self.pinch_spread.take().is_some() {
                    events.push(InputEvent::PinchEnd);
                }
                events.push(InputEvent::TouchStart { x, y, at: now });
                events
            }
            (DeviceTier::Touch, MouseEventKind::Drag(MouseButton::Left)) => {
                vec![InputEvent::TouchMove { x, y }]
            }
            (DeviceTier::Touch, MouseEventKind::Up(MouseButton::Left)) => {
                vec![InputEvent::TouchEnd { x, y, at: now }]
            }
            (DeviceTier::Touch, MouseEventKind::ScrollUp) => self.wheel_pinch(PINCH_STEP, -1),
            (DeviceTier::Touch, MouseEventKind::ScrollDown) => self.wheel_pinch(-PINCH_STEP, 1),
            _ => Vec::new(),
        }
    }

    /// Wheel notches spread or close a virtual pinch; the panel scrolls too
    fn wheel_pinch(&mut self, change: f64, scroll: i32) -> Vec<InputEvent> {
        let mut events = Vec::with_capacity(3);
        let current = self.pinch_spread.unwrap_or_else(|| {
            events.push(InputEvent::Pinch {
                spread: PINCH_BASELINE,
            });
            PINCH_BASELINE
        });
        let spread = current + change;
        self.pinch_spread = Some(spread);
        events.push(InputEvent::Pinch { spread });
        events.push(InputEvent::ScrollPanel(scroll));
        events
    }
}

/// Runs frames until the hall asks to quit, feeding terminal events in between
pub fn run<W: Write>(
    hall: &mut Hall,
    renderer: &mut Renderer<W>,
    translator: &mut EventTranslator,
) -> HallResult<()> {
    let mut scheduler = FrameScheduler::new(hall.config().frame_interval, Instant::now());
    while !hall.should_quit() {
        let wait = scheduler.time_until_next(Instant::now());
        if event::poll(wait)? {
            let event = event::read()?;
            for input in translator.translate(event, Instant::now()) {
                hall.push_event(input);
            }
            if !scheduler.time_until_next(Instant::now()).is_zero() {
                continue;
            }
        }

        let now = Instant::now();
        for input in translator.expire(now) {
            hall.push_event(input);
        }
        let stats = scheduler.run_frame(hall, renderer, now)?;
        if stats.frame % 300 == 0 {
            debug!(frame = stats.frame, fps = stats.fps, "frame");
        }
    }
    info!("leaving the hall");
    Ok(())
}
