//! Input state and the event queue that feeds it.
//!
//! Host events never touch render state directly. They are pushed onto an
//! [`EventQueue`] and drained at the start of each frame tick, which keeps
//! per-tick behaviour deterministic regardless of when events arrived.

use crate::viewport::Viewport;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// Logical key names the camera controller reads
pub const KEY_FORWARD: [&str; 2] = ["KeyW", "ArrowUp"];
pub const KEY_BACK: [&str; 2] = ["KeyS", "ArrowDown"];
pub const KEY_LEFT: [&str; 2] = ["KeyA", "ArrowLeft"];
pub const KEY_RIGHT: [&str; 2] = ["KeyD", "ArrowRight"];

/// A touch only counts as a tap when shorter than this
pub const TAP_MAX_DURATION: Duration = Duration::from_millis(300);
/// ...and when it travelled less than this many pixels
pub const TAP_MOVE_THRESHOLD: f64 = 15.0;
/// Pinch spread changes below this are treated as jitter
pub const PINCH_THRESHOLD: f64 = 20.0;
/// How long a key stays held without a repeat, on terminals that never report releases
pub const KEY_HOLD_WINDOW: Duration = Duration::from_millis(350);

/// Discrete events delivered by the host
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key { name: String, pressed: bool },
    /// Relative pointer movement in screen pixels
    PointerMove { dx: f64, dy: f64 },
    /// Host released pointer capture (escape, focus loss)
    PointerLockLost,
    Click { x: f64, y: f64 },
    TouchStart { x: f64, y: f64, at: Instant },
    TouchMove { x: f64, y: f64 },
    TouchEnd { x: f64, y: f64, at: Instant },
    /// Current distance between two touch points
    Pinch { spread: f64 },
    PinchEnd,
    Resize { viewport: Viewport, at: Instant },
    ToggleMenu,
    MenuSelect(usize),
    CloseExhibit,
    ScrollPanel(i32),
    ToggleDebug,
    TogglePause,
    Quit,
}

/// FIFO of pending host events
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<InputEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    /// Takes every pending event at once
    pub fn drain(&mut self) -> Vec<InputEvent> {
        self.events.drain(..).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Keys held, look deltas accumulated since the last frame, and the
/// capture/panel flags the controller respects.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    keys: HashMap<String, bool>,
    pointer_delta: (f64, f64),
    touch_delta: (f64, f64),
    pinch_delta: f64,
    pub pointer_locked: bool,
    pub exhibit_open: bool,
}

impl InputState {
    pub fn set_key(&mut self, name: &str, pressed: bool) {
        self.keys.insert(name.to_string(), pressed);
    }

    pub fn is_pressed(&self, name: &str) -> bool {
        self.keys.get(name).copied().unwrap_or(false)
    }

    pub fn any_pressed(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.is_pressed(name))
    }

    pub fn apply_pointer_delta(&mut self, dx: f64, dy: f64) {
        self.pointer_delta.0 += dx;
        self.pointer_delta.1 += dy;
    }

    /// Returns the accumulated pointer movement and resets it
    pub fn consume_pointer_delta(&mut self) -> (f64, f64) {
        std::mem::take(&mut self.pointer_delta)
    }

    pub fn apply_touch_delta(&mut self, dx: f64, dy: f64) {
        self.touch_delta.0 += dx;
        self.touch_delta.1 += dy;
    }

    pub fn consume_touch_delta(&mut self) -> (f64, f64) {
        std::mem::take(&mut self.touch_delta)
    }

    pub fn apply_pinch_delta(&mut self, delta: f64) {
        self.pinch_delta += delta;
    }

    pub fn consume_pinch_delta(&mut self) -> f64 {
        std::mem::take(&mut self.pinch_delta)
    }
}

/// Outcome of a finished touch
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchOutcome {
    Tap { x: f64, y: f64 },
    Drag,
}

/// Tracks one touch from start to end to tell taps from look-drags
#[derive(Debug, Clone, Copy)]
pub struct TouchGesture {
    started: Instant,
    last: (f64, f64),
    travelled: f64,
    dragging: bool,
}

impl TouchGesture {
    pub fn begin(x: f64, y: f64, at: Instant) -> Self {
        TouchGesture {
            started: at,
            last: (x, y),
            travelled: 0.0,
            dragging: false,
        }
    }

    /// Records movement; returns the look delta once the touch is a drag
    pub fn update(&mut self, x: f64, y: f64) -> Option<(f64, f64)> {
        let delta = (x - self.last.0, y - self.last.1);
        self.travelled += delta.0.hypot(delta.1);
        self.last = (x, y);
        if self.travelled >= TAP_MOVE_THRESHOLD {
            self.dragging = true;
        }
        self.dragging.then_some(delta)
    }

    pub fn finish(mut self, x: f64, y: f64, at: Instant) -> TouchOutcome {
        self.update(x, y);
        let duration = at.saturating_duration_since(self.started);
        if duration < TAP_MAX_DURATION && self.travelled < TAP_MOVE_THRESHOLD {
            TouchOutcome::Tap { x, y }
        } else {
            TouchOutcome::Drag
        }
    }
}

/// Turns raw two-finger spread samples into dolly deltas past the noise threshold
#[derive(Debug, Default, Clone, Copy)]
pub struct PinchTracker {
    baseline: Option<f64>,
}

impl PinchTracker {
    pub fn sample(&mut self, spread: f64) -> Option<f64> {
        let Some(baseline) = self.baseline else {
            self.baseline = Some(spread);
            return None;
        };
        let delta = spread - baseline;
        if delta.abs() > PINCH_THRESHOLD {
            self.baseline = Some(spread);
            Some(delta)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.baseline = None;
    }
}

/// Synthesises key releases for terminals that only report presses and repeats
#[derive(Debug, Clone)]
pub struct KeyHoldTracker {
    held: HashMap<String, Instant>,
    window: Duration,
}

impl KeyHoldTracker {
    pub fn new(window: Duration) -> Self {
        KeyHoldTracker {
            held: HashMap::new(),
            window,
        }
    }

    /// Press or repeat; yields a key-down only for keys not already held
    pub fn press(&mut self, name: &str, at: Instant) -> Option<InputEvent> {
        let newly_held = self.held.insert(name.to_string(), at).is_none();
        newly_held.then(|| InputEvent::Key {
            name: name.to_string(),
            pressed: true,
        })
    }

    pub fn release(&mut self, name: &str) -> Option<InputEvent> {
        self.held.remove(name).map(|_| InputEvent::Key {
            name: name.to_string(),
            pressed: false,
        })
    }

    /// Releases every key whose last press is older than the hold window
    pub fn expire(&mut self, now: Instant) -> Vec<InputEvent> {
        let stale: Vec<String> = self
            .held
            .iter()
            .filter(|(_, at)| now.saturating_duration_since(**at) > self.window)
            .map(|(name, _)| name.clone())
            .collect();
        stale.iter().filter_map(|name| self.release(name)).collect()
    }
}

impl Default for KeyHoldTracker {
    fn default() -> Self {
        Self::new(KEY_HOLD_WINDOW)
    }
}
