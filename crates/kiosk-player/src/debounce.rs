use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::input::Level;

/// Turns raw sampled line levels into discrete press events, at most one
/// per line per debounce window. The per-line record always holds the last
/// *accepted* press; samples absorbed inside the window do not move it, so
/// holding a button down re-arms exactly one window after the accepted
/// press rather than drifting forever.
pub struct Debouncer {
    window: Duration,
    last_accepted: HashMap<u32, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: HashMap::new(),
        }
    }

    /// True iff `level` is a press and the line's window has elapsed.
    pub fn accept(&mut self, line: u32, level: Level, now: Instant) -> bool {
        if level != Level::Active {
            return false;
        }
        if let Some(&last) = self.last_accepted.get(&line) {
            if now.saturating_duration_since(last) <= self.window {
                return false;
            }
        }
        self.last_accepted.insert(line, now);
        true
    }
}
