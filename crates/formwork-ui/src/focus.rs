//! Focus traversal helpers.
//!
//! The container owns the focus index; this module holds the pure parts:
//! which key maps to which direction, how held keys are rate-limited, and
//! which candidate wins for a given direction.

use formwork_core::*;
use web_time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Next,
    Previous,
}

impl Direction {
    pub fn from_key(key: Key, shift: bool) -> Option<Direction> {
        Some(match key {
            Key::ArrowUp => Direction::Up,
            Key::ArrowDown => Direction::Down,
            Key::ArrowLeft => Direction::Left,
            Key::ArrowRight => Direction::Right,
            Key::Tab if shift => Direction::Previous,
            Key::Tab => Direction::Next,
            _ => return None,
        })
    }

    pub fn is_sequential(&self) -> bool {
        matches!(self, Direction::Next | Direction::Previous)
    }

    /// Unit vector used for keyboard scrolling when focus cannot move.
    /// Content moves opposite to the direction of travel.
    pub fn scroll_vector(&self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, 1.0),
            Direction::Down => Vec2::new(0.0, -1.0),
            Direction::Left => Vec2::new(1.0, 0.0),
            Direction::Right => Vec2::new(-1.0, 0.0),
            Direction::Next | Direction::Previous => Vec2::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FocusConfig {
    /// Hold time before the first repeat.
    pub repeat_delay: Duration,
    /// Interval between repeats after the first.
    pub repeat_interval: Duration,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            repeat_delay: Duration::from_millis(300),
            repeat_interval: Duration::from_millis(100),
        }
    }
}

/// Rate limiter for held navigation keys.
#[derive(Clone, Debug, Default)]
pub struct FocusRepeat {
    config: FocusConfig,
    held: Option<(Key, Direction)>,
    pressed_at: Option<Instant>,
    last_fire: Option<Instant>,
    repeating: bool,
}

impl FocusRepeat {
    pub fn new(config: FocusConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Called for every press (including platform auto-repeat). Returns
    /// whether focus should move now.
    pub fn press(&mut self, key: Key, dir: Direction, now: Instant) -> bool {
        if self.held != Some((key, dir)) {
            self.held = Some((key, dir));
            self.pressed_at = Some(now);
            self.last_fire = Some(now);
            self.repeating = false;
            return true;
        }
        let since = |t: Option<Instant>| t.map_or(Duration::MAX, |t| now.saturating_duration_since(t));
        if !self.repeating {
            if since(self.pressed_at) >= self.config.repeat_delay {
                self.repeating = true;
                self.last_fire = Some(now);
                return true;
            }
            return false;
        }
        if since(self.last_fire) >= self.config.repeat_interval {
            self.last_fire = Some(now);
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.held = None;
        self.pressed_at = None;
        self.last_fire = None;
        self.repeating = false;
    }

    /// Releases by key, since modifiers may have changed while it was held.
    pub fn release(&mut self, key: Key) {
        if self.held.is_some_and(|(k, _)| k == key) {
            self.reset();
        }
    }
}

/// Sequential pick among `(child index, focus order)` pairs.
///
/// With no current focus, `Next` starts at the lowest order and `Previous` at
/// the highest. Running off either end wraps when `wrap` is set.
pub fn pick_sequential(
    candidates: &[(usize, i32)],
    current: Option<i32>,
    dir: Direction,
    wrap: bool,
) -> Option<usize> {
    let first = candidates.iter().min_by_key(|(_, o)| *o).map(|(i, _)| *i);
    let last = candidates.iter().max_by_key(|(_, o)| *o).map(|(i, _)| *i);
    let Some(cur) = current else {
        return if dir == Direction::Previous { last } else { first };
    };
    let found = match dir {
        Direction::Previous => candidates
            .iter()
            .filter(|(_, o)| *o < cur)
            .max_by_key(|(_, o)| *o),
        _ => candidates
            .iter()
            .filter(|(_, o)| *o > cur)
            .min_by_key(|(_, o)| *o),
    };
    match found {
        Some((i, _)) => Some(*i),
        None if wrap => {
            let w = if dir == Direction::Previous { last } else { first };
            // a lone focused candidate has nowhere to go
            w.filter(|_| candidates.len() > 1 || candidates.iter().all(|(_, o)| *o != cur))
        }
        None => None,
    }
}

/// Nearest candidate in a screen direction, measured between the facing edge
/// midpoints of `from` and each candidate.
pub fn pick_directional(from: Rect, candidates: &[(usize, Rect)], dir: Direction) -> Option<usize> {
    let start = match dir {
        Direction::Up => Vec2::new(from.x + from.w / 2.0, from.y),
        Direction::Down => Vec2::new(from.x + from.w / 2.0, from.bottom()),
        Direction::Left => Vec2::new(from.x, from.y + from.h / 2.0),
        Direction::Right => Vec2::new(from.right(), from.y + from.h / 2.0),
        Direction::Next | Direction::Previous => return None,
    };
    let mut best: Option<(usize, f32)> = None;
    for (i, r) in candidates {
        let end = match dir {
            Direction::Up => Vec2::new(r.x + r.w / 2.0, r.bottom()),
            Direction::Down => Vec2::new(r.x + r.w / 2.0, r.y),
            Direction::Left => Vec2::new(r.right(), r.y + r.h / 2.0),
            _ => Vec2::new(r.x, r.y + r.h / 2.0),
        };
        let ahead = match dir {
            Direction::Up => end.y <= start.y,
            Direction::Down => end.y >= start.y,
            Direction::Left => end.x <= start.x,
            _ => end.x >= start.x,
        };
        if !ahead {
            continue;
        }
        let d = start.distance(end);
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((*i, d));
        }
    }
    best.map(|(i, _)| i)
}
