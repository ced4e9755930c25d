//! # Scroll model
//!
//! A scrolling container owns one [`ScrollState`]. It stores the clip size
//! (visible content area), the total content extent computed by the layout,
//! the current offset and the kinetic velocity.
//!
//! The offset is always `<= 0`: content moves up/left as you scroll. After
//! every mutation it is clamped to
//!
//! ```text
//! [-(max(0, total - clip)), 0]
//! ```
//!
//! per axis, and an axis that hits an edge loses its velocity.
//!
//! Input feeds the state in three ways:
//!
//! - touch drag: `press` / `drag` / `release`; release computes fling
//!   velocity from the distance travelled since the last direction change;
//! - wheel: `wheel(delta)` adds to the vertical velocity;
//! - scrollbar: `page` jumps by a fifth of the content, `drag_thumb` moves the
//!   content proportionally to the thumb.
//!
//! `advance` integrates velocity once per frame, applies friction and
//! drives the scrollbar auto-hide fade.

use formwork_core::*;
use web_time::{Duration, Instant};

bitflags::bitflags! {
    /// Axes a container may scroll along. Empty means no scrolling.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ScrollDirections: u8 {
        const HORIZONTAL = 0x01;
        const VERTICAL = 0x02;
        const BOTH = Self::HORIZONTAL.bits() | Self::VERTICAL.bits();
    }
}

impl ScrollDirections {
    pub const NONE: ScrollDirections = ScrollDirections::empty();

    /// Parses `SCROLL_NONE`, `SCROLL_HORIZONTAL`, `SCROLL_VERTICAL`, `SCROLL_BOTH`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SCROLL_NONE" | "NONE" => Some(Self::NONE),
            "SCROLL_HORIZONTAL" | "HORIZONTAL" => Some(Self::HORIZONTAL),
            "SCROLL_VERTICAL" | "VERTICAL" => Some(Self::VERTICAL),
            "SCROLL_BOTH" | "BOTH" => Some(Self::BOTH),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScrollConfig {
    /// Multiplier on the per-second decay; 0 disables friction.
    pub friction: f32,
    pub friction_factor: f32,
    /// Speed (px/s) below which an axis stops.
    pub stop_speed: f32,
    /// A pointer resting longer than this before release gets no fling.
    pub inertia_delay: Duration,
    /// Drag distance after which the container counts as scrolling.
    pub threshold: f32,
    /// Pixels per second added per wheel notch.
    pub wheel_speed: f32,
    /// Keyboard/gamepad scroll speed in px/s.
    pub key_speed: f32,
    pub fade_duration: Duration,
    pub auto_hide: bool,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            friction: 1.0,
            friction_factor: 5.0,
            stop_speed: 100.0,
            inertia_delay: Duration::from_millis(100),
            threshold: 10.0,
            wheel_speed: 400.0,
            key_speed: 500.0,
            fade_duration: Duration::from_millis(500),
            auto_hide: true,
        }
    }
}

/// Clamps `pos` into `[-(max(0,total-clip)), 0]` per axis.
///
/// Non-finite input collapses to 0 so degenerate sizes never leak NaN into
/// layout.
pub fn clamp_offset(pos: Vec2, total: Size, clip: Size) -> Vec2 {
    fn axis(p: f32, total: f32, clip: f32) -> f32 {
        let min = -(total - clip).max(0.0);
        if !p.is_finite() || !min.is_finite() {
            return 0.0;
        }
        p.clamp(min, 0.0)
    }
    Vec2::new(
        axis(pos.x, total.width, clip.width),
        axis(pos.y, total.height, clip.height),
    )
}

#[derive(Clone, Copy, Debug)]
struct AxisTrack {
    first: f32,
    start: Instant,
    forward: bool,
}

#[derive(Clone, Debug)]
struct Drag {
    contact: u32,
    very_first: Vec2,
    last: Vec2,
    last_move: Instant,
    x: AxisTrack,
    y: AxisTrack,
}

#[derive(Clone, Debug)]
pub struct ScrollState {
    directions: ScrollDirections,
    config: ScrollConfig,

    position: Vec2,
    velocity: Vec2,
    total: Size,
    clip: Size,

    drag: Option<Drag>,
    thumb: Option<(Axis, f32)>,

    opacity: f32,
    fade: Option<Tween>,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::new(ScrollDirections::NONE, ScrollConfig::default())
    }
}

impl ScrollState {
    pub fn new(directions: ScrollDirections, config: ScrollConfig) -> Self {
        Self {
            directions,
            config,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            total: Size::default(),
            clip: Size::default(),
            drag: None,
            thumb: None,
            opacity: 1.0,
            fade: None,
        }
    }

    pub fn directions(&self) -> ScrollDirections {
        self.directions
    }

    pub fn set_directions(&mut self, directions: ScrollDirections) {
        self.directions = directions;
        self.clamp();
    }

    pub fn is_enabled(&self) -> bool {
        !self.directions.is_empty()
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ScrollConfig {
        &mut self.config
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, pos: Vec2) {
        self.position = pos;
        self.clamp();
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn total(&self) -> Size {
        self.total
    }

    pub fn clip(&self) -> Size {
        self.clip
    }

    /// Records the content extent and visible size from the latest layout.
    pub fn set_extents(&mut self, total: Size, clip: Size) {
        self.total = Size::new(total.width.max(0.0), total.height.max(0.0));
        self.clip = Size::new(clip.width.max(0.0), clip.height.max(0.0));
        self.clamp();
    }

    fn clamp(&mut self) {
        let mut p = clamp_offset(self.position, self.total, self.clip);
        if !self.directions.contains(ScrollDirections::HORIZONTAL) {
            p.x = 0.0;
        }
        if !self.directions.contains(ScrollDirections::VERTICAL) {
            p.y = 0.0;
        }
        if p.x != self.position.x {
            self.velocity.x = 0.0;
        }
        if p.y != self.position.y {
            self.velocity.y = 0.0;
        }
        self.position = p;
    }

    fn gate(&self, d: Vec2) -> Vec2 {
        Vec2::new(
            if self.directions.contains(ScrollDirections::HORIZONTAL) {
                d.x
            } else {
                0.0
            },
            if self.directions.contains(ScrollDirections::VERTICAL) {
                d.y
            } else {
                0.0
            },
        )
    }

    fn wake(&mut self) {
        self.opacity = 1.0;
        self.fade = None;
    }

    /// A drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some() || self.thumb.is_some()
    }

    /// The current drag has moved beyond the scroll threshold.
    pub fn is_scrolling(&self) -> bool {
        match &self.drag {
            Some(d) => {
                (d.last.x - d.very_first.x).abs() > self.config.threshold
                    || (d.last.y - d.very_first.y).abs() > self.config.threshold
            }
            None => false,
        }
    }

    /// Dragging or still moving under inertia.
    pub fn is_active(&self) -> bool {
        self.is_dragging() || !self.velocity.is_zero()
    }

    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
        self.drag = None;
        self.thumb = None;
    }

    /// Sets velocity directly (keyboard/gamepad scrolling).
    pub fn start(&mut self, velocity: Vec2) {
        self.velocity = self.gate(velocity);
        self.wake();
    }

    // Touch

    /// Starts tracking a drag. Never consumes: a press may still reach a
    /// child underneath. Only one contact drives the drag; presses from other
    /// contacts are ignored until it is released.
    pub fn press(&mut self, pos: Vec2, contact: u32, now: Instant) {
        if self.drag.as_ref().is_some_and(|d| d.contact != contact) {
            return;
        }
        let track = |first| AxisTrack {
            first,
            start: now,
            forward: false,
        };
        self.drag = Some(Drag {
            contact,
            very_first: pos,
            last: pos,
            last_move: now,
            x: track(pos.x),
            y: track(pos.y),
        });
        self.velocity = Vec2::ZERO;
        self.wake();
    }

    /// Moves the content by the pointer delta. Returns whether the drag was
    /// tracked for this contact.
    pub fn drag(&mut self, pos: Vec2, contact: u32, now: Instant) -> bool {
        let Some(d) = self.drag.as_mut() else {
            return false;
        };
        if d.contact != contact {
            return false;
        }
        let delta = pos - d.last;
        for (v, p, t) in [(delta.x, pos.x, &mut d.x), (delta.y, pos.y, &mut d.y)] {
            if (v > 0.0 && !t.forward) || (v < 0.0 && t.forward) {
                t.forward = !t.forward;
                t.first = p;
                t.start = now;
            }
        }
        d.last = pos;
        d.last_move = now;

        let delta = self.gate(delta);
        if !delta.is_zero() {
            self.position += delta;
            self.clamp();
            self.wake();
        }
        true
    }

    /// Ends the drag and computes fling velocity.
    pub fn release(&mut self, contact: u32, now: Instant) -> bool {
        self.thumb = None;
        let Some(d) = self.drag.take_if(|d| d.contact == contact) else {
            return false;
        };
        if now.saturating_duration_since(d.last_move) > self.config.inertia_delay {
            self.velocity = Vec2::ZERO;
            return true;
        }
        let speed = |dist: f32, start: Instant| {
            let secs = now.saturating_duration_since(start).as_secs_f32();
            if secs > 0.0 { dist / secs } else { 0.0 }
        };
        let v = Vec2::new(
            speed(d.last.x - d.x.first, d.x.start),
            speed(d.last.y - d.y.first, d.y.start),
        );
        self.velocity = self.gate(v);
        log::trace!("fling {:?}", self.velocity);
        true
    }

    // Mouse

    /// Wheel notch: positive scrolls towards the top.
    pub fn wheel(&mut self, delta: i32) {
        if !self.directions.contains(ScrollDirections::VERTICAL) {
            return;
        }
        self.velocity.y += self.config.wheel_speed * delta as f32;
        self.wake();
    }

    /// Track click: jumps a fifth of the content towards the start or end.
    pub fn page(&mut self, axis: Axis, towards_start: bool) {
        let step = match axis {
            Axis::Horizontal => self.total.width / 5.0,
            Axis::Vertical => self.total.height / 5.0,
        };
        let step = if towards_start { step } else { -step };
        match axis {
            Axis::Horizontal => self.position.x += step,
            Axis::Vertical => self.position.y += step,
        }
        self.velocity = Vec2::ZERO;
        self.clamp();
        self.wake();
    }

    pub fn begin_thumb_drag(&mut self, axis: Axis, pointer: f32) {
        self.thumb = Some((axis, pointer));
        self.velocity = Vec2::ZERO;
        self.wake();
    }

    pub fn thumb_drag_axis(&self) -> Option<Axis> {
        self.thumb.map(|(axis, _)| axis)
    }

    /// Moves the content so the thumb follows the pointer.
    pub fn drag_thumb(&mut self, pointer: f32) -> bool {
        let Some((axis, last)) = self.thumb else {
            return false;
        };
        let (total, clip) = match axis {
            Axis::Horizontal => (self.total.width, self.clip.width),
            Axis::Vertical => (self.total.height, self.clip.height),
        };
        if clip > 0.0 {
            let d = (pointer - last) * total / clip;
            match axis {
                Axis::Horizontal => self.position.x -= d,
                Axis::Vertical => self.position.y -= d,
            }
            self.clamp();
        }
        self.thumb = Some((axis, pointer));
        true
    }

    /// Thumb start and length along `axis`, inside the clip. `None` when the
    /// content fits or the axis does not scroll.
    pub fn thumb(&self, axis: Axis) -> Option<(f32, f32)> {
        let (flag, total, clip, pos) = match axis {
            Axis::Horizontal => (
                ScrollDirections::HORIZONTAL,
                self.total.width,
                self.clip.width,
                self.position.x,
            ),
            Axis::Vertical => (
                ScrollDirections::VERTICAL,
                self.total.height,
                self.clip.height,
                self.position.y,
            ),
        };
        if !self.directions.contains(flag) || total <= clip || total <= 0.0 {
            return None;
        }
        Some((-pos / total * clip, clip / total * clip))
    }

    pub fn scrollbar_opacity(&self) -> f32 {
        self.opacity
    }

    /// Integrates one frame. Returns whether anything visible changed.
    pub fn advance(&mut self, time: &FrameTime) -> bool {
        let before = (self.position, self.opacity);
        let dt = time.elapsed_secs();

        if !self.is_dragging() && !self.velocity.is_zero() && dt > 0.0 {
            self.position += Vec2::new(self.velocity.x * dt, self.velocity.y * dt);

            let damping =
                (1.0 - self.config.friction * self.config.friction_factor * dt).clamp(0.0, 1.0);
            self.velocity = Vec2::new(self.velocity.x * damping, self.velocity.y * damping);
            if self.velocity.x.abs() < self.config.stop_speed {
                self.velocity.x = 0.0;
            }
            if self.velocity.y.abs() < self.config.stop_speed {
                self.velocity.y = 0.0;
            }
        }
        self.clamp();

        if self.config.auto_hide && !self.is_active() {
            if self.fade.is_none() && self.opacity > 0.0 {
                self.fade = Some(Tween::new(
                    self.opacity,
                    0.0,
                    time.now,
                    self.config.fade_duration,
                    Easing::EaseInOut,
                ));
            }
            if let Some(f) = &self.fade {
                let (v, done) = f.sample(time.now);
                self.opacity = v;
                if done {
                    self.fade = None;
                }
            }
        }

        (self.position, self.opacity) != before
    }
}
