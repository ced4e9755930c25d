//! # Control contract
//!
//! Every element in a form implements [`Control`]. Shared geometry, state,
//! dirtiness and listeners live in a composed [`ControlBase`]; widget kinds
//! add only what is specific to them.
//!
//! Coordinates:
//!
//! - `bounds` is local: relative to the parent's content origin (after the
//!   parent's border and padding), before the parent's scroll offset.
//! - `update(clip, offset)` resolves absolute geometry. `offset` is the
//!   absolute content origin of the parent plus its scroll position; `clip`
//!   is the parent's visible content rect.
//! - Input arrives in the control's own local space (`(0,0)` is its top-left
//!   corner).
//!
//! Dirtiness is an explicit transition: setters call `mark_dirty()` only when
//! a value actually changes, and the draw pass calls `consume_dirty()` once it
//! has rendered the control.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use formwork_core::*;
use smallvec::SmallVec;
use web_time::Instant;

use crate::container::Container;

pub type ControlRef = Rc<RefCell<dyn Control>>;

/// Wraps a concrete control into a shared reference.
pub fn share<C: Control + 'static>(c: C) -> ControlRef {
    Rc::new(RefCell::new(c))
}

bitflags::bitflags! {
    /// Dimensions sized automatically instead of explicitly.
    ///
    /// `WIDTH`/`HEIGHT` stretch to the parent's content rect. `FIT_*` shrink a
    /// container around its children and are ignored by other controls.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct AutoSize: u8 {
        const WIDTH = 0x01;
        const HEIGHT = 0x02;
        const BOTH = Self::WIDTH.bits() | Self::HEIGHT.bits();
        const FIT_WIDTH = 0x04;
        const FIT_HEIGHT = 0x08;
        const FIT = Self::FIT_WIDTH.bits() | Self::FIT_HEIGHT.bits();
    }
}

bitflags::bitflags! {
    /// Bounds components given as a fraction of the parent's content size.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Relative: u8 {
        const X = 0x01;
        const Y = 0x02;
        const WIDTH = 0x04;
        const HEIGHT = 0x08;
    }
}

bitflags::bitflags! {
    /// Listener event mask.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct EventKind: u16 {
        const PRESS = 0x01;
        const RELEASE = 0x02;
        const CLICK = 0x04;
        const VALUE_CHANGED = 0x08;
        const FOCUS_GAINED = 0x200;
        const FOCUS_LOST = 0x400;
    }
}

pub type Listener = Rc<dyn Fn(&str, EventKind)>;

/// Per-dispatch data handed down the tree with every input event.
#[derive(Clone, Copy, Debug)]
pub struct EventContext {
    pub now: Instant,
    /// The parent container has been dragged past its scroll threshold; a
    /// release must not turn into a click.
    pub parent_scrolling: bool,
    /// Dispatch is inside a container that was reached through another
    /// container's focus chain; focus traversal must not wrap here.
    pub nested: bool,
}

impl EventContext {
    pub fn new(now: Instant) -> Self {
        Self {
            now,
            parent_scrolling: false,
            nested: false,
        }
    }
}

pub struct ControlBase {
    id: String,
    style: Rc<Style>,
    state: State,
    bounds: Rect,
    auto_size: AutoSize,
    relative: Relative,
    /// Fractions for the components flagged in `relative`.
    fractions: Rect,
    alignment: Alignment,
    visible: bool,
    can_focus: bool,
    consume_input_events: bool,
    z_index: Option<i32>,
    focus_index: Option<i32>,
    inherited_opacity: f32,
    dirty: bool,

    absolute_bounds: Rect,
    absolute_clip: Rect,
    viewport: Rect,
    viewport_clip: Rect,

    listeners: SmallVec<[(EventKind, Listener); 2]>,
}

impl std::fmt::Debug for ControlBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlBase")
            .field("id", &self.id)
            .field("style", &self.style.id)
            .field("state", &self.state)
            .field("bounds", &self.bounds)
            .field("visible", &self.visible)
            .field("dirty", &self.dirty)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ControlBase {
    pub fn new(id: impl Into<String>, style: Rc<Style>) -> Self {
        Self {
            id: id.into(),
            style,
            state: State::Normal,
            bounds: Rect::default(),
            auto_size: AutoSize::empty(),
            relative: Relative::empty(),
            fractions: Rect::default(),
            alignment: Alignment::TOP_LEFT,
            visible: true,
            can_focus: false,
            consume_input_events: true,
            z_index: None,
            focus_index: None,
            inherited_opacity: 1.0,
            dirty: true,
            absolute_bounds: Rect::default(),
            absolute_clip: Rect::default(),
            viewport: Rect::default(),
            viewport_clip: Rect::default(),
            listeners: SmallVec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn style(&self) -> &Rc<Style> {
        &self.style
    }

    pub fn set_style(&mut self, style: Rc<Style>) {
        if !Rc::ptr_eq(&self.style, &style) {
            self.style = style;
            self.mark_dirty();
        }
    }

    // State

    pub fn state(&self) -> State {
        self.state
    }

    /// Any state is reachable from any other; legality is the caller's call.
    /// Returns whether the state changed.
    pub fn set_state(&mut self, state: State) -> bool {
        if self.state == state {
            return false;
        }
        log::trace!("{}: {:?} -> {:?}", self.id, self.state, state);
        self.state = state;
        self.mark_dirty();
        true
    }

    pub fn is_enabled(&self) -> bool {
        self.state != State::Disabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        match (enabled, self.state) {
            (false, _) => {
                self.set_state(State::Disabled);
            }
            (true, State::Disabled) => {
                self.set_state(State::Normal);
            }
            _ => {}
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.mark_dirty();
        }
    }

    pub fn can_focus(&self) -> bool {
        self.can_focus
    }

    pub fn set_can_focus(&mut self, can_focus: bool) {
        self.can_focus = can_focus;
    }

    pub fn consume_input_events(&self) -> bool {
        self.consume_input_events
    }

    pub fn set_consume_input_events(&mut self, consume: bool) {
        self.consume_input_events = consume;
    }

    pub fn z_index(&self) -> Option<i32> {
        self.z_index
    }

    pub fn set_z_index(&mut self, z: i32) {
        if self.z_index != Some(z) {
            self.z_index = Some(z);
            self.mark_dirty();
        }
    }

    pub fn focus_index(&self) -> Option<i32> {
        self.focus_index
    }

    pub fn set_focus_index(&mut self, index: i32) {
        self.focus_index = Some(index);
    }

    // Geometry

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn position(&self) -> Vec2 {
        self.bounds.origin()
    }

    pub fn size(&self) -> Size {
        self.bounds.size()
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        if self.bounds.x != x || self.bounds.y != y {
            self.bounds.x = x;
            self.bounds.y = y;
            self.mark_dirty();
        }
    }

    /// Explicit size. Clears the matching auto-size flags.
    pub fn set_size(&mut self, w: f32, h: f32) {
        self.auto_size = AutoSize::empty();
        self.fit_size(w, h);
    }

    /// Size written by a layout; keeps auto-size flags intact.
    pub fn fit_size(&mut self, w: f32, h: f32) {
        let (w, h) = (w.max(0.0), h.max(0.0));
        if self.bounds.w != w || self.bounds.h != h {
            self.bounds.w = w;
            self.bounds.h = h;
            self.mark_dirty();
        }
    }

    pub fn set_bounds(&mut self, r: Rect) {
        self.set_position(r.x, r.y);
        self.set_size(r.w, r.h);
    }

    pub fn auto_size(&self) -> AutoSize {
        self.auto_size
    }

    pub fn set_auto_size(&mut self, auto: AutoSize) {
        if self.auto_size != auto {
            self.auto_size = auto;
            self.mark_dirty();
        }
    }

    pub fn relative(&self) -> Relative {
        self.relative
    }

    /// Makes one bounds component a fraction of the parent's content size,
    /// or an absolute value again with `None`.
    pub fn set_relative(&mut self, part: Relative, fraction: Option<f32>) {
        let f = fraction.unwrap_or_default();
        for (flag, slot) in [
            (Relative::X, &mut self.fractions.x),
            (Relative::Y, &mut self.fractions.y),
            (Relative::WIDTH, &mut self.fractions.w),
            (Relative::HEIGHT, &mut self.fractions.h),
        ] {
            if part.contains(flag) {
                *slot = f;
            }
        }
        self.relative.set(part, fraction.is_some());
        self.mark_dirty();
    }

    /// Writes relative components against `parent`, the content size of the
    /// parent container. Called by layouts before placement.
    pub fn resolve_relative(&mut self, parent: Size) {
        if self.relative.is_empty() {
            return;
        }
        let r = self.bounds;
        let f = self.fractions;
        let pick = |flag, fraction: f32, extent: f32, current: f32| {
            if self.relative.contains(flag) {
                fraction * extent
            } else {
                current
            }
        };
        let x = pick(Relative::X, f.x, parent.width, r.x);
        let y = pick(Relative::Y, f.y, parent.height, r.y);
        let w = pick(Relative::WIDTH, f.w, parent.width, r.w);
        let h = pick(Relative::HEIGHT, f.h, parent.height, r.h);
        self.set_position(x, y);
        self.fit_size(w, h);
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        if self.alignment != alignment {
            self.alignment = alignment;
            self.mark_dirty();
        }
    }

    pub fn border(&self) -> Insets {
        self.style.border(self.state)
    }

    pub fn padding(&self) -> Insets {
        self.style.padding()
    }

    pub fn margin(&self) -> Insets {
        self.style.margin()
    }

    pub fn opacity(&self) -> f32 {
        self.style.opacity(self.state) * self.inherited_opacity
    }

    pub fn set_inherited_opacity(&mut self, opacity: f32) {
        self.inherited_opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn absolute_bounds(&self) -> Rect {
        self.absolute_bounds
    }

    pub fn absolute_clip(&self) -> Rect {
        self.absolute_clip
    }

    /// Absolute content rect: bounds minus border and padding.
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn viewport_clip(&self) -> Rect {
        self.viewport_clip
    }

    /// Resolves absolute geometry. Pure function of bounds, style, `clip`
    /// and `offset`; calling it again with the same inputs changes nothing.
    pub fn update_bounds(&mut self, clip: Rect, offset: Vec2) {
        self.absolute_bounds = self.bounds.translate(offset);
        self.absolute_clip = self.absolute_bounds.intersect(&clip);
        self.viewport = self.absolute_bounds.inset(self.border() + self.padding());
        self.viewport_clip = self.viewport.intersect(&clip);
    }

    /// Local rect that receives input, `(0,0)` at the top-left corner.
    pub fn local_rect(&self) -> Rect {
        Rect::from_size(self.size())
    }

    // Dirtiness

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clears the flag, returning whether it was set.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    // Listeners

    pub fn add_listener(&mut self, mask: EventKind, f: impl Fn(&str, EventKind) + 'static) {
        self.listeners.push((mask, Rc::new(f)));
    }

    pub fn notify(&self, kind: EventKind) {
        for (mask, l) in &self.listeners {
            if mask.contains(kind) {
                l(&self.id, kind);
            }
        }
    }

    /// Press/release behaviour shared by pressable controls.
    ///
    /// Returns `false` without touching anything when the control does not
    /// consume input.
    pub fn handle_touch(&mut self, evt: TouchEvent, pos: Vec2, cx: &EventContext) -> bool {
        if !self.consume_input_events || !self.is_enabled() {
            return false;
        }
        match evt {
            TouchEvent::Press => {
                if !self.local_rect().contains(pos) {
                    return false;
                }
                self.set_state(State::Active);
                self.notify(EventKind::PRESS);
                true
            }
            TouchEvent::Release => {
                if self.state != State::Active {
                    return false;
                }
                let click = self.releases_click(evt, pos, cx);
                self.set_state(State::Normal);
                self.notify(EventKind::RELEASE);
                if click {
                    self.notify(EventKind::CLICK);
                }
                true
            }
            TouchEvent::Move => self.state == State::Active,
        }
    }

    /// Whether this event completes a click: a release inside a pressed
    /// control whose parent is not mid-scroll.
    pub fn releases_click(&self, evt: TouchEvent, pos: Vec2, cx: &EventContext) -> bool {
        evt == TouchEvent::Release
            && self.consume_input_events
            && self.state == State::Active
            && self.local_rect().contains(pos)
            && !cx.parent_scrolling
    }

    /// Background and border sprites for the current state.
    pub fn draw_skin(&self, scene: &mut Scene) {
        let r = self.absolute_bounds;
        if r.is_empty() {
            return;
        }
        let opacity = self.opacity();
        if let Some(bg) = self.style.background(self.state) {
            scene.push(SceneNode::Rect {
                rect: r,
                color: bg.mul_alpha(opacity),
            });
        }
        let border = self.border();
        if let Some(color) = self.style.border_color(self.state) {
            let width = border
                .left
                .max(border.right)
                .max(border.top)
                .max(border.bottom);
            if width > 0.0 {
                scene.push(SceneNode::Border {
                    rect: r,
                    color: color.mul_alpha(opacity),
                    width,
                });
            }
        }
    }
}

/// The per-frame contract every element honours.
pub trait Control: Any {
    fn base(&self) -> &ControlBase;
    fn base_mut(&mut self) -> &mut ControlBase;

    fn type_name(&self) -> &'static str;

    /// Recomputes render-facing geometry. Must be idempotent.
    fn update(&mut self, clip: Rect, offset: Vec2) {
        self.base_mut().update_bounds(clip, offset);
    }

    /// Advances time-driven state (scroll inertia, fades).
    fn tick(&mut self, _time: &FrameTime) {}

    /// Returns whether the event was consumed. An unconsumed event leaves the
    /// control untouched.
    fn touch_event(
        &mut self,
        evt: TouchEvent,
        pos: Vec2,
        _contact: u32,
        cx: &mut EventContext,
    ) -> bool {
        self.base_mut().handle_touch(evt, pos, cx)
    }

    /// Mouse-specific handling; unhandled presses/moves/releases are retried
    /// as touch events by the caller.
    fn mouse_event(
        &mut self,
        _evt: MouseEvent,
        _pos: Vec2,
        _wheel_delta: i32,
        _cx: &mut EventContext,
    ) -> bool {
        false
    }

    fn key_event(&mut self, _evt: KeyEvent, _key: Key, _cx: &mut EventContext) -> bool {
        false
    }

    /// First pass: border, background and image sprites.
    fn draw_images(&self, scene: &mut Scene, _clip: Rect) {
        self.base().draw_skin(scene);
    }

    /// Second pass: text.
    fn draw_text(&self, _scene: &mut Scene, _clip: Rect) {}

    fn draw(&self, scene: &mut Scene, clip: Rect) {
        if !self.base().is_visible() {
            return;
        }
        self.draw_images(scene, clip);
        self.draw_text(scene, clip);
    }

    fn is_dirty(&self) -> bool {
        self.base().is_dirty()
    }

    fn clear_dirty(&mut self) {
        self.base_mut().consume_dirty();
    }

    /// Whether focus traversal may land on (or inside) this control.
    fn can_receive_focus(&self) -> bool {
        let b = self.base();
        b.is_visible() && b.is_enabled() && b.can_focus()
    }

    fn as_container(&self) -> Option<&Container> {
        None
    }

    fn as_container_mut(&mut self) -> Option<&mut Container> {
        None
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Routes an unhandled mouse event to the touch handler.
pub(crate) fn mouse_or_touch(
    c: &mut dyn Control,
    evt: MouseEvent,
    pos: Vec2,
    wheel: i32,
    cx: &mut EventContext,
) -> bool {
    if c.mouse_event(evt, pos, wheel, cx) {
        return true;
    }
    match evt.as_touch() {
        Some(t) => c.touch_event(t, pos, 0, cx),
        None => false,
    }
}
