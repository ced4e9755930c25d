//! # Container
//!
//! A control that owns an ordered list of children, lays them out with a
//! [`Layout`], routes input to them, scrolls, and tracks keyboard focus.
//!
//! Children are shared (`ControlRef`): adding a control to a second container
//! keeps both references alive and dropping one leaves the other working.
//! There are no parent pointers; everything flows top-down.
//!
//! Update runs in two phases:
//!
//! 1. child containers update first so their own children settle;
//! 2. the layout positions this container's children and refreshes the dirty
//!    ones (or all of them when the viewport or scroll offset moved).
//!
//! Pointer dispatch:
//!
//! - a child already `Active` receives the event wherever it lands (capture);
//! - otherwise the first child, in list order, whose bounds contain the point
//!   and that consumes the event wins;
//! - positions are translated into the child's local space (content inset,
//!   scroll offset and child position removed);
//! - afterwards the container sets its own state, `Active` on press and
//!   `Normal` on release, whether or not a child consumed the event.
//!
//! Scrolling observes drags in the content area even when a child captured
//! them, which is how a drag that started on a button cancels its click.

use std::any::Any;
use std::rc::Rc;

use formwork_core::*;
use smallvec::SmallVec;

use crate::control::{
    AutoSize, Control, ControlBase, ControlRef, EventContext, EventKind, Relative, mouse_or_touch,
};
use crate::focus::{Direction, FocusRepeat, pick_directional, pick_sequential};
use crate::layout::{Layout, LayoutContext};
use crate::scroll::{Axis, ScrollConfig, ScrollDirections, ScrollState};

pub struct Container {
    base: ControlBase,
    controls: Vec<ControlRef>,
    layout: Layout,
    scroll: ScrollState,

    focus: Option<usize>,
    focus_repeat: FocusRepeat,
    shift_down: bool,

    /// Absolute content rect (scrollbars excluded) and its clip.
    content: Rect,
    content_clip: Rect,
    /// Vertical bar width, horizontal bar height.
    bars: Size,
    last_layout: Option<(Rect, Rect, Vec2)>,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("base", &self.base)
            .field("controls", &self.controls.len())
            .field("layout", &self.layout)
            .field("scroll", &self.scroll.directions())
            .field("focus", &self.focus)
            .finish()
    }
}

impl Container {
    pub fn new(id: impl Into<String>, style: Rc<Style>) -> Self {
        let mut base = ControlBase::new(id, style);
        base.set_consume_input_events(false);
        Self {
            base,
            controls: Vec::new(),
            layout: Layout::Absolute,
            scroll: ScrollState::default(),
            focus: None,
            focus_repeat: FocusRepeat::default(),
            shift_down: false,
            content: Rect::default(),
            content_clip: Rect::default(),
            bars: Size::default(),
            last_layout: None,
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.set_layout(layout);
        self
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// `Layout::Scroll` turns on scrolling in both directions unless a
    /// direction was already chosen.
    pub fn set_layout(&mut self, layout: Layout) {
        if self.layout == layout {
            return;
        }
        self.layout = layout;
        if layout == Layout::Scroll && !self.scroll.is_enabled() {
            self.scroll.set_directions(ScrollDirections::BOTH);
        }
        self.last_layout = None;
        self.base.mark_dirty();
    }

    pub fn content_rect(&self) -> Rect {
        self.content
    }

    pub fn content_clip(&self) -> Rect {
        self.content_clip
    }

    // Children

    pub fn controls(&self) -> &[ControlRef] {
        &self.controls
    }

    pub fn control_count(&self) -> usize {
        self.controls.len()
    }

    pub fn index_of(&self, control: &ControlRef) -> Option<usize> {
        self.controls.iter().position(|c| Rc::ptr_eq(c, control))
    }

    /// Appends a shared reference and returns its index. Adding a control
    /// that is already a child returns its current index.
    pub fn add_control(&mut self, control: &ControlRef) -> Result<usize> {
        if let Some(i) = self.index_of(control) {
            return Ok(i);
        }
        self.adopt(control)?;
        self.controls.push(control.clone());
        self.base.mark_dirty();
        Ok(self.controls.len() - 1)
    }

    pub fn insert_control(&mut self, control: &ControlRef, index: usize) -> Result<()> {
        if index > self.controls.len() {
            return Err(UiError::IndexOutOfRange {
                index,
                len: self.controls.len(),
            });
        }
        if self.index_of(control).is_some() {
            return Ok(());
        }
        self.adopt(control)?;
        self.controls.insert(index, control.clone());
        if let Some(f) = self.focus.as_mut()
            && *f >= index
        {
            *f += 1;
        }
        self.base.mark_dirty();
        Ok(())
    }

    /// Assigns default z and focus order.
    fn adopt(&self, control: &ControlRef) -> Result<()> {
        let next_focus = self
            .controls
            .iter()
            .filter_map(|c| c.borrow().base().focus_index())
            .max()
            .map_or(0, |m| m + 1);
        // A control already mutably borrowed is the container being edited.
        let Ok(mut c) = control.try_borrow_mut() else {
            return Err(UiError::SelfInsertion(self.base.id().to_string()));
        };
        let b = c.base_mut();
        if b.z_index().is_none() {
            b.set_z_index(self.controls.len() as i32);
        }
        if b.focus_index().is_none() {
            b.set_focus_index(next_focus);
        }
        b.mark_dirty();
        Ok(())
    }

    /// Removes and returns the child at `index`; `None` if out of range.
    pub fn remove_control(&mut self, index: usize) -> Option<ControlRef> {
        if index >= self.controls.len() {
            return None;
        }
        let c = self.controls.remove(index);
        match self.focus {
            Some(f) if f == index => self.focus = None,
            Some(f) if f > index => self.focus = Some(f - 1),
            _ => {}
        }
        if let Ok(mut c) = c.try_borrow_mut() {
            if let Some(inner) = c.as_container_mut() {
                inner.clear_focus();
            }
            if matches!(c.base().state(), State::Active | State::Focus) {
                c.base_mut().set_state(State::Normal);
            }
        }
        self.base.mark_dirty();
        Some(c)
    }

    pub fn remove_control_by_id(&mut self, id: &str) -> Option<ControlRef> {
        let i = self
            .controls
            .iter()
            .position(|c| c.borrow().base().id() == id)?;
        self.remove_control(i)
    }

    pub fn remove_control_ref(&mut self, control: &ControlRef) -> bool {
        match self.index_of(control) {
            Some(i) => self.remove_control(i).is_some(),
            None => false,
        }
    }

    pub fn control(&self, index: usize) -> Option<ControlRef> {
        self.controls.get(index).cloned()
    }

    pub fn try_control(&self, index: usize) -> Result<ControlRef> {
        self.control(index).ok_or(UiError::IndexOutOfRange {
            index,
            len: self.controls.len(),
        })
    }

    /// Depth-first search through this container and its descendants.
    pub fn control_by_id(&self, id: &str) -> Option<ControlRef> {
        for c in &self.controls {
            let b = c.borrow();
            if b.base().id() == id {
                return Some(c.clone());
            }
            if let Some(found) = b.as_container().and_then(|inner| inner.control_by_id(id)) {
                return Some(found);
            }
        }
        None
    }

    /// Number of controls in this subtree, this container included.
    pub fn count_controls(&self) -> usize {
        1 + self
            .controls
            .iter()
            .map(|c| {
                let c = c.borrow();
                c.as_container().map_or(1, Container::count_controls)
            })
            .sum::<usize>()
    }

    /// Number of dirty controls in this subtree.
    pub fn count_dirty(&self) -> usize {
        usize::from(self.base.is_dirty())
            + self
                .controls
                .iter()
                .map(|c| {
                    let c = c.borrow();
                    match c.as_container() {
                        Some(inner) => inner.count_dirty(),
                        None => usize::from(c.is_dirty()),
                    }
                })
                .sum::<usize>()
    }

    // Scrolling

    pub fn scroll(&self) -> ScrollDirections {
        self.scroll.directions()
    }

    pub fn set_scroll(&mut self, directions: ScrollDirections) {
        if self.scroll.directions() != directions {
            self.scroll.set_directions(directions);
            self.last_layout = None;
            self.base.mark_dirty();
        }
    }

    pub fn scroll_state(&self) -> &ScrollState {
        &self.scroll
    }

    pub fn scroll_config_mut(&mut self) -> &mut ScrollConfig {
        self.scroll.config_mut()
    }

    pub fn scroll_position(&self) -> Vec2 {
        self.scroll.position()
    }

    pub fn set_scroll_position(&mut self, pos: Vec2) {
        self.scroll.stop();
        self.scroll.set_position(pos);
        self.base.mark_dirty();
    }

    pub fn is_scrolling(&self) -> bool {
        self.scroll.is_scrolling()
    }

    pub fn stop_scrolling(&mut self) {
        self.scroll.stop();
    }

    /// Integrates scroll velocity for one frame.
    pub fn update_scroll(&mut self, time: &FrameTime) {
        if self.scroll.is_enabled() && self.scroll.advance(time) {
            self.base.mark_dirty();
        }
    }

    /// Press/drag/release over the content area. `pos` is content-local.
    pub fn touch_event_scroll(
        &mut self,
        evt: TouchEvent,
        pos: Vec2,
        contact: u32,
        now: web_time::Instant,
    ) -> bool {
        match evt {
            TouchEvent::Press => {
                self.scroll.press(pos, contact, now);
                false
            }
            TouchEvent::Move => {
                let moved = self.scroll.drag(pos, contact, now);
                if moved {
                    self.base.mark_dirty();
                }
                moved
            }
            TouchEvent::Release => self.scroll.release(contact, now),
        }
    }

    /// Wheel, scrollbar track and thumb handling, falling back to touch
    /// scrolling for plain drags. `pos` is content-local.
    pub fn mouse_event_scroll(
        &mut self,
        evt: MouseEvent,
        pos: Vec2,
        wheel_delta: i32,
        now: web_time::Instant,
    ) -> bool {
        match evt {
            MouseEvent::Wheel => {
                if !self.scroll.directions().contains(ScrollDirections::VERTICAL) {
                    return false;
                }
                self.scroll.wheel(wheel_delta);
                self.base.mark_dirty();
                true
            }
            MouseEvent::Press(MouseButton::Left) => {
                if let Some(axis) = self.scrollbar_at(pos) {
                    let along = match axis {
                        Axis::Horizontal => pos.x,
                        Axis::Vertical => pos.y,
                    };
                    match self.scroll.thumb(axis) {
                        Some((start, len)) if along >= start && along <= start + len => {
                            self.scroll.begin_thumb_drag(axis, along)
                        }
                        Some((start, _)) => self.scroll.page(axis, along < start),
                        None => return false,
                    }
                    self.base.mark_dirty();
                    return true;
                }
                self.touch_event_scroll(TouchEvent::Press, pos, 0, now)
            }
            MouseEvent::Move => {
                if let Some(axis) = self.thumb_axis() {
                    let along = match axis {
                        Axis::Horizontal => pos.x,
                        Axis::Vertical => pos.y,
                    };
                    if self.scroll.drag_thumb(along) {
                        self.base.mark_dirty();
                        return true;
                    }
                }
                self.touch_event_scroll(TouchEvent::Move, pos, 0, now)
            }
            MouseEvent::Release(MouseButton::Left) => {
                let was_thumb = self.thumb_axis().is_some();
                self.touch_event_scroll(TouchEvent::Release, pos, 0, now) || was_thumb
            }
            _ => false,
        }
    }

    fn thumb_axis(&self) -> Option<Axis> {
        self.scroll.thumb_drag_axis()
    }

    /// Scrollbar hit in content-local coordinates.
    fn scrollbar_at(&self, pos: Vec2) -> Option<Axis> {
        let size = self.content.size();
        let dirs = self.scroll.directions();
        if dirs.contains(ScrollDirections::VERTICAL)
            && self.bars.width > 0.0
            && Rect::new(size.width, 0.0, self.bars.width, size.height).contains(pos)
        {
            return Some(Axis::Vertical);
        }
        if dirs.contains(ScrollDirections::HORIZONTAL)
            && self.bars.height > 0.0
            && Rect::new(0.0, size.height, size.width, self.bars.height).contains(pos)
        {
            return Some(Axis::Horizontal);
        }
        None
    }

    /// Scrolls just enough to show child `index` entirely.
    fn scroll_into_view(&mut self, index: usize) {
        if !self.scroll.is_enabled() {
            return;
        }
        let Some(r) = self.controls.get(index).map(|c| c.borrow().base().bounds()) else {
            return;
        };
        let clip = self.scroll.clip();
        let mut p = self.scroll.position();
        if r.y < -p.y {
            p.y = -r.y;
        } else if r.bottom() > -p.y + clip.height {
            p.y = -(r.bottom() - clip.height);
        }
        if r.x < -p.x {
            p.x = -r.x;
        } else if r.right() > -p.x + clip.width {
            p.x = -(r.right() - clip.width);
        }
        if p != self.scroll.position() {
            log::debug!("{}: scrolling {:?} into view", self.base.id(), r);
            self.set_scroll_position(p);
        }
    }

    // Focus

    /// Index of the focused child, if any.
    pub fn focus_index(&self) -> Option<usize> {
        self.focus
    }

    /// Deepest focused control below this container.
    pub fn focused_control(&self) -> Option<ControlRef> {
        let c = self.controls.get(self.focus?)?;
        let inner = c.borrow().as_container().and_then(Container::focused_control);
        Some(inner.unwrap_or_else(|| c.clone()))
    }

    /// Focuses child `index`. Returns false if it cannot take focus.
    pub fn set_focus(&mut self, index: usize) -> bool {
        let ok = self
            .controls
            .get(index)
            .is_some_and(|c| c.borrow().can_receive_focus());
        ok && self.focus_child(index, Direction::Next, None)
    }

    pub fn clear_focus(&mut self) {
        self.focus_repeat.reset();
        if let Some(i) = self.focus.take() {
            self.blur_child(i);
        }
    }

    /// Moves focus in `dir`. `outside` is the bounds focus comes from when it
    /// enters this container from elsewhere; with `None` traversal starts at
    /// the current focus and `Next`/`Previous` wrap around.
    ///
    /// Returns false when nothing focusable lies in that direction, so the
    /// caller can scroll instead.
    pub fn move_focus(&mut self, dir: Direction, outside: Option<Rect>) -> bool {
        self.move_focus_inner(dir, outside, outside.is_none())
    }

    fn move_focus_inner(&mut self, dir: Direction, entering: Option<Rect>, wrap: bool) -> bool {
        let current = if entering.is_some() { None } else { self.focus };

        if let Some(i) = current {
            let child = self.controls.get(i).cloned();
            if let Some(child) = child {
                let moved = child
                    .borrow_mut()
                    .as_container_mut()
                    .is_some_and(|inner| inner.move_focus_inner(dir, None, false));
                if moved {
                    self.scroll_into_view(i);
                    return true;
                }
            }
        }

        let focusable: Vec<usize> = self
            .controls
            .iter()
            .enumerate()
            .filter(|(_, c)| c.borrow().can_receive_focus())
            .map(|(i, _)| i)
            .collect();
        if focusable.is_empty() {
            return false;
        }
        let order = |i: usize| {
            self.controls[i]
                .borrow()
                .base()
                .focus_index()
                .unwrap_or(i as i32)
        };
        let orders: Vec<(usize, i32)> = focusable.iter().map(|&i| (i, order(i))).collect();

        let from = entering.or_else(|| current.map(|i| self.focused_bounds(i)));
        let target = if dir.is_sequential() {
            pick_sequential(&orders, current.map(order), dir, wrap)
        } else {
            let picked = from.and_then(|from| {
                let rects: Vec<(usize, Rect)> = focusable
                    .iter()
                    .filter(|&&i| Some(i) != current)
                    .map(|&i| (i, self.controls[i].borrow().base().absolute_bounds()))
                    .collect();
                pick_directional(from, &rects, dir)
            });
            let fallback = || {
                let seq = match dir {
                    Direction::Up | Direction::Left => Direction::Previous,
                    _ => Direction::Next,
                };
                pick_sequential(&orders, None, seq, false)
            };
            match (picked, current) {
                (Some(j), _) => Some(j),
                (None, None) => fallback(),
                (None, Some(_)) => None,
            }
        };
        // a nested container holding the last focus re-enters at its start
        let target = target.or_else(|| {
            current.filter(|&i| wrap && self.controls[i].borrow().as_container().is_some())
        });

        match target {
            Some(j) => self.focus_child(j, dir, from),
            None => false,
        }
    }

    /// Absolute bounds of the deepest focused control under child `i`.
    fn focused_bounds(&self, i: usize) -> Rect {
        let c = self.controls[i].borrow();
        c.as_container()
            .and_then(Container::focused_control)
            .map(|f| f.borrow().base().absolute_bounds())
            .unwrap_or_else(|| c.base().absolute_bounds())
    }

    fn focus_child(&mut self, j: usize, dir: Direction, from: Option<Rect>) -> bool {
        let Some(target) = self.controls.get(j).cloned() else {
            return false;
        };
        let entered = {
            let mut t = target.borrow_mut();
            let own = t.base().absolute_bounds();
            match t.as_container_mut() {
                Some(inner) => {
                    let entered = inner.move_focus_inner(dir, Some(from.unwrap_or(own)), false);
                    if !entered && !inner.base().can_focus() {
                        return false;
                    }
                    entered
                }
                None => false,
            }
        };

        if let Some(old) = self.focus.filter(|&o| o != j) {
            self.blur_child(old);
        }
        {
            let mut t = target.borrow_mut();
            if !entered {
                if t.base().state() != State::Active {
                    t.base_mut().set_state(State::Focus);
                }
                t.base().notify(EventKind::FOCUS_GAINED);
            }
            log::debug!("{}: focus -> {}", self.base.id(), t.base().id());
        }
        self.focus = Some(j);
        self.scroll_into_view(j);
        self.base.mark_dirty();
        true
    }

    fn blur_child(&mut self, i: usize) {
        let Some(c) = self.controls.get(i).cloned() else {
            return;
        };
        let mut c = c.borrow_mut();
        let was_leaf = match c.as_container_mut() {
            Some(inner) => {
                let had = inner.focus.is_some();
                inner.clear_focus();
                !had
            }
            None => true,
        };
        if c.base().state() == State::Focus {
            c.base_mut().set_state(State::Normal);
        }
        if was_leaf {
            c.base().notify(EventKind::FOCUS_LOST);
        }
    }

    /// Press on a focusable child moves focus there without scrolling.
    fn focus_on_press(&mut self, i: usize) {
        if self.focus == Some(i) {
            return;
        }
        let Some(c) = self.controls.get(i).cloned() else {
            return;
        };
        let leaf = {
            let c = c.borrow();
            if !c.can_receive_focus() {
                return;
            }
            match c.as_container() {
                Some(inner) if inner.focus.is_none() => return,
                Some(_) => false,
                None => true,
            }
        };
        if let Some(old) = self.focus {
            self.blur_child(old);
        }
        self.focus = Some(i);
        if leaf {
            c.borrow().base().notify(EventKind::FOCUS_GAINED);
        }
    }

    // Dispatch

    fn content_inset(&self) -> Vec2 {
        let i = self.base.border() + self.base.padding();
        Vec2::new(i.left, i.top)
    }

    /// Routes a pointer event to the capturing child or the first hit child
    /// that consumes it. `pos` is container-local. Returns the consumer.
    fn dispatch(
        &mut self,
        pos: Vec2,
        cx: &mut EventContext,
        mut f: impl FnMut(&mut dyn Control, Vec2, &mut EventContext) -> bool,
    ) -> Option<usize> {
        let local = pos - self.content_inset();
        let p = local - self.scroll.position();
        let saved = cx.parent_scrolling;
        cx.parent_scrolling = self.scroll.is_scrolling();

        // A child container goes Active on any press inside it, so several
        // children may hold capture; each of them sees the event.
        let captured: SmallVec<[usize; 2]> = self
            .controls
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                let c = c.borrow();
                c.base().state() == State::Active && c.base().is_visible()
            })
            .map(|(i, _)| i)
            .collect();
        let mut hit = None;
        if !captured.is_empty() {
            for i in captured {
                let mut c = self.controls[i].borrow_mut();
                let child_pos = p - c.base().position();
                if f(&mut *c, child_pos, cx) && hit.is_none() {
                    hit = Some(i);
                }
            }
        } else if Rect::from_size(self.content.size()).contains(local) {
            for (i, c) in self.controls.iter().enumerate() {
                let mut c = c.borrow_mut();
                let b = c.base();
                if !b.is_visible() || !b.is_enabled() || !b.bounds().contains(p) {
                    continue;
                }
                let child_pos = p - b.position();
                if f(&mut *c, child_pos, cx) {
                    hit = Some(i);
                    break;
                }
            }
        }

        cx.parent_scrolling = saved;
        hit
    }

    /// Own state and focus bookkeeping after children have seen the event.
    fn after_pointer(&mut self, evt: TouchEvent, hit: Option<usize>) {
        match evt {
            TouchEvent::Press => {
                if let Some(i) = hit {
                    self.focus_on_press(i);
                }
                self.base.set_state(State::Active);
            }
            TouchEvent::Release => {
                if let Some(c) = self.focus.and_then(|i| self.controls.get(i)) {
                    let mut c = c.borrow_mut();
                    if c.as_container().is_none() && c.base().state() == State::Normal {
                        c.base_mut().set_state(State::Focus);
                    }
                }
                self.base.set_state(State::Normal);
            }
            TouchEvent::Move => {}
        }
    }

    /// Scrolling sees drags over children unless the child scrolls itself.
    fn scroll_observes(&self, hit: Option<usize>) -> bool {
        if !self.scroll.is_enabled() {
            return false;
        }
        match hit.and_then(|i| self.controls.get(i)) {
            Some(c) => c
                .borrow()
                .as_container()
                .is_none_or(|inner| !inner.scroll.is_enabled()),
            None => true,
        }
    }

    fn draw_scrollbars(&self, scene: &mut Scene) {
        let opacity = self.scroll.scrollbar_opacity() * self.base.opacity();
        if !self.scroll.is_enabled() || opacity <= 0.0 {
            return;
        }
        let style = self.base.style();
        let state = self.base.state();
        let c = self.content;
        for (axis, name) in [
            (Axis::Vertical, "verticalScrollBar"),
            (Axis::Horizontal, "horizontalScrollBar"),
        ] {
            let Some((start, len)) = self.scroll.thumb(axis) else {
                continue;
            };
            let rect = match axis {
                Axis::Vertical if self.bars.width > 0.0 => {
                    Rect::new(c.right(), c.y + start, self.bars.width, len)
                }
                Axis::Horizontal if self.bars.height > 0.0 => {
                    Rect::new(c.x + start, c.bottom(), len, self.bars.height)
                }
                _ => continue,
            };
            let color = style.image(name, state).color.unwrap_or(Color::WHITE);
            scene.push(SceneNode::Image {
                rect,
                image: name,
                color: color.mul_alpha(opacity),
            });
        }
    }

    /// Children first, then this container's layout. A fit-sized container
    /// then wraps its children and, if that changed its size, lays out once
    /// more with `relayout` off.
    fn arrange(&mut self, clip: Rect, offset: Vec2, relayout: bool) {
        self.base.update_bounds(clip, offset);

        let state = self.base.state();
        let style = self.base.style().clone();
        let dirs = self.scroll.directions();
        let mut content = self.base.viewport();
        self.bars = Size::default();
        if dirs.contains(ScrollDirections::VERTICAL) {
            self.bars.width = style.image("verticalScrollBar", state).width;
            content.w = (content.w - self.bars.width).max(0.0);
        }
        if dirs.contains(ScrollDirections::HORIZONTAL) {
            self.bars.height = style.image("horizontalScrollBar", state).height;
            content.h = (content.h - self.bars.height).max(0.0);
        }
        let content_clip = content.intersect(&clip);
        let scroll = self.scroll.position();

        let opacity = self.base.opacity();
        for c in &self.controls {
            let mut c = c.borrow_mut();
            c.base_mut().set_inherited_opacity(opacity);
            if c.as_container().is_some() {
                c.update(content_clip, content.origin() + scroll);
            }
        }

        let mut cx = LayoutContext {
            clip: content_clip,
            origin: content.origin(),
            content: content.size(),
            scroll_offset: scroll,
            refresh: self.last_layout != Some((content, content_clip, scroll)),
        };
        let outcome = self.layout.update(&self.controls, &cx);
        self.scroll.set_extents(outcome.extent, content.size());
        if self.scroll.position() != outcome.scroll_offset {
            cx.scroll_offset = self.scroll.position();
            cx.refresh = true;
            self.layout.update(&self.controls, &cx);
        }

        self.content = content;
        self.content_clip = content_clip;
        self.last_layout = Some((content, content_clip, self.scroll.position()));

        let fit = self.base.auto_size() & AutoSize::FIT;
        if !fit.is_empty() && self.fit_to_children(fit) && relayout {
            self.arrange(clip, offset, false);
        }
    }

    /// Sizes the `fit` axes to the far edge of the visible children plus
    /// border and padding. Children sized or placed relative to this
    /// container are left out of the measurement on that axis. Returns
    /// whether the size changed.
    fn fit_to_children(&mut self, fit: AutoSize) -> bool {
        let mut extent = Size::default();
        for c in &self.controls {
            let c = c.borrow();
            let b = c.base();
            if !b.is_visible() {
                continue;
            }
            let r = b.bounds();
            let rel = b.relative();
            if !rel.intersects(Relative::X | Relative::WIDTH) {
                extent.width = extent.width.max(r.right());
            }
            if !rel.intersects(Relative::Y | Relative::HEIGHT) {
                extent.height = extent.height.max(r.bottom());
            }
        }
        let inset = self.base.border() + self.base.padding();
        let old = self.base.size();
        let w = if fit.contains(AutoSize::FIT_WIDTH) {
            extent.width + inset.horizontal()
        } else {
            old.width
        };
        let h = if fit.contains(AutoSize::FIT_HEIGHT) {
            extent.height + inset.vertical()
        } else {
            old.height
        };
        self.base.fit_size(w, h);
        self.base.size() != old
    }

    /// Child indices in draw order: z-sorted for absolute layouts, list order
    /// otherwise.
    fn draw_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.controls.len()).collect();
        if self.layout == Layout::Absolute {
            order.sort_by_key(|&i| {
                self.controls[i]
                    .borrow()
                    .base()
                    .z_index()
                    .unwrap_or(i as i32)
            });
        }
        order
    }
}

impl Control for Container {
    fn base(&self) -> &ControlBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.base
    }
    fn type_name(&self) -> &'static str {
        "Container"
    }

    fn update(&mut self, clip: Rect, offset: Vec2) {
        self.arrange(clip, offset, true);
    }

    fn tick(&mut self, time: &FrameTime) {
        for c in &self.controls {
            c.borrow_mut().tick(time);
        }
        self.update_scroll(time);
    }

    fn touch_event(
        &mut self,
        evt: TouchEvent,
        pos: Vec2,
        contact: u32,
        cx: &mut EventContext,
    ) -> bool {
        if !self.base.is_enabled() || !self.base.is_visible() || contact >= MAX_CONTACT_INDICES {
            return false;
        }
        let hit = self.dispatch(pos, cx, |c, p, cx| c.touch_event(evt, p, contact, cx));
        let consumed = hit.is_some();

        let local = pos - self.content_inset();
        let inside = Rect::from_size(self.content.size()).contains(local);
        let scrolled = self.scroll_observes(hit)
            && (evt != TouchEvent::Press || inside)
            && self.touch_event_scroll(evt, local, contact, cx.now);

        self.after_pointer(evt, hit);
        consumed || scrolled || self.base.consume_input_events()
    }

    fn mouse_event(
        &mut self,
        evt: MouseEvent,
        pos: Vec2,
        wheel_delta: i32,
        cx: &mut EventContext,
    ) -> bool {
        if !self.base.is_enabled() || !self.base.is_visible() {
            return false;
        }
        let hit = self.dispatch(pos, cx, |c, p, cx| {
            mouse_or_touch(c, evt, p, wheel_delta, cx)
        });
        let consumed = hit.is_some();

        let local = pos - self.content_inset();
        let scrolled = match evt {
            MouseEvent::Wheel => {
                !consumed
                    && self.scroll.is_enabled()
                    && self.mouse_event_scroll(evt, local, wheel_delta, cx.now)
            }
            _ => {
                self.scroll_observes(hit)
                    && self.mouse_event_scroll(evt, local, wheel_delta, cx.now)
            }
        };

        if let Some(t) = evt.as_touch() {
            self.after_pointer(t, hit);
        }
        consumed || scrolled || self.base.consume_input_events()
    }

    /// Focused child first, then focus navigation, then keyboard scrolling.
    fn key_event(&mut self, evt: KeyEvent, key: Key, cx: &mut EventContext) -> bool {
        if !self.base.is_enabled() || !self.base.is_visible() {
            return false;
        }
        if key == Key::Shift {
            match evt {
                KeyEvent::Press => self.shift_down = true,
                KeyEvent::Release => self.shift_down = false,
                KeyEvent::Char => {}
            }
        }

        if let Some(c) = self.focus.and_then(|i| self.controls.get(i)).cloned() {
            let nested = cx.nested;
            cx.nested = true;
            let consumed = c.borrow_mut().key_event(evt, key, cx);
            cx.nested = nested;
            if consumed {
                return true;
            }
        }

        let Some(dir) = Direction::from_key(key, self.shift_down) else {
            return false;
        };
        match evt {
            KeyEvent::Press => {
                if !self.focus_repeat.press(key, dir, cx.now) {
                    return true;
                }
                if self.move_focus_inner(dir, None, !cx.nested) {
                    return true;
                }
                if self.scroll.is_enabled() && !dir.is_sequential() {
                    let v = dir.scroll_vector();
                    let speed = self.scroll.config().key_speed;
                    self.scroll.start(Vec2::new(v.x * speed, v.y * speed));
                    self.base.mark_dirty();
                    return true;
                }
                false
            }
            KeyEvent::Release => {
                self.focus_repeat.release(key);
                false
            }
            KeyEvent::Char => false,
        }
    }

    fn draw(&self, scene: &mut Scene, _clip: Rect) {
        if !self.base.is_visible() {
            return;
        }
        self.base.draw_skin(scene);
        if !self.controls.is_empty() {
            scene.push(SceneNode::PushClip {
                rect: self.content_clip,
            });
            for i in self.draw_order() {
                let c = self.controls[i].borrow();
                if c.base().is_visible() && c.base().absolute_bounds().intersects(&self.content_clip)
                {
                    c.draw(scene, self.content_clip);
                }
            }
            scene.push(SceneNode::PopClip);
        }
        self.draw_scrollbars(scene);
    }

    fn is_dirty(&self) -> bool {
        self.base.is_dirty() || self.controls.iter().any(|c| c.borrow().is_dirty())
    }

    fn clear_dirty(&mut self) {
        self.base.consume_dirty();
        for c in &self.controls {
            c.borrow_mut().clear_dirty();
        }
    }

    fn can_receive_focus(&self) -> bool {
        let b = &self.base;
        b.is_visible()
            && b.is_enabled()
            && (b.can_focus() || self.controls.iter().any(|c| c.borrow().can_receive_focus()))
    }

    fn as_container(&self) -> Option<&Container> {
        Some(self)
    }

    fn as_container_mut(&mut self) -> Option<&mut Container> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
