//! Leaf controls.
//!
//! Each widget composes a [`ControlBase`] and implements [`Control`]; only
//! drawing and value handling differ between them.

use std::any::Any;
use std::rc::Rc;

use formwork_core::*;

use crate::control::{Control, ControlBase, EventContext, EventKind};

/// Text and the content rect it was last laid out in.
#[derive(Clone, Debug, Default)]
struct TextPart {
    text: String,
    viewport: Rect,
}

impl TextPart {
    fn set(&mut self, text: &str) -> bool {
        if self.text == text {
            return false;
        }
        self.text = text.to_string();
        true
    }

    fn draw(&self, base: &ControlBase, scene: &mut Scene) {
        if self.text.is_empty() || self.viewport.is_empty() {
            return;
        }
        let style = base.style();
        let state = base.state();
        scene.push(SceneNode::Text {
            rect: self.viewport,
            text: self.text.clone(),
            color: style.text_color(state).mul_alpha(base.opacity()),
            size: style.font_size(state),
            alignment: style.text_alignment(state),
        });
    }
}

#[derive(Debug)]
pub struct Label {
    base: ControlBase,
    text: TextPart,
}

impl Label {
    pub fn new(id: impl Into<String>, style: Rc<Style>) -> Self {
        let mut base = ControlBase::new(id, style);
        base.set_consume_input_events(false);
        Self {
            base,
            text: TextPart::default(),
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    pub fn text(&self) -> &str {
        &self.text.text
    }

    pub fn set_text(&mut self, text: &str) {
        if self.text.set(text) {
            self.base.mark_dirty();
        }
    }

    /// Rect the text is laid out in, from the last update.
    pub fn text_viewport(&self) -> Rect {
        self.text.viewport
    }
}

impl Control for Label {
    fn base(&self) -> &ControlBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.base
    }
    fn type_name(&self) -> &'static str {
        "Label"
    }

    fn update(&mut self, clip: Rect, offset: Vec2) {
        self.base.update_bounds(clip, offset);
        self.text.viewport = self.base.viewport();
    }

    fn draw_text(&self, scene: &mut Scene, _clip: Rect) {
        self.text.draw(&self.base, scene);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Pressable label. Fires `CLICK` on release inside, or on Enter/Space while
/// focused.
#[derive(Debug)]
pub struct Button {
    base: ControlBase,
    text: TextPart,
}

impl Button {
    pub fn new(id: impl Into<String>, style: Rc<Style>) -> Self {
        let mut base = ControlBase::new(id, style);
        base.set_can_focus(true);
        Self {
            base,
            text: TextPart::default(),
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    pub fn text(&self) -> &str {
        &self.text.text
    }

    pub fn set_text(&mut self, text: &str) {
        if self.text.set(text) {
            self.base.mark_dirty();
        }
    }
}

/// Enter/Space activation shared by the pressable widgets. Returns whether
/// the key completed a click.
fn key_activate(base: &mut ControlBase, evt: KeyEvent, key: Key) -> Option<bool> {
    if !matches!(key, Key::Enter | Key::Space) || !base.is_enabled() {
        return None;
    }
    match evt {
        KeyEvent::Press => {
            base.set_state(State::Active);
            base.notify(EventKind::PRESS);
            Some(false)
        }
        KeyEvent::Release if base.state() == State::Active => {
            base.set_state(State::Focus);
            base.notify(EventKind::RELEASE);
            Some(true)
        }
        _ => None,
    }
}

impl Control for Button {
    fn base(&self) -> &ControlBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.base
    }
    fn type_name(&self) -> &'static str {
        "Button"
    }

    fn update(&mut self, clip: Rect, offset: Vec2) {
        self.base.update_bounds(clip, offset);
        self.text.viewport = self.base.viewport();
    }

    fn key_event(&mut self, evt: KeyEvent, key: Key, _cx: &mut EventContext) -> bool {
        match key_activate(&mut self.base, evt, key) {
            Some(true) => {
                self.base.notify(EventKind::CLICK);
                true
            }
            Some(false) => true,
            None => false,
        }
    }

    fn draw_text(&self, scene: &mut Scene, _clip: Rect) {
        self.text.draw(&self.base, scene);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct CheckBox {
    base: ControlBase,
    text: TextPart,
    checked: bool,
    icon: Rect,
}

impl CheckBox {
    pub fn new(id: impl Into<String>, style: Rc<Style>) -> Self {
        let mut base = ControlBase::new(id, style);
        base.set_can_focus(true);
        Self {
            base,
            text: TextPart::default(),
            checked: false,
            icon: Rect::default(),
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        if self.text.set(text) {
            self.base.mark_dirty();
        }
        self
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn set_checked(&mut self, checked: bool) {
        if self.checked != checked {
            self.checked = checked;
            self.base.mark_dirty();
            self.base.notify(EventKind::VALUE_CHANGED);
        }
    }

    fn icon_name(&self) -> &'static str {
        if self.checked { "checked" } else { "unchecked" }
    }
}

impl Control for CheckBox {
    fn base(&self) -> &ControlBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.base
    }
    fn type_name(&self) -> &'static str {
        "CheckBox"
    }

    fn update(&mut self, clip: Rect, offset: Vec2) {
        self.base.update_bounds(clip, offset);
        let vp = self.base.viewport();
        let size = self
            .base
            .style()
            .image(self.icon_name(), self.base.state())
            .size();
        let side = if size.width > 0.0 { size.width } else { vp.h };
        self.icon = Rect::new(vp.x, vp.y + (vp.h - side) / 2.0, side, side);
        self.text.viewport = Rect::new(vp.x + side, vp.y, (vp.w - side).max(0.0), vp.h);
    }

    fn touch_event(
        &mut self,
        evt: TouchEvent,
        pos: Vec2,
        _contact: u32,
        cx: &mut EventContext,
    ) -> bool {
        let click = self.base.releases_click(evt, pos, cx);
        let consumed = self.base.handle_touch(evt, pos, cx);
        if click {
            self.set_checked(!self.checked);
        }
        consumed
    }

    fn key_event(&mut self, evt: KeyEvent, key: Key, _cx: &mut EventContext) -> bool {
        match key_activate(&mut self.base, evt, key) {
            Some(true) => {
                self.set_checked(!self.checked);
                self.base.notify(EventKind::CLICK);
                true
            }
            Some(false) => true,
            None => false,
        }
    }

    fn draw_images(&self, scene: &mut Scene, _clip: Rect) {
        self.base.draw_skin(scene);
        let region = self
            .base
            .style()
            .image(self.icon_name(), self.base.state());
        scene.push(SceneNode::Image {
            rect: self.icon,
            image: self.icon_name(),
            color: region
                .color
                .unwrap_or(Color::WHITE)
                .mul_alpha(self.base.opacity()),
        });
    }

    fn draw_text(&self, scene: &mut Scene, _clip: Rect) {
        self.text.draw(&self.base, scene);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Horizontal value slider over `[min, max]`, optionally snapped to `step`.
#[derive(Debug)]
pub struct Slider {
    base: ControlBase,
    min: f32,
    max: f32,
    step: f32,
    value: f32,
}

impl Slider {
    pub fn new(id: impl Into<String>, style: Rc<Style>) -> Self {
        let mut base = ControlBase::new(id, style);
        base.set_can_focus(true);
        Self {
            base,
            min: 0.0,
            max: 1.0,
            step: 0.0,
            value: 0.0,
        }
    }

    pub fn with_range(mut self, min: f32, max: f32, step: f32) -> Self {
        self.min = min.min(max);
        self.max = max.max(min);
        self.step = step.max(0.0);
        let v = self.value;
        self.set_value(v);
        self
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn set_value(&mut self, value: f32) {
        let mut v = if value.is_finite() { value } else { self.min };
        if self.step > 0.0 {
            v = self.min + ((v - self.min) / self.step).round() * self.step;
        }
        let v = v.clamp(self.min, self.max);
        if v != self.value {
            self.value = v;
            self.base.mark_dirty();
            self.base.notify(EventKind::VALUE_CHANGED);
        }
    }

    fn value_at(&self, local_x: f32) -> f32 {
        let inset = self.base.border() + self.base.padding();
        let track = (self.base.size().width - inset.horizontal()).max(0.0);
        if track <= 0.0 {
            return self.value;
        }
        let f = ((local_x - inset.left) / track).clamp(0.0, 1.0);
        self.min + f * (self.max - self.min)
    }

    fn fraction(&self) -> f32 {
        let range = self.max - self.min;
        if range > 0.0 {
            (self.value - self.min) / range
        } else {
            0.0
        }
    }
}

impl Control for Slider {
    fn base(&self) -> &ControlBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.base
    }
    fn type_name(&self) -> &'static str {
        "Slider"
    }

    fn touch_event(
        &mut self,
        evt: TouchEvent,
        pos: Vec2,
        _contact: u32,
        cx: &mut EventContext,
    ) -> bool {
        let dragging = evt != TouchEvent::Release;
        let consumed = self.base.handle_touch(evt, pos, cx);
        if consumed && dragging && self.base.state() == State::Active {
            let v = self.value_at(pos.x);
            self.set_value(v);
        }
        consumed
    }

    /// Left/Right nudge the value; at either end they fall through to focus
    /// navigation.
    fn key_event(&mut self, evt: KeyEvent, key: Key, _cx: &mut EventContext) -> bool {
        if evt != KeyEvent::Press || !self.base.is_enabled() {
            return false;
        }
        let step = if self.step > 0.0 {
            self.step
        } else {
            (self.max - self.min) / 10.0
        };
        let before = self.value;
        match key {
            Key::ArrowLeft => self.set_value(before - step),
            Key::ArrowRight => self.set_value(before + step),
            _ => return false,
        }
        self.value != before
    }

    fn draw_images(&self, scene: &mut Scene, _clip: Rect) {
        self.base.draw_skin(scene);
        let vp = self.base.viewport();
        if vp.is_empty() {
            return;
        }
        let style = self.base.style();
        let state = self.base.state();
        let opacity = self.base.opacity();

        let track = style.image("track", state);
        let th = if track.height > 0.0 { track.height } else { 4.0 };
        scene.push(SceneNode::Image {
            rect: Rect::new(vp.x, vp.y + (vp.h - th) / 2.0, vp.w, th),
            image: "track",
            color: track.color.unwrap_or(Color::WHITE).mul_alpha(opacity),
        });

        let marker = style.image("marker", state);
        let ms = if marker.width > 0.0 {
            marker.size()
        } else {
            Size::new(vp.h, vp.h)
        };
        let x = vp.x + self.fraction() * vp.w - ms.width / 2.0;
        scene.push(SceneNode::Image {
            rect: Rect::new(x, vp.y + (vp.h - ms.height) / 2.0, ms.width, ms.height),
            image: "marker",
            color: marker.color.unwrap_or(Color::WHITE).mul_alpha(opacity),
        });
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use web_time::Instant;

    fn style() -> Rc<Style> {
        Rc::new(Style::new("Test"))
    }

    fn cx() -> EventContext {
        EventContext::new(Instant::now())
    }

    #[test]
    fn update_is_idempotent() {
        let mut l = Label::new("l", style()).with_text("hello");
        l.base_mut().set_bounds(Rect::new(10.0, 10.0, 80.0, 20.0));
        let clip = Rect::new(0.0, 0.0, 50.0, 50.0);

        l.update(clip, Vec2::new(5.0, 5.0));
        assert!(l.base_mut().consume_dirty());
        let first = (l.base().absolute_clip(), l.text_viewport());

        l.update(clip, Vec2::new(5.0, 5.0));
        assert_eq!((l.base().absolute_clip(), l.text_viewport()), first);
        assert!(!l.is_dirty());
        assert_eq!(first.0, Rect::new(15.0, 15.0, 35.0, 20.0));
    }

    #[test]
    fn setters_skip_unchanged_values() {
        let mut l = Label::new("l", style());
        l.base_mut().set_position(3.0, 4.0);
        l.base_mut().consume_dirty();

        l.base_mut().set_position(3.0, 4.0);
        l.base_mut().set_size(0.0, 0.0);
        l.set_text("");
        assert!(!l.is_dirty());

        l.set_text("x");
        assert!(l.is_dirty());
    }

    #[test]
    fn label_ignores_touch() {
        let mut l = Label::new("l", style());
        l.base_mut().set_size(10.0, 10.0);
        l.base_mut().consume_dirty();
        assert!(!l.touch_event(TouchEvent::Press, Vec2::new(1.0, 1.0), 0, &mut cx()));
        assert_eq!(l.base().state(), State::Normal);
        assert!(!l.is_dirty());
    }

    #[test]
    fn button_click_sequence() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut b = Button::new("ok", style());
        b.base_mut().set_size(40.0, 20.0);
        let log = events.clone();
        b.base_mut()
            .add_listener(EventKind::PRESS | EventKind::CLICK, move |id, k| {
                log.borrow_mut().push(format!("{id} {k:?}"))
            });

        let mut cx = cx();
        assert!(b.touch_event(TouchEvent::Press, Vec2::new(5.0, 5.0), 0, &mut cx));
        assert_eq!(b.base().state(), State::Active);
        assert!(b.touch_event(TouchEvent::Move, Vec2::new(90.0, 5.0), 0, &mut cx));
        assert!(b.touch_event(TouchEvent::Release, Vec2::new(6.0, 5.0), 0, &mut cx));
        assert_eq!(b.base().state(), State::Normal);

        assert_eq!(
            *events.borrow(),
            vec!["ok EventKind(PRESS)", "ok EventKind(CLICK)"]
        );
    }

    #[test]
    fn release_outside_or_while_scrolling_is_not_a_click() {
        let clicks = Rc::new(RefCell::new(0));
        let mut b = Button::new("b", style());
        b.base_mut().set_size(40.0, 20.0);
        let c = clicks.clone();
        b.base_mut()
            .add_listener(EventKind::CLICK, move |_, _| *c.borrow_mut() += 1);

        let mut cx = cx();
        b.touch_event(TouchEvent::Press, Vec2::new(5.0, 5.0), 0, &mut cx);
        b.touch_event(TouchEvent::Release, Vec2::new(80.0, 5.0), 0, &mut cx);

        b.touch_event(TouchEvent::Press, Vec2::new(5.0, 5.0), 0, &mut cx);
        cx.parent_scrolling = true;
        b.touch_event(TouchEvent::Release, Vec2::new(5.0, 5.0), 0, &mut cx);

        assert_eq!(*clicks.borrow(), 0);
    }

    #[test]
    fn disabled_button_does_nothing() {
        let mut b = Button::new("b", style());
        b.base_mut().set_size(40.0, 20.0);
        b.base_mut().set_enabled(false);
        assert!(!b.touch_event(TouchEvent::Press, Vec2::new(5.0, 5.0), 0, &mut cx()));
        assert_eq!(b.base().state(), State::Disabled);
        b.base_mut().set_enabled(true);
        assert_eq!(b.base().state(), State::Normal);
    }

    #[test]
    fn checkbox_toggles_on_click_and_key() {
        let mut c = CheckBox::new("c", style()).with_text("Sound");
        c.base_mut().set_size(100.0, 20.0);
        let mut cx = cx();
        c.touch_event(TouchEvent::Press, Vec2::new(5.0, 5.0), 0, &mut cx);
        c.touch_event(TouchEvent::Release, Vec2::new(5.0, 5.0), 0, &mut cx);
        assert!(c.is_checked());

        c.key_event(KeyEvent::Press, Key::Space, &mut cx);
        c.key_event(KeyEvent::Release, Key::Space, &mut cx);
        assert!(!c.is_checked());
        assert_eq!(c.base().state(), State::Focus);
    }

    #[test]
    fn slider_tracks_drag_and_keys() {
        let mut s = Slider::new("s", style()).with_range(0.0, 100.0, 10.0);
        s.base_mut().set_size(200.0, 20.0);
        let mut cx = cx();

        s.touch_event(TouchEvent::Press, Vec2::new(50.0, 10.0), 0, &mut cx);
        assert_eq!(s.value(), 30.0);
        s.touch_event(TouchEvent::Move, Vec2::new(500.0, 10.0), 0, &mut cx);
        assert_eq!(s.value(), 100.0);
        s.touch_event(TouchEvent::Release, Vec2::new(500.0, 10.0), 0, &mut cx);

        // pinned at max: Right falls through to navigation
        assert!(!s.key_event(KeyEvent::Press, Key::ArrowRight, &mut cx));
        assert!(s.key_event(KeyEvent::Press, Key::ArrowLeft, &mut cx));
        assert_eq!(s.value(), 90.0);
    }
}
