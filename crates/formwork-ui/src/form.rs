//! # Forms
//!
//! A [`Form`] is a root [`Container`] plus the theme it was built against and,
//! optionally, a binding to a 3D surface. Forms live in a [`FormRegistry`],
//! which owns the frame clock and fans platform input out to them.
//!
//! Per frame, in this order:
//!
//! 1. input: `FormRegistry::{touch,mouse,key}_event`, newest form first;
//! 2. `FormRegistry::update_all`: ticks (scroll inertia) then settles layout;
//! 3. `FormRegistry::draw_all`: oldest form first so newer forms land on top.
//!
//! Surface-bound forms lay out at their own origin, render into an offscreen
//! [`FrameBuffer`] only while something is dirty, and are then presented as a
//! textured quad. Screen points reach them through a [`SurfaceProjector`].

use std::cell::RefCell;
use std::rc::Rc;

use formwork_core::*;
use web_time::Instant;

use crate::container::Container;
use crate::control::{Control, EventContext};
use crate::factory::ControlFactory;

struct SurfaceBinding {
    projector: Box<dyn SurfaceProjector>,
    target: FrameBuffer,
}

pub struct Form {
    root: Container,
    theme: Rc<Theme>,
    surface: Option<SurfaceBinding>,
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("root", &self.root)
            .field("surface", &self.surface.as_ref().map(|s| s.target))
            .finish()
    }
}

impl Form {
    /// Wraps `root`. The root consumes pointer input over its own area so
    /// forms beneath it never see presses that land on it.
    pub fn new(mut root: Container, theme: Rc<Theme>) -> Self {
        root.base_mut().set_consume_input_events(true);
        Self {
            root,
            theme,
            surface: None,
        }
    }

    /// Builds the root container (and its subtree) from a property namespace.
    pub fn from_properties(props: &dyn Properties, theme: Rc<Theme>) -> Result<Self> {
        let factory = ControlFactory::new(theme.clone());
        let mut root = factory.create_container(props)?;
        let consume = props.get_bool("consumeInputEvents").unwrap_or(true);
        root.base_mut().set_consume_input_events(consume);
        log::debug!(
            "form `{}` built with {} controls",
            root.base().id(),
            root.count_controls()
        );
        Ok(Self {
            root,
            theme,
            surface: None,
        })
    }

    pub fn id(&self) -> &str {
        self.root.base().id()
    }

    pub fn root(&self) -> &Container {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Container {
        &mut self.root
    }

    pub fn theme(&self) -> &Rc<Theme> {
        &self.theme
    }

    pub fn is_enabled(&self) -> bool {
        self.root.base().is_enabled()
    }

    pub fn bounds(&self) -> Rect {
        self.root.base().bounds()
    }

    // Surface binding

    pub fn bind_surface(&mut self, projector: Box<dyn SurfaceProjector>) {
        let target = FrameBuffer::for_size(self.root.base().size());
        self.surface = Some(SurfaceBinding { projector, target });
        self.root.base_mut().mark_dirty();
    }

    pub fn unbind_surface(&mut self) {
        if self.surface.take().is_some() {
            self.root.base_mut().mark_dirty();
        }
    }

    pub fn is_surface_bound(&self) -> bool {
        self.surface.is_some()
    }

    pub fn frame_buffer(&self) -> Option<FrameBuffer> {
        self.surface.as_ref().map(|s| s.target)
    }

    /// Fills the screen along auto-sized axes.
    pub fn fit_screen(&mut self, screen: Size) {
        let auto = self.root.base().auto_size();
        if auto.is_empty() {
            return;
        }
        let size = self.root.base().size();
        let w = if auto.contains(crate::control::AutoSize::WIDTH) {
            screen.width
        } else {
            size.width
        };
        let h = if auto.contains(crate::control::AutoSize::HEIGHT) {
            screen.height
        } else {
            size.height
        };
        self.root.base_mut().fit_size(w, h);
    }

    // Frame

    /// Clip and offset the root is laid out with.
    fn root_frame(&self) -> (Rect, Vec2) {
        let bounds = self.root.base().bounds();
        match self.surface {
            Some(_) => (Rect::from_size(bounds.size()), Vec2::ZERO - bounds.origin()),
            None => (bounds, Vec2::ZERO),
        }
    }

    pub fn update(&mut self, time: &FrameTime) {
        self.root.tick(time);
        let (clip, offset) = self.root_frame();
        self.root.update(clip, offset);

        if let Some(s) = &mut self.surface {
            let target = FrameBuffer::for_size(self.root.base().size());
            if target != s.target {
                log::debug!(
                    "form `{}` frame buffer resized to {}x{}",
                    self.root.base().id(),
                    target.width,
                    target.height
                );
                s.target = target;
                self.root.base_mut().mark_dirty();
            }
        }
    }

    pub fn render_scene(&self) -> Scene {
        let mut scene = Scene::new();
        let (clip, _) = self.root_frame();
        self.root.draw(&mut scene, clip);
        scene
    }

    /// Renders the form and consumes its dirtiness.
    pub fn draw(&mut self, backend: &mut dyn RenderBackend) {
        match &self.surface {
            Some(s) => {
                if self.root.is_dirty() {
                    let scene = self.render_scene();
                    backend.draw_to_target(&s.target, &scene);
                }
                backend.draw_surface(&s.target);
            }
            None => backend.draw_scene(&self.render_scene()),
        }
        self.root.clear_dirty();
    }

    // Input

    /// Screen point in root-local space, or `None` when the form is not hit
    /// and has nothing captured.
    fn locate(&self, screen: Vec2) -> Option<Vec2> {
        let size = self.root.base().size();
        let captured = self.root.base().state() == State::Active;
        let local = match &self.surface {
            Some(s) => s.projector.project(screen),
            None => Some(screen - self.root.base().position()),
        };
        match local {
            Some(p) if captured || Rect::from_size(size).contains(p) => Some(p),
            _ => None,
        }
    }

    pub fn touch_event(&mut self, evt: TouchEvent, pos: Vec2, contact: u32, now: Instant) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let Some(local) = self.locate(pos) else {
            return false;
        };
        let mut cx = EventContext::new(now);
        self.root.touch_event(evt, local, contact, &mut cx)
    }

    pub fn mouse_event(&mut self, evt: MouseEvent, pos: Vec2, wheel_delta: i32, now: Instant) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let Some(local) = self.locate(pos) else {
            return false;
        };
        let mut cx = EventContext::new(now);
        self.root.mouse_event(evt, local, wheel_delta, &mut cx)
    }

    pub fn key_event(&mut self, evt: KeyEvent, key: Key, now: Instant) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let mut cx = EventContext::new(now);
        self.root.key_event(evt, key, &mut cx)
    }
}

pub type FormHandle = Rc<RefCell<Form>>;

/// The set of live forms.
///
/// Controls never reach back into the registry, so dispatch can hold a
/// mutable borrow of each form for the duration of one event. Listeners must
/// not borrow the form that is notifying them.
pub struct FormRegistry {
    forms: Vec<FormHandle>,
    clock: SharedClock,
    last_frame: Option<Instant>,
    screen: Size,
}

impl Default for FormRegistry {
    fn default() -> Self {
        Self::new(Rc::new(SystemClock))
    }
}

impl FormRegistry {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            forms: Vec::new(),
            clock,
            last_frame: None,
            screen: Size::default(),
        }
    }

    pub fn register(&mut self, mut form: Form) -> FormHandle {
        if self.screen.width > 0.0 || self.screen.height > 0.0 {
            form.fit_screen(self.screen);
        }
        log::debug!("registering form `{}`", form.id());
        let handle = Rc::new(RefCell::new(form));
        self.forms.push(handle.clone());
        handle
    }

    /// Drops the registry's reference. Returns whether the form was live.
    pub fn destroy(&mut self, form: &FormHandle) -> bool {
        let Some(i) = self.forms.iter().position(|f| Rc::ptr_eq(f, form)) else {
            return false;
        };
        let f = self.forms.remove(i);
        log::debug!("destroyed form `{}`", f.borrow().id());
        true
    }

    pub fn forms(&self) -> &[FormHandle] {
        &self.forms
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    pub fn screen(&self) -> Size {
        self.screen
    }

    fn frame_time(&mut self) -> FrameTime {
        let now = self.clock.now();
        let elapsed = self
            .last_frame
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default();
        self.last_frame = Some(now);
        FrameTime::new(now, elapsed)
    }

    pub fn update_all(&mut self) {
        let time = self.frame_time();
        for f in &self.forms {
            f.borrow_mut().update(&time);
        }
    }

    pub fn draw_all(&self, backend: &mut dyn RenderBackend) {
        for f in &self.forms {
            f.borrow_mut().draw(backend);
        }
    }

    pub fn touch_event(&mut self, evt: TouchEvent, x: f32, y: f32, contact: u32) -> bool {
        let now = self.clock.now();
        let pos = Vec2::new(x, y);
        self.forms
            .iter()
            .rev()
            .any(|f| f.borrow_mut().touch_event(evt, pos, contact, now))
    }

    pub fn mouse_event(&mut self, evt: MouseEvent, x: f32, y: f32, wheel_delta: i32) -> bool {
        let now = self.clock.now();
        let pos = Vec2::new(x, y);
        self.forms
            .iter()
            .rev()
            .any(|f| f.borrow_mut().mouse_event(evt, pos, wheel_delta, now))
    }

    pub fn key_event(&mut self, evt: KeyEvent, key: Key) -> bool {
        let now = self.clock.now();
        self.forms
            .iter()
            .rev()
            .any(|f| f.borrow_mut().key_event(evt, key, now))
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.screen = Size::new(width, height);
        log::info!("screen resized to {width}x{height}");
        for f in &self.forms {
            let mut f = f.borrow_mut();
            f.fit_screen(self.screen);
            f.root_mut().base_mut().mark_dirty();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{ControlRef, EventKind, share};
    use crate::layout::Layout;
    use crate::widgets::{Button, Label};
    use std::cell::Cell;
    use web_time::Duration;

    #[derive(Default)]
    struct Recorder {
        scenes: Vec<Scene>,
        targets: usize,
        surfaces: usize,
    }

    impl RenderBackend for Recorder {
        fn draw_scene(&mut self, scene: &Scene) {
            self.scenes.push(scene.clone());
        }
        fn draw_to_target(&mut self, _target: &FrameBuffer, scene: &Scene) {
            self.targets += 1;
            self.scenes.push(scene.clone());
        }
        fn draw_surface(&mut self, _target: &FrameBuffer) {
            self.surfaces += 1;
        }
    }

    /// Maps screen points onto a quad at a fixed screen offset.
    struct Quad(Rect);

    impl SurfaceProjector for Quad {
        fn project(&self, screen: Vec2) -> Option<Vec2> {
            self.0
                .contains(screen)
                .then(|| screen - self.0.origin())
        }
    }

    fn style() -> Rc<Style> {
        Rc::new(Style::new("default"))
    }

    fn button(id: &str, r: Rect) -> ControlRef {
        let mut b = Button::new(id, style());
        b.base_mut().set_bounds(r);
        share(b)
    }

    fn form(id: &str, r: Rect, children: &[ControlRef]) -> Form {
        let mut root = Container::new(id, style());
        root.base_mut().set_bounds(r);
        for c in children {
            root.add_control(c).unwrap();
        }
        Form::new(root, Rc::new(Theme::new()))
    }

    fn counter(c: &ControlRef, mask: EventKind) -> Rc<Cell<u32>> {
        let n = Rc::new(Cell::new(0));
        let n2 = n.clone();
        c.borrow_mut()
            .base_mut()
            .add_listener(mask, move |_, _| n2.set(n2.get() + 1));
        n
    }

    #[test]
    fn newest_form_gets_input_first() {
        let clock = TestClock::new();
        let mut reg = FormRegistry::new(Rc::new(clock.clone()));
        let under = button("under", Rect::new(0.0, 0.0, 50.0, 50.0));
        let over = button("over", Rect::new(0.0, 0.0, 50.0, 50.0));
        reg.register(form("back", Rect::new(0.0, 0.0, 200.0, 200.0), &[under.clone()]));
        reg.register(form("front", Rect::new(0.0, 0.0, 100.0, 100.0), &[over.clone()]));
        reg.update_all();

        let back_clicks = counter(&under, EventKind::CLICK);
        let front_clicks = counter(&over, EventKind::CLICK);

        assert!(reg.touch_event(TouchEvent::Press, 10.0, 10.0, 0));
        assert!(reg.touch_event(TouchEvent::Release, 10.0, 10.0, 0));
        assert_eq!(front_clicks.get(), 1);
        assert_eq!(back_clicks.get(), 0);

        // outside the front form: falls through to the one beneath
        assert!(reg.touch_event(TouchEvent::Press, 150.0, 150.0, 0));
        assert_eq!(reg.forms()[0].borrow().root().base().state(), State::Active);
        assert!(reg.touch_event(TouchEvent::Release, 150.0, 150.0, 0));

        // nothing there at all
        assert!(!reg.touch_event(TouchEvent::Press, 500.0, 500.0, 0));
    }

    #[test]
    fn form_offset_translates_into_root_space() {
        let b = button("b", Rect::new(0.0, 0.0, 20.0, 20.0));
        let mut f = form("f", Rect::new(100.0, 100.0, 50.0, 50.0), &[b.clone()]);
        let clock = TestClock::new();
        f.update(&FrameTime::new(clock.now(), Duration::ZERO));

        assert_eq!(b.borrow().base().absolute_bounds(), Rect::new(100.0, 100.0, 20.0, 20.0));
        assert!(f.touch_event(TouchEvent::Press, Vec2::new(110.0, 110.0), 0, clock.now()));
        assert_eq!(b.borrow().base().state(), State::Active);
    }

    #[test]
    fn destroy_is_by_identity() {
        let mut reg = FormRegistry::new(Rc::new(TestClock::new()));
        let a = reg.register(form("same", Rect::new(0.0, 0.0, 10.0, 10.0), &[]));
        let b = reg.register(form("same", Rect::new(0.0, 0.0, 10.0, 10.0), &[]));
        assert!(reg.destroy(&a));
        assert!(!reg.destroy(&a));
        assert_eq!(reg.len(), 1);
        assert!(Rc::ptr_eq(&reg.forms()[0], &b));
    }

    #[test]
    fn disabled_forms_ignore_input() {
        let mut reg = FormRegistry::new(Rc::new(TestClock::new()));
        let h = reg.register(form("f", Rect::new(0.0, 0.0, 100.0, 100.0), &[]));
        reg.update_all();
        h.borrow_mut().root_mut().base_mut().set_enabled(false);
        assert!(!reg.touch_event(TouchEvent::Press, 10.0, 10.0, 0));
        assert!(!reg.key_event(KeyEvent::Press, Key::Tab));
    }

    #[test]
    fn screen_forms_draw_every_frame() {
        let label = share(Label::new("l", style()).with_text("hi"));
        label
            .borrow_mut()
            .base_mut()
            .set_bounds(Rect::new(0.0, 0.0, 50.0, 20.0));
        let mut reg = FormRegistry::new(Rc::new(TestClock::new()));
        let h = reg.register(form("f", Rect::new(0.0, 0.0, 100.0, 100.0), &[label]));
        let mut out = Recorder::default();

        reg.update_all();
        reg.draw_all(&mut out);
        assert!(!h.borrow().root().is_dirty());
        reg.update_all();
        reg.draw_all(&mut out);

        assert_eq!(out.scenes.len(), 2);
        assert_eq!(out.targets, 0);
        assert!(out.scenes[1].nodes.iter().any(|n| matches!(n, SceneNode::Text { text, .. } if text == "hi")));
    }

    #[test]
    fn surface_forms_render_offscreen_only_when_dirty() {
        let b = button("b", Rect::new(0.0, 0.0, 20.0, 20.0));
        let mut f = form("f", Rect::new(300.0, 300.0, 100.0, 60.0), &[b.clone()]);
        f.bind_surface(Box::new(Quad(Rect::new(10.0, 10.0, 100.0, 60.0))));
        assert_eq!(
            f.frame_buffer(),
            Some(FrameBuffer {
                width: 128,
                height: 64
            })
        );

        let clock = TestClock::new();
        let time = FrameTime::new(clock.now(), Duration::ZERO);
        let mut out = Recorder::default();

        f.update(&time);
        // laid out at the origin of its own target
        assert_eq!(b.borrow().base().absolute_bounds(), Rect::new(0.0, 0.0, 20.0, 20.0));
        f.draw(&mut out);
        f.update(&time);
        f.draw(&mut out);
        assert_eq!((out.targets, out.surfaces), (1, 2));

        // input is projected through the quad
        assert!(!f.touch_event(TouchEvent::Press, Vec2::new(5.0, 5.0), 0, clock.now()));
        assert!(f.touch_event(TouchEvent::Press, Vec2::new(15.0, 15.0), 0, clock.now()));
        assert_eq!(b.borrow().base().state(), State::Active);

        f.update(&time);
        f.draw(&mut out);
        assert_eq!((out.targets, out.surfaces), (2, 3));
    }

    #[test]
    fn update_all_drives_inertia_from_the_clock() {
        let clock = TestClock::new();
        let mut reg = FormRegistry::new(Rc::new(clock.clone()));
        let tall = share(Label::new("tall", style()));
        tall.borrow_mut()
            .base_mut()
            .set_bounds(Rect::new(0.0, 0.0, 100.0, 1000.0));
        let mut f = form("f", Rect::new(0.0, 0.0, 100.0, 100.0), &[tall]);
        f.root_mut().set_layout(Layout::Scroll);
        let h = reg.register(f);

        reg.update_all();
        assert!(reg.key_event(KeyEvent::Press, Key::ArrowDown));
        clock.advance(Duration::from_millis(100));
        reg.update_all();

        let y = h.borrow().root().scroll_position().y;
        assert!((y + 50.0).abs() < 0.01, "{y}");
    }

    #[test]
    fn resize_fills_auto_sized_forms_and_dirties_all() {
        let mut reg = FormRegistry::new(Rc::new(TestClock::new()));
        let mut f = form("f", Rect::new(0.0, 0.0, 10.0, 10.0), &[]);
        f.root_mut()
            .base_mut()
            .set_auto_size(crate::control::AutoSize::BOTH);
        let h = reg.register(f);
        let fixed = reg.register(form("g", Rect::new(0.0, 0.0, 10.0, 10.0), &[]));
        reg.update_all();
        reg.draw_all(&mut Recorder::default());

        reg.resize(640.0, 480.0);
        assert_eq!(h.borrow().root().base().size(), Size::new(640.0, 480.0));
        assert_eq!(fixed.borrow().root().base().size(), Size::new(10.0, 10.0));
        assert!(fixed.borrow().root().is_dirty());
    }
}
