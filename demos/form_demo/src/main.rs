use std::rc::Rc;

use anyhow::Context;
use formwork_core::*;
use formwork_devtools::Inspector;
use formwork_ui::*;
use web_time::Duration;

/// Logs what a renderer would draw.
#[derive(Default)]
struct LogBackend {
    frames: u32,
}

impl RenderBackend for LogBackend {
    fn draw_scene(&mut self, scene: &Scene) {
        self.frames += 1;
        log::info!("frame {}: {} nodes", self.frames, scene.len());
        for node in &scene.nodes {
            log::debug!("  {node:?}");
        }
    }
    fn draw_to_target(&mut self, target: &FrameBuffer, scene: &Scene) {
        log::info!(
            "offscreen {}x{}: {} nodes",
            target.width,
            target.height,
            scene.len()
        );
    }
    fn draw_surface(&mut self, target: &FrameBuffer) {
        log::info!("surface quad {}x{}", target.width, target.height);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let theme = Rc::new(
        Theme::from_json(include_str!("../assets/theme.json")).context("loading theme")?,
    );
    let props = JsonProperties::new(
        serde_json::from_str(include_str!("../assets/settings.json"))
            .context("parsing form description")?,
    );
    let form = Form::from_properties(&props, theme).context("building form")?;

    let clock = TestClock::new();
    let mut forms = FormRegistry::new(Rc::new(clock.clone()));
    forms.resize(640.0, 480.0);
    let handle = forms.register(form);

    if let Some(c) = handle.borrow().root().control_by_id("fullscreen") {
        c.borrow_mut()
            .base_mut()
            .add_listener(EventKind::VALUE_CHANGED, |id, _| log::info!("{id} toggled"));
    }
    if let Some(c) = handle.borrow().root().control_by_id("apply") {
        c.borrow_mut()
            .base_mut()
            .add_listener(EventKind::CLICK, |id, _| log::info!("{id} clicked"));
    }

    let mut backend = LogBackend::default();
    let mut inspector = Inspector::new();
    inspector.hud.toggle_inspector();

    let mut frame = |forms: &mut FormRegistry, backend: &mut LogBackend| {
        clock.advance(Duration::from_millis(16));
        forms.update_all();
        let form = handle.borrow();
        let mut scene = form.render_scene();
        inspector.frame(&form, &mut scene, clock.now());
        drop(form);
        backend.draw_scene(&scene);
        forms.draw_all(backend);
    };

    frame(&mut forms, &mut backend);

    // Tab to the checkbox and toggle it.
    for key in [Key::Tab, Key::Enter] {
        forms.key_event(KeyEvent::Press, key);
        forms.key_event(KeyEvent::Release, key);
    }
    frame(&mut forms, &mut backend);

    // Drag the slider, then flick the content upwards.
    forms.touch_event(TouchEvent::Press, 40.0, 90.0, 0);
    forms.touch_event(TouchEvent::Move, 200.0, 90.0, 0);
    forms.touch_event(TouchEvent::Release, 200.0, 90.0, 0);
    forms.mouse_event(MouseEvent::Wheel, 150.0, 150.0, -1);
    for _ in 0..10 {
        frame(&mut forms, &mut backend);
    }

    let root = handle.borrow();
    log::info!(
        "scrolled to {:?}, focused {:?}",
        root.root().scroll_position(),
        root.root()
            .focused_control()
            .map(|c| c.borrow().base().id().to_owned())
    );
    Ok(())
}
