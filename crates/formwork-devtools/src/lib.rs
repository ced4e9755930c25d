//! Debug overlay for forms: frame pacing, tree statistics and an outline
//! around the focused control.

use web_time::Instant;

use formwork_core::{Alignment, Color, Rect, Scene, SceneNode, Vec2};
use formwork_ui::Form;

const ROW_HEIGHT: f32 = 16.0;
const PANEL_WIDTH: f32 = 160.0;

/// Exponentially smoothed frames-per-second from frame timestamps.
#[derive(Clone, Debug)]
pub struct FpsMeter {
    last: Option<Instant>,
    smoothed: f32,
    /// Weight of the newest sample.
    pub smoothing: f32,
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self {
            last: None,
            smoothed: 0.0,
            smoothing: 0.2,
        }
    }
}

impl FpsMeter {
    pub fn sample(&mut self, now: Instant) {
        let Some(prev) = self.last.replace(now) else {
            return;
        };
        let dt = now.saturating_duration_since(prev).as_secs_f32();
        if dt <= 0.0 {
            return;
        }
        let fps = dt.recip();
        self.smoothed = if self.smoothed == 0.0 {
            fps
        } else {
            self.smoothed + self.smoothing * (fps - self.smoothed)
        };
    }

    pub fn fps(&self) -> f32 {
        self.smoothed
    }
}

/// Per-frame statistics of one form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metrics {
    pub controls: usize,
    pub dirty: usize,
    pub scene_nodes: usize,
}

impl Metrics {
    /// Reads the form before its dirtiness is consumed by drawing.
    pub fn collect(form: &Form, scene: &Scene) -> Self {
        let root = form.root();
        Self {
            controls: root.count_controls(),
            dirty: root.count_dirty(),
            scene_nodes: scene.len(),
        }
    }

    fn rows(&self) -> [(&'static str, usize); 3] {
        [
            ("controls", self.controls),
            ("dirty", self.dirty),
            ("nodes", self.scene_nodes),
        ]
    }
}

pub struct Hud {
    pub inspector_enabled: bool,
    pub highlighted: Option<Rect>,
    pub metrics: Option<Metrics>,
    /// Top-left corner of the stats panel.
    pub origin: Vec2,
    frame_count: u64,
    meter: FpsMeter,
}

impl Default for Hud {
    fn default() -> Self {
        Self::new()
    }
}

impl Hud {
    pub fn new() -> Self {
        Self {
            inspector_enabled: false,
            highlighted: None,
            metrics: None,
            origin: Vec2::new(8.0, 8.0),
            frame_count: 0,
            meter: FpsMeter::default(),
        }
    }

    pub fn toggle_inspector(&mut self) {
        self.inspector_enabled = !self.inspector_enabled;
        log::debug!("inspector enabled: {}", self.inspector_enabled);
    }

    pub fn set_highlighted(&mut self, r: Option<Rect>) {
        self.highlighted = r;
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn fps(&self) -> f32 {
        self.meter.fps()
    }

    fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("frame {}", self.frame_count),
            format!("fps {:.1}", self.meter.fps()),
        ];
        if let Some(m) = &self.metrics {
            lines.extend(m.rows().iter().map(|(k, v)| format!("{k} {v}")));
        }
        lines
    }

    /// Counts a frame and appends the panel, one text row per statistic,
    /// and the highlight outline on top.
    pub fn overlay(&mut self, scene: &mut Scene, now: Instant) {
        self.frame_count += 1;
        self.meter.sample(now);

        let lines = self.lines();
        let panel = Rect::new(
            self.origin.x,
            self.origin.y,
            PANEL_WIDTH,
            ROW_HEIGHT * lines.len() as f32,
        );
        scene.push(SceneNode::Rect {
            rect: panel,
            color: Color::BLACK.with_alpha(160),
        });
        for (i, text) in lines.into_iter().enumerate() {
            scene.push(SceneNode::Text {
                rect: Rect::new(
                    panel.x + 4.0,
                    panel.y + ROW_HEIGHT * i as f32,
                    PANEL_WIDTH - 8.0,
                    ROW_HEIGHT,
                ),
                text,
                color: Color::from_hex("#AAAAAA"),
                size: 12.0,
                alignment: Alignment::TOP_LEFT,
            });
        }

        if let Some(rect) = self.highlighted {
            scene.push(SceneNode::Border {
                rect,
                color: Color::from_hex("#44AAFF"),
                width: 2.0,
            });
        }
    }
}

#[derive(Default)]
pub struct Inspector {
    pub hud: Hud,
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the HUD for `form` to a scene it has just rendered. Call before
    /// the form's dirtiness is consumed to see the dirty count.
    pub fn frame(&mut self, form: &Form, scene: &mut Scene, now: Instant) {
        if !self.hud.inspector_enabled {
            return;
        }
        self.hud.metrics = Some(Metrics::collect(form, scene));
        let focused = deepest_focus(form).map(|c| c.borrow().base().absolute_bounds());
        self.hud.set_highlighted(focused);
        self.hud.overlay(scene, now);
    }
}

/// Follows the focus chain through nested containers.
fn deepest_focus(form: &Form) -> Option<formwork_ui::ControlRef> {
    let mut cur = form.root().focused_control()?;
    loop {
        let next = cur
            .borrow()
            .as_container()
            .and_then(|c| c.focused_control());
        match next {
            Some(n) => cur = n,
            None => return Some(cur),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_core::{Clock, FrameTime, Style, TestClock, Theme};
    use formwork_ui::{Button, Container, Control, Direction, share};
    use std::rc::Rc;
    use web_time::Duration;

    #[test]
    fn fps_is_smoothed_from_frame_times() {
        let clock = TestClock::new();
        let mut meter = FpsMeter::default();

        meter.sample(clock.now());
        assert_eq!(meter.fps(), 0.0);
        clock.advance(Duration::from_millis(20));
        meter.sample(clock.now());
        assert!((meter.fps() - 50.0).abs() < 0.1);
        clock.advance(Duration::from_millis(10));
        meter.sample(clock.now());
        // 50 + 0.2 * (100 - 50)
        assert!((meter.fps() - 60.0).abs() < 0.1);
        meter.sample(clock.now());
        assert!((meter.fps() - 60.0).abs() < 0.1);
    }

    #[test]
    fn hud_draws_one_row_per_line() {
        let clock = TestClock::new();
        let mut hud = Hud::new();
        let mut scene = Scene::new();

        hud.overlay(&mut scene, clock.now());
        // panel + frame + fps
        assert_eq!(scene.len(), 3);

        hud.metrics = Some(Metrics::default());
        let mut scene = Scene::new();
        hud.overlay(&mut scene, clock.now());
        assert_eq!(hud.frame_count(), 2);
        assert_eq!(scene.len(), 6);
        assert!(matches!(
            scene.nodes.first(),
            Some(SceneNode::Rect { rect, .. }) if rect.h == 5.0 * ROW_HEIGHT
        ));
    }

    #[test]
    fn inspector_outlines_the_focused_control() {
        let style = Rc::new(Style::new("default"));
        let mut root = Container::new("root", style.clone());
        root.base_mut().set_bounds(Rect::new(10.0, 10.0, 200.0, 100.0));
        let b = share(Button::new("b", style));
        b.borrow_mut()
            .base_mut()
            .set_bounds(Rect::new(5.0, 5.0, 40.0, 20.0));
        root.add_control(&b).unwrap();
        let mut form = Form::new(root, Rc::new(Theme::new()));
        let clock = TestClock::new();
        form.update(&FrameTime::new(clock.now(), Duration::ZERO));
        assert!(form.root_mut().move_focus(Direction::Next, None));

        let mut insp = Inspector::new();
        let mut scene = form.render_scene();
        insp.frame(&form, &mut scene, clock.now());
        assert!(insp.hud.metrics.is_none());

        insp.hud.toggle_inspector();
        insp.frame(&form, &mut scene, clock.now());
        let m = insp.hud.metrics.clone().unwrap();
        assert_eq!(m.controls, 2);
        assert!(m.dirty >= 1);
        assert!(matches!(
            scene.nodes.last(),
            Some(SceneNode::Border { rect, .. }) if *rect == Rect::new(15.0, 15.0, 40.0, 20.0)
        ));
    }
}
