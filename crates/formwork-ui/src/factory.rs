//! Builds control trees from property namespaces.
//!
//! Each namespace names its control kind through `type`. Keys understood by
//! every kind:
//!
//! | key                  | value                                    |
//! |----------------------|------------------------------------------|
//! | `id`                 | string                                   |
//! | `style`              | style id; must exist in the theme        |
//! | `position`, `size`   | vector2                                  |
//! | `x`, `y`, `width`, `height` | number, or `"25%"` of the parent's content size |
//! | `alignment`          | `ALIGN_TOP_LEFT`, `ALIGN_VCENTER_RIGHT`… |
//! | `autoWidth`, `autoHeight` | bool, or `AUTO_SIZE_NONE`/`STRETCH`/`FIT` |
//! | `visible`, `enabled`, `canFocus`, `consumeInputEvents` | bool |
//! | `zIndex`, `focusIndex` | number                                 |
//!
//! Containers also read `layout` (a `LAYOUT_*` string, or a namespace whose
//! `type` is the layout plus its spacing keys), `scroll` (`SCROLL_*`),
//! `scrollBarsAutoHide`, `scrollingFriction`, `scrollWheelSpeed` and the
//! child list `controls`.
//!
//! A child that fails to build is logged and skipped; its siblings still are.

use std::rc::Rc;

use formwork_core::*;

use crate::container::Container;
use crate::control::{AutoSize, Control, ControlBase, ControlRef, Relative, share};
use crate::layout::{FlowLayout, Layout, VerticalLayout};
use crate::scroll::ScrollDirections;
use crate::widgets::{Button, CheckBox, Label, Slider};

pub struct ControlFactory {
    theme: Rc<Theme>,
}

impl ControlFactory {
    pub fn new(theme: Rc<Theme>) -> Self {
        Self { theme }
    }

    pub fn theme(&self) -> &Rc<Theme> {
        &self.theme
    }

    pub fn create(&self, props: &dyn Properties) -> Result<ControlRef> {
        let kind = props.namespace();
        let id = props.get_string("id").unwrap_or_default();
        let style = self.style_for(props)?;

        let control: ControlRef = match kind {
            "container" => share(self.create_container(props)?),
            "label" => {
                let mut c = Label::new(id, style);
                if let Some(text) = props.get_string("text") {
                    c.set_text(&text);
                }
                apply_common(c.base_mut(), props);
                share(c)
            }
            "button" => {
                let mut c = Button::new(id, style);
                if let Some(text) = props.get_string("text") {
                    c.set_text(&text);
                }
                apply_common(c.base_mut(), props);
                share(c)
            }
            "checkbox" => {
                let mut c = CheckBox::new(id, style);
                if let Some(text) = props.get_string("text") {
                    c = c.with_text(&text);
                }
                c.set_checked(props.get_bool("checked").unwrap_or(false));
                apply_common(c.base_mut(), props);
                share(c)
            }
            "slider" => {
                let min = props.get_float("min").unwrap_or(0.0);
                let max = props.get_float("max").unwrap_or(1.0);
                let step = props.get_float("step").unwrap_or(0.0);
                let mut c = Slider::new(id, style).with_range(min, max, step);
                if let Some(v) = props.get_float("value") {
                    c.set_value(v);
                }
                apply_common(c.base_mut(), props);
                share(c)
            }
            "" => return Err(UiError::MissingProperty("type".into())),
            other => return Err(UiError::UnknownControlType(other.into())),
        };
        Ok(control)
    }

    /// Builds a container and, recursively, its children.
    pub fn create_container(&self, props: &dyn Properties) -> Result<Container> {
        let id = props.get_string("id").unwrap_or_default();
        let mut c = Container::new(id, self.style_for(props)?);
        apply_common(c.base_mut(), props);

        if let Some(scroll) = props.get_string("scroll") {
            match ScrollDirections::parse(&scroll) {
                Some(d) => c.set_scroll(d),
                None => log::warn!("{}: unknown scroll `{scroll}`", c.base().id()),
            }
        }
        if let Some(layout) = layout_from(props) {
            c.set_layout(layout);
        }
        {
            let cfg = c.scroll_config_mut();
            if let Some(b) = props.get_bool("scrollBarsAutoHide") {
                cfg.auto_hide = b;
            }
            if let Some(f) = props.get_float("scrollingFriction") {
                cfg.friction = f.max(0.0);
            }
            if let Some(s) = props.get_float("scrollWheelSpeed") {
                cfg.wheel_speed = s;
            }
        }

        for child in props.children() {
            match self.create(child.as_ref()) {
                Ok(control) => {
                    if let Err(e) = c.add_control(&control) {
                        log::warn!("{}: {e}", c.base().id());
                    }
                }
                Err(e) => log::warn!("{}: skipping child: {e}", c.base().id()),
            }
        }
        Ok(c)
    }

    /// A named style must exist. Without one, the style named after the
    /// control kind is used, or an empty style.
    fn style_for(&self, props: &dyn Properties) -> Result<Rc<Style>> {
        match props.get_string("style") {
            Some(name) => self
                .theme
                .style(&name)
                .ok_or(UiError::MissingStyle(name)),
            None => Ok(self
                .theme
                .style(props.namespace())
                .unwrap_or_else(|| self.theme.empty_style())),
        }
    }
}

fn apply_common(base: &mut ControlBase, props: &dyn Properties) {
    if let Some(p) = props.get_vector2("position") {
        base.set_position(p.x, p.y);
    }
    if let Some(s) = props.get_vector2("size") {
        base.set_size(s.x, s.y);
    }
    for (key, part) in [
        ("x", Relative::X),
        ("y", Relative::Y),
        ("width", Relative::WIDTH),
        ("height", Relative::HEIGHT),
    ] {
        let Some(raw) = props.get_string(key) else {
            continue;
        };
        match parse_length(&raw) {
            Some(Length::Fraction(f)) => base.set_relative(part, Some(f)),
            Some(Length::Absolute(v)) => {
                let r = base.bounds();
                match part {
                    Relative::X => base.set_position(v, r.y),
                    Relative::Y => base.set_position(r.x, v),
                    Relative::WIDTH => base.set_size(v, r.h),
                    _ => base.set_size(r.w, v),
                }
            }
            None => log::warn!("{}: bad {key} `{raw}`", base.id()),
        }
    }

    let mut auto = base.auto_size();
    for (key, stretch, fit) in [
        ("autoWidth", AutoSize::WIDTH, AutoSize::FIT_WIDTH),
        ("autoHeight", AutoSize::HEIGHT, AutoSize::FIT_HEIGHT),
    ] {
        let Some(raw) = props.get_string(key) else {
            continue;
        };
        auto.remove(stretch | fit);
        match raw.trim().to_ascii_uppercase().as_str() {
            "TRUE" | "AUTO_SIZE_STRETCH" => auto.insert(stretch),
            "AUTO_SIZE_FIT" => auto.insert(fit),
            "FALSE" | "AUTO_SIZE_NONE" => {}
            _ => log::warn!("{}: unknown {key} `{raw}`", base.id()),
        }
    }
    base.set_auto_size(auto);

    if let Some(a) = props.get_string("alignment") {
        match Alignment::parse(&a) {
            Some(a) => base.set_alignment(a),
            None => log::warn!("{}: unknown alignment `{a}`", base.id()),
        }
    }
    if let Some(b) = props.get_bool("visible") {
        base.set_visible(b);
    }
    if let Some(b) = props.get_bool("enabled") {
        base.set_enabled(b);
    }
    if let Some(b) = props.get_bool("canFocus") {
        base.set_can_focus(b);
    }
    if let Some(b) = props.get_bool("consumeInputEvents") {
        base.set_consume_input_events(b);
    }
    if let Some(z) = props.get_float("zIndex") {
        base.set_z_index(z as i32);
    }
    if let Some(f) = props.get_float("focusIndex") {
        base.set_focus_index(f as i32);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Length {
    Absolute(f32),
    Fraction(f32),
}

/// `"40"` or `"25%"`.
fn parse_length(s: &str) -> Option<Length> {
    let s = s.trim();
    match s.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f32>().ok().map(|p| Length::Fraction(p / 100.0)),
        None => s.parse().ok().map(Length::Absolute),
    }
}

fn layout_from(props: &dyn Properties) -> Option<Layout> {
    if let Some(ns) = props.get_namespace("layout") {
        let kind = ns.namespace().to_owned();
        let Some(layout) = Layout::parse(&kind) else {
            log::warn!("unknown layout `{kind}`");
            return None;
        };
        return Some(match layout {
            Layout::Flow(_) => Layout::Flow(FlowLayout {
                horizontal_spacing: ns.get_float("horizontalSpacing").unwrap_or(0.0),
                vertical_spacing: ns.get_float("verticalSpacing").unwrap_or(0.0),
                right_to_left: ns.get_bool("rightToLeft").unwrap_or(false),
            }),
            Layout::Vertical(_) => Layout::Vertical(VerticalLayout {
                spacing: ns.get_float("spacing").unwrap_or(0.0),
                bottom_to_top: ns.get_bool("bottomToTop").unwrap_or(false),
            }),
            other => other,
        });
    }
    let name = props.get_string("layout")?;
    let layout = Layout::parse(&name);
    if layout.is_none() {
        log::warn!("unknown layout `{name}`");
    }
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Form;

    fn theme() -> Rc<Theme> {
        Rc::new(
            Theme::from_json(
                r##"{ "styles": {
                    "panel": { "padding": { "left": 5, "top": 5 } },
                    "button": { "normal": { "background": "#333333" } }
                } }"##,
            )
            .unwrap(),
        )
    }

    fn props(src: &str) -> JsonProperties {
        JsonProperties::from_json(src).unwrap()
    }

    #[test]
    fn builds_a_tree() {
        let f = ControlFactory::new(theme());
        let root = f
            .create_container(&props(
                r#"{ "type": "container", "id": "root", "style": "panel",
                     "size": [200, 100], "scroll": "SCROLL_VERTICAL",
                     "scrollBarsAutoHide": false, "scrollingFriction": 2,
                     "layout": { "type": "LAYOUT_VERTICAL", "spacing": 4, "bottomToTop": true },
                     "controls": [
                        { "type": "label", "id": "title", "text": "Settings", "size": [100, 20] },
                        { "type": "button", "id": "ok", "text": "OK", "focusIndex": 3 },
                        { "type": "slider", "id": "vol", "min": 0, "max": 10, "step": 1, "value": 6.4 },
                        { "type": "checkbox", "id": "mute", "checked": true }
                     ] }"#,
            ))
            .unwrap();

        assert_eq!(root.base().id(), "root");
        assert_eq!(root.base().padding().left, 5.0);
        assert_eq!(root.base().size(), Size::new(200.0, 100.0));
        assert_eq!(root.scroll(), ScrollDirections::VERTICAL);
        assert!(!root.scroll_state().config().auto_hide);
        assert_eq!(root.scroll_state().config().friction, 2.0);
        assert_eq!(
            root.layout(),
            Layout::Vertical(VerticalLayout {
                spacing: 4.0,
                bottom_to_top: true
            })
        );
        assert_eq!(root.control_count(), 4);

        // unnamed style falls back to the kind's style
        let ok = root.control_by_id("ok").unwrap();
        assert_eq!(ok.borrow().base().style().id, "button");
        assert_eq!(ok.borrow().base().focus_index(), Some(3));

        let vol = root.control_by_id("vol").unwrap();
        let v = vol.borrow().as_any().downcast_ref::<Slider>().map(Slider::value);
        assert_eq!(v, Some(6.0));
    }

    #[test]
    fn common_flags() {
        let f = ControlFactory::new(theme());
        let c = f
            .create(&props(
                r#"{ "type": "Label", "id": "l", "position": "3, 4",
                     "alignment": "ALIGN_BOTTOM_HCENTER", "autoWidth": true,
                     "visible": false, "enabled": false, "consumeInputEvents": true,
                     "zIndex": 7 }"#,
            ))
            .unwrap();
        let c = c.borrow();
        let b = c.base();
        assert_eq!(c.type_name(), "Label");
        assert_eq!(b.position(), Vec2::new(3.0, 4.0));
        assert_eq!(b.alignment(), Alignment::BOTTOM | Alignment::HCENTER);
        assert_eq!(b.auto_size(), AutoSize::WIDTH);
        assert!(!b.is_visible());
        assert_eq!(b.state(), State::Disabled);
        assert!(b.consume_input_events());
        assert_eq!(b.z_index(), Some(7));
    }

    #[test]
    fn relative_bounds_and_fit_sizing() {
        let f = ControlFactory::new(theme());
        let c = f
            .create_container(&props(
                r#"{ "type": "container", "id": "bar", "autoWidth": "AUTO_SIZE_FIT",
                     "autoHeight": "AUTO_SIZE_STRETCH",
                     "controls": [
                        { "type": "label", "id": "l", "x": "50%", "y": 4, "width": "25%", "height": 12 }
                     ] }"#,
            ))
            .unwrap();
        assert_eq!(c.base().auto_size(), AutoSize::FIT_WIDTH | AutoSize::HEIGHT);

        let l = c.control_by_id("l").unwrap();
        let l = l.borrow();
        assert_eq!(l.base().relative(), Relative::X | Relative::WIDTH);
        assert_eq!(l.base().bounds(), Rect::new(0.0, 4.0, 0.0, 12.0));

        assert_eq!(parse_length(" 25% "), Some(Length::Fraction(0.25)));
        assert_eq!(parse_length("40"), Some(Length::Absolute(40.0)));
        assert_eq!(parse_length("wide"), None);
    }

    #[test]
    fn construction_errors() {
        let f = ControlFactory::new(theme());
        assert!(matches!(
            f.create(&props(r#"{ "type": "button", "style": "nope" }"#)),
            Err(UiError::MissingStyle(s)) if s == "nope"
        ));
        assert!(matches!(
            f.create(&props(r#"{ "type": "radar" }"#)),
            Err(UiError::UnknownControlType(s)) if s == "radar"
        ));
        assert!(matches!(
            f.create(&props(r#"{ "id": "untyped" }"#)),
            Err(UiError::MissingProperty(_))
        ));
    }

    #[test]
    fn bad_children_are_skipped() {
        let f = ControlFactory::new(theme());
        let root = f
            .create_container(&props(
                r#"{ "type": "container", "layout": "LAYOUT_FLOW",
                     "controls": [
                        { "type": "button", "id": "a" },
                        { "type": "button", "id": "b", "style": "missing" },
                        { "type": "container", "id": "inner",
                          "controls": [ { "type": "radar" }, { "type": "label", "id": "c" } ] }
                     ] }"#,
            ))
            .unwrap();
        assert_eq!(root.layout(), Layout::Flow(FlowLayout::default()));
        assert_eq!(root.control_count(), 2);
        assert!(root.control_by_id("b").is_none());
        assert!(root.control_by_id("c").is_some());
        assert_eq!(root.count_controls(), 4);
    }

    #[test]
    fn forms_build_from_properties() {
        let form = Form::from_properties(
            &props(r#"{ "type": "container", "id": "main", "size": [320, 240] }"#),
            theme(),
        )
        .unwrap();
        assert_eq!(form.id(), "main");
        assert!(form.root().base().consume_input_events());
        assert!(Form::from_properties(&props(r#"{ "type": "container", "style": "x" }"#), theme()).is_err());
    }
}
