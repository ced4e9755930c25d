//! # Layouts
//!
//! A [`Layout`] positions a container's children inside its content rect.
//! Layouts hold configuration only, never per-container state, so the same
//! value can be shared by any number of containers.
//!
//! Every variant:
//!
//! 1. resolves relative bounds, then writes positions (and auto sizes) back
//!    onto the children,
//! 2. re-runs `update` on children that are dirty, or on all of them when
//!    `LayoutContext::refresh` is set (viewport moved or scroll changed),
//! 3. returns the content extent so the container can clamp scrolling.
//!
//! Overflowing children are placed anyway; clipping happens at draw time.

use formwork_core::*;

use crate::control::{AutoSize, Control, ControlRef};
use crate::scroll::clamp_offset;

/// Inputs for one layout pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutContext {
    /// Absolute rect children are clipped to.
    pub clip: Rect,
    /// Absolute top-left of the content rect.
    pub origin: Vec2,
    /// Size of the content rect (bounds minus border, padding and scrollbars).
    pub content: Size,
    pub scroll_offset: Vec2,
    /// Update every child, not only dirty ones.
    pub refresh: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutOutcome {
    /// Extent of the placed children, margins included.
    pub extent: Size,
    /// Offset the children were updated with (clamped by `Scroll`).
    pub scroll_offset: Vec2,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlowLayout {
    pub horizontal_spacing: f32,
    pub vertical_spacing: f32,
    pub right_to_left: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VerticalLayout {
    pub spacing: f32,
    pub bottom_to_top: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Layout {
    #[default]
    Absolute,
    Flow(FlowLayout),
    Vertical(VerticalLayout),
    Scroll,
}

impl Layout {
    /// Parses `LAYOUT_ABSOLUTE`, `LAYOUT_FLOW`, `LAYOUT_VERTICAL`, `LAYOUT_SCROLL`.
    pub fn parse(s: &str) -> Option<Layout> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LAYOUT_ABSOLUTE" | "ABSOLUTE" => Some(Layout::Absolute),
            "LAYOUT_FLOW" | "FLOW" => Some(Layout::Flow(FlowLayout::default())),
            "LAYOUT_VERTICAL" | "VERTICAL" => Some(Layout::Vertical(VerticalLayout::default())),
            "LAYOUT_SCROLL" | "SCROLL" => Some(Layout::Scroll),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Layout::Absolute => "LAYOUT_ABSOLUTE",
            Layout::Flow(_) => "LAYOUT_FLOW",
            Layout::Vertical(_) => "LAYOUT_VERTICAL",
            Layout::Scroll => "LAYOUT_SCROLL",
        }
    }

    pub fn update(&self, controls: &[ControlRef], cx: &LayoutContext) -> LayoutOutcome {
        for c in controls {
            c.borrow_mut().base_mut().resolve_relative(cx.content);
        }
        match self {
            Layout::Absolute => absolute(controls, cx),
            Layout::Flow(f) => flow(f, controls, cx),
            Layout::Vertical(v) => vertical(v, controls, cx),
            Layout::Scroll => scroll(controls, cx),
        }
    }
}

fn refresh(c: &mut dyn Control, cx: &LayoutContext, force: bool) {
    if force || c.is_dirty() {
        c.update(cx.clip, cx.origin + cx.scroll_offset);
    }
}

/// Maximum of `x + w + margin.right` and `y + h + margin.bottom` over the
/// visible children.
pub fn content_extent(controls: &[ControlRef]) -> Size {
    let mut extent = Size::default();
    for c in controls {
        let c = c.borrow();
        let b = c.base();
        if !b.is_visible() {
            continue;
        }
        let r = b.bounds();
        let m = b.margin();
        extent.width = extent.width.max(r.right() + m.right);
        extent.height = extent.height.max(r.bottom() + m.bottom);
    }
    extent
}

fn absolute(controls: &[ControlRef], cx: &LayoutContext) -> LayoutOutcome {
    for c in controls {
        let mut c = c.borrow_mut();
        align(c.base_mut(), cx.content);
        refresh(&mut *c, cx, cx.refresh);
    }
    LayoutOutcome {
        extent: content_extent(controls),
        scroll_offset: cx.scroll_offset,
    }
}

/// Auto-size fill and alignment against the content rect.
///
/// Only the aligned axis is overwritten: a control aligned `BOTTOM` keeps its
/// explicit x.
fn align(b: &mut crate::control::ControlBase, content: Size) {
    let auto = b.auto_size();
    let alignment = b.alignment();
    if alignment.is_top_left() && !auto.intersects(AutoSize::BOTH) {
        return;
    }
    let r = b.bounds();
    let w = if auto.contains(AutoSize::WIDTH) {
        content.width
    } else {
        r.w
    };
    let h = if auto.contains(AutoSize::HEIGHT) {
        content.height
    } else {
        r.h
    };
    b.fit_size(w, h);

    let mut x = r.x;
    let mut y = r.y;
    if alignment.contains(Alignment::BOTTOM) {
        y = content.height - h;
    } else if alignment.contains(Alignment::VCENTER) {
        y = content.height / 2.0 - h / 2.0;
    }
    if alignment.contains(Alignment::RIGHT) {
        x = content.width - w;
    } else if alignment.contains(Alignment::HCENTER) {
        x = content.width / 2.0 - w / 2.0;
    }
    b.set_position(x, y);
}

fn flow(f: &FlowLayout, controls: &[ControlRef], cx: &LayoutContext) -> LayoutOutcome {
    let clip_w = cx.content.width;
    let mut x = 0.0f32;
    let mut row_y = 0.0f32;
    let mut tallest = 0.0f32;

    for c in controls {
        let mut c = c.borrow_mut();
        if !c.base().is_visible() {
            continue;
        }
        let m = c.base().margin();
        let Size {
            width: w,
            height: h,
        } = c.base().size();

        // greedy wrap; a child wider than the row wraps even when first
        if x + m.left + w >= clip_w {
            x = 0.0;
            row_y += tallest + f.vertical_spacing;
            tallest = 0.0;
        }
        x += m.left;

        let px = if f.right_to_left { clip_w - x - w } else { x };
        c.base_mut().set_position(px, row_y + m.top);

        x += w + m.right + f.horizontal_spacing;
        tallest = tallest.max(h + m.top + m.bottom);

        refresh(&mut *c, cx, cx.refresh);
    }

    LayoutOutcome {
        extent: content_extent(controls),
        scroll_offset: cx.scroll_offset,
    }
}

fn vertical(v: &VerticalLayout, controls: &[ControlRef], cx: &LayoutContext) -> LayoutOutcome {
    let mut y = 0.0f32;
    let mut place = |c: &ControlRef| {
        let mut c = c.borrow_mut();
        if !c.base().is_visible() {
            return;
        }
        let m = c.base().margin();
        let r = c.base().bounds();
        let alignment = c.base().alignment();

        let x = if alignment.contains(Alignment::RIGHT) {
            cx.content.width - r.w
        } else if alignment.contains(Alignment::HCENTER) {
            cx.content.width / 2.0 - r.w / 2.0
        } else {
            0.0
        };
        y += m.top;
        c.base_mut().set_position(x, y);
        y += r.h + m.bottom + v.spacing;

        refresh(&mut *c, cx, cx.refresh);
    };
    if v.bottom_to_top {
        controls.iter().rev().for_each(&mut place);
    } else {
        controls.iter().for_each(&mut place);
    }

    LayoutOutcome {
        extent: content_extent(controls),
        scroll_offset: cx.scroll_offset,
    }
}

fn scroll(controls: &[ControlRef], cx: &LayoutContext) -> LayoutOutcome {
    let extent = content_extent(controls);
    let offset = clamp_offset(cx.scroll_offset, extent, cx.content);
    let cx = LayoutContext {
        scroll_offset: offset,
        ..*cx
    };
    for c in controls {
        let mut c = c.borrow_mut();
        refresh(&mut *c, &cx, true);
    }
    LayoutOutcome {
        extent,
        scroll_offset: offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{Relative, share};
    use crate::widgets::Label;
    use std::rc::Rc;

    fn label(id: &str, w: f32, h: f32) -> ControlRef {
        let mut l = Label::new(id, Rc::new(Style::new("Label")));
        l.base_mut().set_size(w, h);
        share(l)
    }

    fn margined(id: &str, w: f32, h: f32) -> ControlRef {
        let style = Style {
            margin: Insets {
                left: 4.0,
                right: 6.0,
                top: 2.0,
                bottom: 3.0,
            },
            ..Style::new("Spaced")
        };
        let mut l = Label::new(id, Rc::new(style));
        l.base_mut().set_size(w, h);
        share(l)
    }

    fn cx(w: f32, h: f32) -> LayoutContext {
        LayoutContext {
            clip: Rect::new(0.0, 0.0, w, h),
            origin: Vec2::ZERO,
            content: Size::new(w, h),
            scroll_offset: Vec2::ZERO,
            refresh: false,
        }
    }

    fn positions(controls: &[ControlRef]) -> String {
        controls
            .iter()
            .map(|c| {
                let c = c.borrow();
                let p = c.base().position();
                format!("{} ({}, {})", c.base().id(), p.x, p.y)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn flow_wraps_when_row_is_full() {
        let controls = vec![label("a", 120.0, 30.0), label("b", 90.0, 20.0)];
        Layout::Flow(FlowLayout::default()).update(&controls, &cx(200.0, 100.0));
        insta::assert_snapshot!(positions(&controls), @r"
        a (0, 0)
        b (0, 30)
        ");
    }

    #[test]
    fn flow_exact_fit_still_wraps() {
        // 100 + 100 >= 200
        let controls = vec![
            label("a", 100.0, 10.0),
            label("b", 100.0, 10.0),
            label("c", 50.0, 10.0),
            label("d", 49.0, 10.0),
        ];
        let flow = FlowLayout {
            horizontal_spacing: 0.0,
            vertical_spacing: 5.0,
            right_to_left: false,
        };
        Layout::Flow(flow).update(&controls, &cx(200.0, 100.0));
        insta::assert_snapshot!(positions(&controls), @r"
        a (0, 0)
        b (0, 15)
        c (100, 15)
        d (150, 15)
        ");
    }

    #[test]
    fn flow_oversized_child_wraps_even_when_first() {
        let controls = vec![label("wide", 400.0, 10.0), label("next", 10.0, 10.0)];
        Layout::Flow(FlowLayout::default()).update(&controls, &cx(200.0, 100.0));
        insta::assert_snapshot!(positions(&controls), @r"
        wide (0, 0)
        next (0, 10)
        ");

        let spaced = FlowLayout {
            vertical_spacing: 5.0,
            ..Default::default()
        };
        Layout::Flow(spaced).update(&controls, &cx(200.0, 100.0));
        insta::assert_snapshot!(positions(&controls), @r"
        wide (0, 5)
        next (0, 20)
        ");
    }

    #[test]
    fn flow_counts_margins_in_wrap_and_row_height() {
        // 102 + 4 + 30 >= 100
        let controls = vec![
            margined("a", 40.0, 10.0),
            margined("b", 40.0, 20.0),
            margined("c", 30.0, 10.0),
        ];
        let flow = FlowLayout {
            horizontal_spacing: 1.0,
            vertical_spacing: 5.0,
            right_to_left: false,
        };
        let out = Layout::Flow(flow).update(&controls, &cx(100.0, 100.0));
        insta::assert_snapshot!(positions(&controls), @r"
        a (4, 2)
        b (55, 2)
        c (4, 32)
        ");
        assert_eq!(out.extent, Size::new(101.0, 45.0));
    }

    #[test]
    fn flow_skips_invisible_and_mirrors() {
        let controls = vec![
            label("a", 50.0, 10.0),
            label("hidden", 50.0, 10.0),
            label("b", 50.0, 10.0),
        ];
        controls[1].borrow_mut().base_mut().set_visible(false);
        let flow = FlowLayout {
            right_to_left: true,
            ..Default::default()
        };
        Layout::Flow(flow).update(&controls, &cx(200.0, 100.0));
        insta::assert_snapshot!(positions(&controls), @r"
        a (150, 0)
        hidden (0, 0)
        b (100, 0)
        ");
    }

    #[test]
    fn vertical_bottom_to_top() {
        let controls = vec![
            label("0", 10.0, 10.0),
            label("1", 10.0, 20.0),
            label("2", 10.0, 30.0),
        ];
        let v = VerticalLayout {
            spacing: 0.0,
            bottom_to_top: true,
        };
        Layout::Vertical(v).update(&controls, &cx(100.0, 100.0));
        insta::assert_snapshot!(positions(&controls), @r"
        0 (0, 50)
        1 (0, 30)
        2 (0, 0)
        ");
    }

    #[test]
    fn vertical_accumulates_margins_both_ways() {
        let controls = vec![margined("a", 10.0, 10.0), margined("b", 10.0, 20.0)];
        let out = Layout::Vertical(VerticalLayout::default()).update(&controls, &cx(100.0, 100.0));
        insta::assert_snapshot!(positions(&controls), @r"
        a (0, 2)
        b (0, 17)
        ");
        assert_eq!(out.extent, Size::new(16.0, 40.0));

        let up = VerticalLayout {
            spacing: 0.0,
            bottom_to_top: true,
        };
        Layout::Vertical(up).update(&controls, &cx(100.0, 100.0));
        insta::assert_snapshot!(positions(&controls), @r"
        a (0, 27)
        b (0, 2)
        ");
    }

    #[test]
    fn vertical_stacks_with_alignment() {
        let controls = vec![
            label("left", 10.0, 10.0),
            label("right", 10.0, 20.0),
            label("center", 20.0, 30.0),
        ];
        controls[1]
            .borrow_mut()
            .base_mut()
            .set_alignment(Alignment::TOP | Alignment::RIGHT);
        controls[2]
            .borrow_mut()
            .base_mut()
            .set_alignment(Alignment::TOP | Alignment::HCENTER);
        let out = Layout::Vertical(VerticalLayout::default()).update(&controls, &cx(100.0, 100.0));
        insta::assert_snapshot!(positions(&controls), @r"
        left (0, 0)
        right (90, 10)
        center (40, 30)
        ");
        assert_eq!(out.extent, Size::new(100.0, 60.0));
    }

    #[test]
    fn absolute_alignment_and_auto_size() {
        let controls = vec![
            label("free", 10.0, 10.0),
            label("br", 20.0, 10.0),
            label("centered", 40.0, 20.0),
            label("fill", 1.0, 1.0),
        ];
        controls[0].borrow_mut().base_mut().set_position(7.0, 9.0);
        controls[1]
            .borrow_mut()
            .base_mut()
            .set_alignment(Alignment::BOTTOM_RIGHT);
        controls[2]
            .borrow_mut()
            .base_mut()
            .set_alignment(Alignment::VCENTER_HCENTER);
        controls[3]
            .borrow_mut()
            .base_mut()
            .set_auto_size(AutoSize::BOTH);

        Layout::Absolute.update(&controls, &cx(200.0, 100.0));
        insta::assert_snapshot!(positions(&controls), @r"
        free (7, 9)
        br (180, 90)
        centered (80, 40)
        fill (0, 0)
        ");
        assert_eq!(controls[3].borrow().base().size(), Size::new(200.0, 100.0));
    }

    #[test]
    fn scroll_clamps_offset_and_translates_children() {
        let controls = vec![label("top", 100.0, 100.0), label("bottom", 100.0, 100.0)];
        controls[1].borrow_mut().base_mut().set_position(0.0, 400.0);
        let mut cx = cx(100.0, 200.0);
        cx.scroll_offset = Vec2::new(0.0, -1000.0);

        let out = Layout::Scroll.update(&controls, &cx);
        assert_eq!(out.extent, Size::new(100.0, 500.0));
        assert_eq!(out.scroll_offset, Vec2::new(0.0, -300.0));
        assert_eq!(
            controls[1].borrow().base().absolute_bounds(),
            Rect::new(0.0, 100.0, 100.0, 100.0)
        );
    }

    #[test]
    fn scroll_extent_includes_far_margins() {
        let controls = vec![margined("top", 100.0, 100.0), margined("bottom", 100.0, 100.0)];
        controls[1].borrow_mut().base_mut().set_position(0.0, 400.0);
        assert_eq!(content_extent(&controls), Size::new(106.0, 503.0));

        let mut cx = cx(100.0, 200.0);
        cx.scroll_offset = Vec2::new(-50.0, -1000.0);
        let out = Layout::Scroll.update(&controls, &cx);
        assert_eq!(out.scroll_offset, Vec2::new(-6.0, -303.0));
    }

    #[test]
    fn relative_bounds_follow_the_content_size() {
        let controls = vec![label("half", 10.0, 10.0), label("fixed", 30.0, 10.0)];
        {
            let mut c = controls[0].borrow_mut();
            let b = c.base_mut();
            b.set_relative(Relative::X | Relative::HEIGHT, Some(0.25));
            b.set_relative(Relative::WIDTH, Some(0.5));
        }
        Layout::Absolute.update(&controls, &cx(200.0, 80.0));
        assert_eq!(
            controls[0].borrow().base().bounds(),
            Rect::new(50.0, 0.0, 100.0, 20.0)
        );

        Layout::Absolute.update(&controls, &cx(400.0, 80.0));
        assert_eq!(
            controls[0].borrow().base().bounds(),
            Rect::new(100.0, 0.0, 200.0, 20.0)
        );
        assert_eq!(controls[1].borrow().base().size(), Size::new(30.0, 10.0));

        controls[0]
            .borrow_mut()
            .base_mut()
            .set_relative(Relative::WIDTH, None);
        Layout::Absolute.update(&controls, &cx(100.0, 80.0));
        assert_eq!(
            controls[0].borrow().base().bounds(),
            Rect::new(25.0, 0.0, 200.0, 20.0)
        );
    }

    #[test]
    fn empty_and_degenerate_inputs() {
        for layout in [
            Layout::Absolute,
            Layout::Flow(FlowLayout::default()),
            Layout::Vertical(VerticalLayout::default()),
            Layout::Scroll,
        ] {
            let out = layout.update(&[], &cx(0.0, 0.0));
            assert_eq!(out.extent, Size::default());
            assert_eq!(out.scroll_offset, Vec2::ZERO);
        }
    }

    #[test]
    fn only_dirty_children_are_refreshed() {
        let controls = vec![label("a", 10.0, 10.0), label("b", 10.0, 10.0)];
        let v = Layout::Vertical(VerticalLayout::default());
        v.update(&controls, &cx(100.0, 100.0));
        for c in &controls {
            c.borrow_mut().clear_dirty();
        }

        let mut moved = cx(100.0, 100.0);
        moved.origin = Vec2::new(5.0, 5.0);
        v.update(&controls, &moved);
        // clean children keep their previous absolute geometry
        assert_eq!(
            controls[0].borrow().base().absolute_bounds(),
            Rect::new(0.0, 0.0, 10.0, 10.0)
        );

        moved.refresh = true;
        v.update(&controls, &moved);
        assert_eq!(
            controls[0].borrow().base().absolute_bounds(),
            Rect::new(5.0, 5.0, 10.0, 10.0)
        );
    }
}
