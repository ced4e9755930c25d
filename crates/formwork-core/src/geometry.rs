use std::ops::{Add, AddAssign, Sub};

use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub fn distance(&self, other: Vec2) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    pub fn translate(&self, d: Vec2) -> Rect {
        Rect::new(self.x + d.x, self.y + d.y, self.w, self.h)
    }

    /// Overlap of two rects; an empty rect at `a`'s origin when they do not meet.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 < x0 || y1 < y0 {
            return Rect::new(self.x, self.y, 0.0, 0.0);
        }
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }

    /// Shrinks by the given insets. Width and height never go negative.
    pub fn inset(&self, i: Insets) -> Rect {
        Rect::new(
            self.x + i.left,
            self.y + i.top,
            (self.w - i.horizontal()).max(0.0),
            (self.h - i.vertical()).max(0.0),
        )
    }
}

/// Border, padding and margin widths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Insets {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Insets {
    pub const ZERO: Insets = Insets {
        left: 0.0,
        right: 0.0,
        top: 0.0,
        bottom: 0.0,
    };

    pub const fn uniform(v: f32) -> Self {
        Self {
            left: v,
            right: v,
            top: v,
            bottom: v,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

impl Add for Insets {
    type Output = Insets;
    fn add(self, rhs: Insets) -> Insets {
        Insets {
            left: self.left + rhs.left,
            right: self.right + rhs.right,
            top: self.top + rhs.top,
            bottom: self.bottom + rhs.bottom,
        }
    }
}

bitflags::bitflags! {
    /// Placement of a control inside its parent's content rect.
    ///
    /// A missing vertical bit means top, a missing horizontal bit means left.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Alignment: u8 {
        const LEFT = 0x01;
        const HCENTER = 0x02;
        const RIGHT = 0x04;
        const TOP = 0x10;
        const VCENTER = 0x20;
        const BOTTOM = 0x40;

        const TOP_LEFT = Self::TOP.bits() | Self::LEFT.bits();
        const VCENTER_HCENTER = Self::VCENTER.bits() | Self::HCENTER.bits();
        const BOTTOM_RIGHT = Self::BOTTOM.bits() | Self::RIGHT.bits();
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Alignment::TOP_LEFT
    }
}

impl Alignment {
    /// Parses `ALIGN_TOP_LEFT`, `ALIGN_VCENTER_HCENTER`, `ALIGN_BOTTOM` and friends.
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.trim().to_ascii_uppercase();
        let rest = rest.strip_prefix("ALIGN_")?;
        let mut out = Alignment::empty();
        for part in rest.split('_') {
            out |= match part {
                "LEFT" => Alignment::LEFT,
                "HCENTER" => Alignment::HCENTER,
                "RIGHT" => Alignment::RIGHT,
                "TOP" => Alignment::TOP,
                "VCENTER" => Alignment::VCENTER,
                "BOTTOM" => Alignment::BOTTOM,
                _ => return None,
            };
        }
        if !out.intersects(Alignment::TOP | Alignment::VCENTER | Alignment::BOTTOM) {
            out |= Alignment::TOP;
        }
        if !out.intersects(Alignment::LEFT | Alignment::HCENTER | Alignment::RIGHT) {
            out |= Alignment::LEFT;
        }
        Some(out)
    }

    pub fn is_top_left(&self) -> bool {
        !self.intersects(
            Alignment::VCENTER | Alignment::BOTTOM | Alignment::HCENTER | Alignment::RIGHT,
        )
    }
}
