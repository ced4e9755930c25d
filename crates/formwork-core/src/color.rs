use serde::{Deserialize, Deserializer, de};

/// 8-bit sRGB color with straight alpha.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color(pub u8, pub u8, pub u8, pub u8);

impl Color {
    pub const TRANSPARENT: Color = Color(0, 0, 0, 0);
    pub const BLACK: Color = Color(0, 0, 0, 255);
    pub const WHITE: Color = Color(255, 255, 255, 255);

    /// Parses `#RRGGBB` or `#RRGGBBAA` (the `#` is optional).
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let s = hex.trim().trim_start_matches('#');
        if !matches!(s.len(), 6 | 8) || !s.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(s.get(i..i + 2)?, 16).ok();
        let alpha = if s.len() == 8 { channel(6)? } else { 255 };
        Some(Color(channel(0)?, channel(2)?, channel(4)?, alpha))
    }

    /// Like [`Color::parse_hex`], falling back to opaque black.
    pub fn from_hex(hex: &str) -> Self {
        Self::parse_hex(hex).unwrap_or(Self::BLACK)
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Color(self.0, self.1, self.2, a)
    }

    /// Scales the alpha channel by `opacity` (0..=1).
    pub fn mul_alpha(self, opacity: f32) -> Self {
        let a = (self.3 as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        self.with_alpha(a)
    }

    pub fn is_transparent(&self) -> bool {
        self.3 == 0
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Color::parse_hex(&s).ok_or_else(|| de::Error::custom(format!("invalid color `{s}`")))
    }
}
