//! Read-only style tables consumed by layout and drawing.
//!
//! Parsing skin/atlas files is the asset layer's job; this module only holds
//! the resolved values and answers `(style, state)` queries. A theme can be
//! deserialised from JSON for tests and tools:
//!
//! ```json
//! { "styles": { "Button": { "padding": { "left": 4 },
//!                           "normal": { "border": { "left": 2, "right": 2 } },
//!                           "active": { "background": "#2266AAFF" } } } }
//! ```

use std::collections::HashMap;
use std::rc::Rc;

use serde::Deserialize;

use crate::error::Result;
use crate::{Alignment, Color, Insets, Size};

/// Visual state of a control; selects the style overlay used to draw it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum State {
    #[default]
    Normal,
    Focus,
    Active,
    Disabled,
}

impl State {
    pub fn parse(s: &str) -> Option<State> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NORMAL" => Some(State::Normal),
            "FOCUS" => Some(State::Focus),
            "ACTIVE" => Some(State::Active),
            "DISABLED" => Some(State::Disabled),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImageRegion {
    pub width: f32,
    pub height: f32,
    pub color: Option<Color>,
}

impl ImageRegion {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Per-state values. Unset fields fall back to the `normal` overlay.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Overlay {
    pub border: Option<Insets>,
    pub background: Option<Color>,
    pub border_color: Option<Color>,
    pub text_color: Option<Color>,
    pub font_size: Option<f32>,
    pub text_alignment: Option<String>,
    pub opacity: Option<f32>,
    pub images: HashMap<String, ImageRegion>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Style {
    #[serde(skip)]
    pub id: String,
    pub padding: Insets,
    pub margin: Insets,
    pub normal: Overlay,
    pub focus: Overlay,
    pub active: Overlay,
    pub disabled: Overlay,
}

impl Style {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    fn overlay(&self, state: State) -> &Overlay {
        match state {
            State::Normal => &self.normal,
            State::Focus => &self.focus,
            State::Active => &self.active,
            State::Disabled => &self.disabled,
        }
    }

    fn lookup<T: Clone>(&self, state: State, f: impl Fn(&Overlay) -> Option<T>) -> Option<T> {
        f(self.overlay(state)).or_else(|| f(&self.normal))
    }

    pub fn border(&self, state: State) -> Insets {
        self.lookup(state, |o| o.border).unwrap_or_default()
    }

    pub fn padding(&self) -> Insets {
        self.padding
    }

    pub fn margin(&self) -> Insets {
        self.margin
    }

    pub fn background(&self, state: State) -> Option<Color> {
        self.lookup(state, |o| o.background)
    }

    pub fn border_color(&self, state: State) -> Option<Color> {
        self.lookup(state, |o| o.border_color)
    }

    pub fn text_color(&self, state: State) -> Color {
        self.lookup(state, |o| o.text_color).unwrap_or(Color::WHITE)
    }

    pub fn font_size(&self, state: State) -> f32 {
        self.lookup(state, |o| o.font_size).unwrap_or(16.0)
    }

    pub fn text_alignment(&self, state: State) -> Alignment {
        self.lookup(state, |o| o.text_alignment.clone())
            .and_then(|s| Alignment::parse(&s))
            .unwrap_or_default()
    }

    pub fn opacity(&self, state: State) -> f32 {
        self.lookup(state, |o| o.opacity).unwrap_or(1.0).clamp(0.0, 1.0)
    }

    /// Named image region; zero-sized when the style has no such image.
    pub fn image(&self, name: &str, state: State) -> ImageRegion {
        self.lookup(state, |o| o.images.get(name).copied())
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct ThemeFile {
    #[serde(default)]
    styles: HashMap<String, Style>,
}

/// A set of named styles shared by every control of a form.
#[derive(Debug, Default)]
pub struct Theme {
    styles: HashMap<String, Rc<Style>>,
    empty: Rc<Style>,
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(src: &str) -> Result<Self> {
        let file: ThemeFile = serde_json::from_str(src)?;
        let mut theme = Theme::new();
        for (id, mut style) in file.styles {
            style.id = id.clone();
            theme.styles.insert(id, Rc::new(style));
        }
        log::debug!("theme loaded with {} styles", theme.styles.len());
        Ok(theme)
    }

    pub fn insert_style(&mut self, style: Style) -> Rc<Style> {
        let rc = Rc::new(style);
        self.styles.insert(rc.id.clone(), rc.clone());
        rc
    }

    pub fn style(&self, id: &str) -> Option<Rc<Style>> {
        self.styles.get(id).cloned()
    }

    /// Style with no border, padding or images.
    pub fn empty_style(&self) -> Rc<Style> {
        self.empty.clone()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}
