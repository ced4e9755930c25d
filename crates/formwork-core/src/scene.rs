use crate::{Alignment, Color, Rect};

/// Renderable output of one draw pass, in submission order.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub clear_color: Color,
    pub nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: SceneNode) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SceneNode {
    Rect {
        rect: Rect,
        color: Color,
    },
    Border {
        rect: Rect,
        color: Color,
        width: f32,
    },
    /// Themed image region (icons, scrollbar caps, slider thumbs).
    Image {
        rect: Rect,
        image: &'static str,
        color: Color,
    },
    Text {
        rect: Rect,
        text: String,
        color: Color,
        size: f32,
        alignment: Alignment,
    },
    PushClip {
        rect: Rect,
    },
    PopClip,
}
