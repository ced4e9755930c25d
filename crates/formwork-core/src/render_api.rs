use crate::{Scene, Size, Vec2};

/// Offscreen color target a surface-bound form renders into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
}

impl FrameBuffer {
    /// Power-of-two target large enough for `size`.
    pub fn for_size(size: Size) -> Self {
        let w = (size.width.max(1.0).ceil() as u32).next_power_of_two();
        let h = (size.height.max(1.0).ceil() as u32).next_power_of_two();
        Self {
            width: w,
            height: h,
        }
    }
}

pub trait RenderBackend {
    /// Draws a scene straight to the screen.
    fn draw_scene(&mut self, scene: &Scene);
    /// Re-renders an offscreen target.
    fn draw_to_target(&mut self, target: &FrameBuffer, scene: &Scene);
    /// Draws the textured quad of a surface-bound form.
    fn draw_surface(&mut self, target: &FrameBuffer);
}

/// Maps a screen point onto a form bound to a 3D surface.
///
/// Implementations ray-cast against the form's quad; `None` means the ray
/// misses it.
pub trait SurfaceProjector {
    fn project(&self, screen: Vec2) -> Option<Vec2>;
}
