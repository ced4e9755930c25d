//! # Core types
//!
//! Everything the composition engine in `formwork-ui` shares with its
//! collaborators lives here:
//!
//! - Geometry: `Vec2`, `Size`, `Rect`, `Insets`, `Alignment`.
//! - Input: touch, mouse and key event kinds as fed by the host platform.
//! - Time: `Clock` / `FrameTime`. Nothing reads the wall clock directly, so
//!   scroll inertia and key-repeat timing can be driven by a `TestClock`.
//! - Theme: `Style` and `Theme`, the read-only `(style, state)` lookups for
//!   border, padding, margin, colors and image regions.
//! - Properties: typed key lookups used only while constructing controls.
//! - Output: `Scene` / `SceneNode`, and the `RenderBackend` trait a renderer
//!   implements.
//!
//! ```rust
//! use formwork_core::*;
//!
//! let r = Rect::new(10.0, 10.0, 100.0, 50.0);
//! let content = r.inset(Insets::uniform(5.0));
//! assert_eq!(content, Rect::new(15.0, 15.0, 90.0, 40.0));
//! assert!(content.contains(Vec2::new(105.0, 55.0)));
//! ```

pub mod animation;
pub mod color;
pub mod error;
pub mod geometry;
pub mod input;
pub mod properties;
pub mod render_api;
pub mod scene;
pub mod theme;

pub use animation::*;
pub use color::*;
pub use error::{Result, UiError};
pub use geometry::*;
pub use input::*;
pub use properties::*;
pub use render_api::*;
pub use scene::*;
pub use theme::*;
