//! Retained-mode control tree: controls, layouts, containers and forms.
//!
//! ```rust
//! use std::rc::Rc;
//! use formwork_core::*;
//! use formwork_ui::*;
//!
//! let style = Rc::new(Style::new("default"));
//! let mut root = Container::new("root", style.clone()).with_layout(Layout::Vertical(
//!     VerticalLayout { spacing: 4.0, ..Default::default() },
//! ));
//! root.base_mut().set_size(200.0, 100.0);
//!
//! let ok = share(Button::new("ok", style.clone()).with_text("OK"));
//! ok.borrow_mut().base_mut().set_size(80.0, 20.0);
//! let cancel = share(Button::new("cancel", style).with_text("Cancel"));
//! cancel.borrow_mut().base_mut().set_size(80.0, 20.0);
//! root.add_control(&ok).unwrap();
//! root.add_control(&cancel).unwrap();
//!
//! root.update(Rect::from_size(root.base().size()), Vec2::ZERO);
//! assert_eq!(cancel.borrow().base().position(), Vec2::new(0.0, 24.0));
//! ```

pub mod container;
pub mod control;
pub mod factory;
pub mod focus;
pub mod form;
pub mod layout;
pub mod scroll;
pub mod widgets;

pub use container::Container;
pub use control::{
    AutoSize, Control, ControlBase, ControlRef, EventContext, EventKind, Relative, share,
};
pub use factory::ControlFactory;
pub use focus::{Direction, FocusConfig};
pub use form::{Form, FormHandle, FormRegistry};
pub use layout::{FlowLayout, Layout, VerticalLayout};
pub use scroll::{ScrollConfig, ScrollDirections, ScrollState};
pub use widgets::{Button, CheckBox, Label, Slider};
