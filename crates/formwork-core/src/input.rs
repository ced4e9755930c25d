/// Maximum number of simultaneous touch contacts tracked per container.
pub const MAX_CONTACT_INDICES: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchEvent {
    Press,
    Release,
    Move,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseEvent {
    Press(MouseButton),
    Release(MouseButton),
    Move,
    Wheel,
}

impl MouseEvent {
    /// Touch equivalent used when a control leaves a mouse event unhandled.
    pub fn as_touch(&self) -> Option<TouchEvent> {
        match self {
            MouseEvent::Press(MouseButton::Left) => Some(TouchEvent::Press),
            MouseEvent::Release(MouseButton::Left) => Some(TouchEvent::Release),
            MouseEvent::Move => Some(TouchEvent::Move),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyEvent {
    Press,
    Release,
    /// Translated character input, delivered after `Press`.
    Char,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Character(char),
    Enter,
    Tab,
    Shift,
    Backspace,
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,
    Space,
}
