//! Input event model.
//!
//! Pointer and keyboard events are expressed in plain types so the core
//! stays independent of any windowing library. Pointer positions arrive in
//! screen coordinates; the tool controller converts them to canvas-local
//! coordinates through the viewport transform.

use kurbo::Point;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// A pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Button pressed at a position.
    Down { position: Point, button: MouseButton },
    /// Pointer moved (buttons unchanged).
    Move { position: Point },
    /// Button released at a position.
    Up { position: Point, button: MouseButton },
}

impl PointerEvent {
    /// The position carried by the event.
    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::Up { position, .. } => *position,
        }
    }
}

/// Keys the editor reacts to.
///
/// Tool shortcuts and clipboard chords arrive as `Character` keys combined
/// with [`Modifiers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Delete,
    Backspace,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Character(char),
}

/// Modifier key state at the time of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Platform command chord: Ctrl on Linux/Windows, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    pub fn shift() -> Modifiers {
        Modifiers {
            shift: true,
            ..Modifiers::NONE
        }
    }

    pub fn command_only() -> Modifiers {
        Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_event_position() {
        let down = PointerEvent::Down {
            position: Point::new(3.0, 4.0),
            button: MouseButton::Left,
        };
        assert_eq!(down.position(), Point::new(3.0, 4.0));

        let moved = PointerEvent::Move {
            position: Point::new(-1.0, 2.0),
        };
        assert_eq!(moved.position(), Point::new(-1.0, 2.0));
    }

    #[test]
    fn test_command_chord() {
        assert!(Modifiers::command_only().command());
        let meta = Modifiers {
            meta: true,
            ..Modifiers::NONE
        };
        assert!(meta.command());
        assert!(!Modifiers::shift().command());
    }
}
