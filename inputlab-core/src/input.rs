use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    Left,
    Right,
    Middle,
    Other(u16),
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Button::Left => f.write_str("Left"),
            Button::Right => f.write_str("Right"),
            Button::Middle => f.write_str("Middle"),
            Button::Other(n) => write!(f, "Button{n}"),
        }
    }
}

/// Short label for a key name, falling back to the name itself.
pub fn key_display_name(key: &str) -> &str {
    match key {
        " " | "Space" => "Space",
        "ArrowUp" => "↑",
        "ArrowDown" => "↓",
        "ArrowLeft" => "←",
        "ArrowRight" => "→",
        "Control" | "ControlLeft" | "ControlRight" => "Ctrl",
        "Shift" | "ShiftLeft" | "ShiftRight" => "Shift",
        "Alt" | "AltLeft" | "AltRight" => "Alt",
        "Meta" | "SuperLeft" | "SuperRight" => "Win",
        "Backspace" => "⌫",
        "CapsLock" => "Caps",
        "Escape" => "Esc",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_keys_get_short_labels() {
        assert_eq!(key_display_name(" "), "Space");
        assert_eq!(key_display_name("ArrowLeft"), "←");
        assert_eq!(key_display_name("ControlRight"), "Ctrl");
        assert_eq!(key_display_name("KeyA"), "KeyA");
    }

    #[test]
    fn buttons_display_by_name() {
        assert_eq!(Button::Right.to_string(), "Right");
        assert_eq!(Button::Other(4).to_string(), "Button4");
    }
}
