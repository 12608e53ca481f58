// Key names shared by macro key tokens, hotkey definitions and the synthesizer
//
// Names follow the `KEY_<NAME>` convention used inside phrase bodies
// (`${KEY_TAB}`); the `KEY_` prefix is optional when parsing.

use std::fmt;

/// A key that can be pressed by the synthesizer or bound as a hotkey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Tab,
    Return,
    Space,
    Backspace,
    Delete,
    Escape,
    Insert,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    CapsLock,
    Control,
    Shift,
    Alt,
    Meta,
    /// Function keys F1-F12
    F(u8),
    /// A letter or digit key; letters are stored lowercase
    Char(char),
}

/// Whether a key token presses, releases, or clicks (press + release)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyDirection {
    Press,
    Release,
    Click,
}

impl KeyDirection {
    /// Parse the optional `:down` / `:up` suffix of a key token
    pub fn from_state(state: Option<&str>) -> Option<Self> {
        match state {
            None => Some(KeyDirection::Click),
            Some("down") => Some(KeyDirection::Press),
            Some("up") => Some(KeyDirection::Release),
            Some(_) => None,
        }
    }
}

impl Key {
    /// Parse a key name such as `KEY_TAB`, `tab`, `Enter` or `KEY_F5`
    pub fn from_name(name: &str) -> Option<Key> {
        let upper = name.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix("KEY_").unwrap_or(&upper);

        let key = match bare {
            "TAB" => Key::Tab,
            "ENTER" | "RETURN" => Key::Return,
            "SPACE" => Key::Space,
            "BACKSPACE" => Key::Backspace,
            "DELETE" | "DEL" => Key::Delete,
            "ESC" | "ESCAPE" => Key::Escape,
            "INSERT" => Key::Insert,
            "UP" => Key::Up,
            "DOWN" => Key::Down,
            "LEFT" => Key::Left,
            "RIGHT" => Key::Right,
            "HOME" => Key::Home,
            "END" => Key::End,
            "PAGEUP" => Key::PageUp,
            "PAGEDOWN" => Key::PageDown,
            "CAPSLOCK" => Key::CapsLock,
            "CTRL" | "CONTROL" | "LEFTCTRL" | "RIGHTCTRL" => Key::Control,
            "SHIFT" | "LEFTSHIFT" | "RIGHTSHIFT" => Key::Shift,
            "ALT" | "LEFTALT" | "RIGHTALT" => Key::Alt,
            "META" | "SUPER" | "CMD" | "COMMAND" | "LEFTMETA" | "RIGHTMETA" => Key::Meta,
            other => return Self::parse_function_or_char(other),
        };
        Some(key)
    }

    fn parse_function_or_char(name: &str) -> Option<Key> {
        if let Some(number) = name.strip_prefix('F') {
            if let Ok(n) = number.parse::<u8>() {
                return (1..=12).contains(&n).then_some(Key::F(n));
            }
        }

        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphanumeric() => Some(Key::Char(c.to_ascii_lowercase())),
            _ => None,
        }
    }

    /// Canonical `KEY_*` name
    pub fn name(&self) -> String {
        let bare = match self {
            Key::Tab => "TAB",
            Key::Return => "ENTER",
            Key::Space => "SPACE",
            Key::Backspace => "BACKSPACE",
            Key::Delete => "DELETE",
            Key::Escape => "ESC",
            Key::Insert => "INSERT",
            Key::Up => "UP",
            Key::Down => "DOWN",
            Key::Left => "LEFT",
            Key::Right => "RIGHT",
            Key::Home => "HOME",
            Key::End => "END",
            Key::PageUp => "PAGEUP",
            Key::PageDown => "PAGEDOWN",
            Key::CapsLock => "CAPSLOCK",
            Key::Control => "CTRL",
            Key::Shift => "SHIFT",
            Key::Alt => "ALT",
            Key::Meta => "META",
            Key::F(n) => return format!("KEY_F{}", n),
            Key::Char(c) => return format!("KEY_{}", c.to_ascii_uppercase()),
        };
        format!("KEY_{}", bare)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
#[path = "key_test.rs"]
mod tests;
