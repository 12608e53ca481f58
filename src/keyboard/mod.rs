// Keyboard simulation module - provides cross-platform keystroke synthesis
// Uses the enigo crate on every platform; WM_PASTE on Windows for alt-paste

mod key;

pub use key::{Key, KeyDirection};

use enigo::{Button, Direction, Enigo, Keyboard as _, Mouse as _, Settings};
use std::cell::RefCell;
use std::time::Duration;

/// Error raised by keystroke synthesis
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KeyboardError {
    /// The synthesizer could not connect to the display server
    #[error("Failed to create keyboard simulator: {0}")]
    Initialization(String),
    /// A key or text event was rejected
    #[error("Failed to simulate input: {0}")]
    Simulation(String),
    /// The key has no synthesizer equivalent
    #[error("Key {0} cannot be synthesized")]
    Unsupported(Key),
}

/// Synthesizes keystrokes into the focused application
pub trait Keyboard: Send + Sync {
    /// Press, release or click a single key
    fn key(&self, key: Key, direction: KeyDirection) -> Result<(), KeyboardError>;

    /// Type a string of text
    fn text(&self, text: &str) -> Result<(), KeyboardError>;

    /// Click the middle mouse button (X11 primary-selection paste)
    fn middle_click(&self) -> Result<(), KeyboardError>;

    /// Paste into the focused control without the paste shortcut.
    ///
    /// Defaults to the paste shortcut where the platform has no
    /// control-level paste message.
    fn paste_focused(&self) -> Result<(), KeyboardError> {
        self.paste_shortcut()
    }

    /// Press the platform paste shortcut (Cmd+V on macOS, Ctrl+V elsewhere).
    ///
    /// The modifier is always released, even when the V click fails.
    fn paste_shortcut(&self) -> Result<(), KeyboardError> {
        let modifier = paste_modifier();
        self.key(modifier, KeyDirection::Press)?;
        let pressed = self.key(Key::Char('v'), KeyDirection::Click);
        let released = self.key(modifier, KeyDirection::Release);
        pressed.and(released)
    }
}

/// Modifier used by the platform paste shortcut
pub fn paste_modifier() -> Key {
    if cfg!(target_os = "macos") {
        Key::Meta
    } else {
        Key::Control
    }
}

thread_local! {
    // Enigo holds a display connection that must stay on the thread that created it.
    static ENIGO: RefCell<Option<Enigo>> = const { RefCell::new(None) };
}

fn with_enigo<T>(
    f: impl FnOnce(&mut Enigo) -> Result<T, KeyboardError>,
) -> Result<T, KeyboardError> {
    ENIGO.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            let enigo = Enigo::new(&Settings::default())
                .map_err(|e| KeyboardError::Initialization(e.to_string()))?;
            *slot = Some(enigo);
        }
        match slot.as_mut() {
            Some(enigo) => f(enigo),
            None => Err(KeyboardError::Initialization(
                "keyboard simulator unavailable".to_string(),
            )),
        }
    })
}

fn to_enigo_key(key: Key) -> Result<enigo::Key, KeyboardError> {
    let mapped = match key {
        Key::Tab => enigo::Key::Tab,
        Key::Return => enigo::Key::Return,
        Key::Space => enigo::Key::Space,
        Key::Backspace => enigo::Key::Backspace,
        Key::Delete => enigo::Key::Delete,
        Key::Escape => enigo::Key::Escape,
        Key::Insert => return insert_key(),
        Key::Up => enigo::Key::UpArrow,
        Key::Down => enigo::Key::DownArrow,
        Key::Left => enigo::Key::LeftArrow,
        Key::Right => enigo::Key::RightArrow,
        Key::Home => enigo::Key::Home,
        Key::End => enigo::Key::End,
        Key::PageUp => enigo::Key::PageUp,
        Key::PageDown => enigo::Key::PageDown,
        Key::CapsLock => enigo::Key::CapsLock,
        Key::Control => enigo::Key::Control,
        Key::Shift => enigo::Key::Shift,
        Key::Alt => enigo::Key::Alt,
        Key::Meta => enigo::Key::Meta,
        Key::F(1) => enigo::Key::F1,
        Key::F(2) => enigo::Key::F2,
        Key::F(3) => enigo::Key::F3,
        Key::F(4) => enigo::Key::F4,
        Key::F(5) => enigo::Key::F5,
        Key::F(6) => enigo::Key::F6,
        Key::F(7) => enigo::Key::F7,
        Key::F(8) => enigo::Key::F8,
        Key::F(9) => enigo::Key::F9,
        Key::F(10) => enigo::Key::F10,
        Key::F(11) => enigo::Key::F11,
        Key::F(12) => enigo::Key::F12,
        Key::F(_) => return Err(KeyboardError::Unsupported(key)),
        Key::Char(c) => enigo::Key::Unicode(c),
    };
    Ok(mapped)
}

#[cfg(target_os = "macos")]
fn insert_key() -> Result<enigo::Key, KeyboardError> {
    Err(KeyboardError::Unsupported(Key::Insert))
}

#[cfg(not(target_os = "macos"))]
fn insert_key() -> Result<enigo::Key, KeyboardError> {
    Ok(enigo::Key::Insert)
}

fn to_enigo_direction(direction: KeyDirection) -> Direction {
    match direction {
        KeyDirection::Press => Direction::Press,
        KeyDirection::Release => Direction::Release,
        KeyDirection::Click => Direction::Click,
    }
}

/// Keyboard backed by enigo
///
/// Each thread that synthesizes input lazily opens its own enigo
/// connection; the handle itself is freely shareable.
#[derive(Debug, Clone, Default)]
pub struct EnigoKeyboard {
    /// Pause between typed characters
    typing_delay: Duration,
}

impl EnigoKeyboard {
    pub fn new(typing_delay: Duration) -> Self {
        Self { typing_delay }
    }
}

impl Keyboard for EnigoKeyboard {
    fn key(&self, key: Key, direction: KeyDirection) -> Result<(), KeyboardError> {
        let mapped = to_enigo_key(key)?;
        with_enigo(|enigo| {
            enigo
                .key(mapped, to_enigo_direction(direction))
                .map_err(|e| KeyboardError::Simulation(format!("{} {:?}: {}", key, direction, e)))
        })
    }

    fn text(&self, text: &str) -> Result<(), KeyboardError> {
        if crate::shutdown::is_shutting_down() {
            return Ok(());
        }

        with_enigo(|enigo| {
            let mut buf = [0u8; 4];
            for character in text.chars() {
                // Allow shutdown to stop further typing between characters.
                if crate::shutdown::is_shutting_down() {
                    break;
                }

                let result = match character {
                    '\n' => enigo.key(enigo::Key::Return, Direction::Click),
                    '\t' => enigo.key(enigo::Key::Tab, Direction::Click),
                    '\r' => continue,
                    c => enigo.text(c.encode_utf8(&mut buf)),
                };
                result.map_err(|e| KeyboardError::Simulation(e.to_string()))?;

                if !self.typing_delay.is_zero() {
                    std::thread::sleep(self.typing_delay);
                }
            }
            Ok(())
        })
    }

    fn middle_click(&self) -> Result<(), KeyboardError> {
        with_enigo(|enigo| {
            enigo
                .button(Button::Middle, Direction::Click)
                .map_err(|e| KeyboardError::Simulation(e.to_string()))
        })
    }

    #[cfg(target_os = "windows")]
    fn paste_focused(&self) -> Result<(), KeyboardError> {
        post_wm_paste()
    }
}

/// Send WM_PASTE to the control that owns keyboard focus in the foreground window
#[cfg(target_os = "windows")]
fn post_wm_paste() -> Result<(), KeyboardError> {
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        GetForegroundWindow, GetGUIThreadInfo, GetWindowThreadProcessId, SendMessageW,
        GUITHREADINFO, WM_PASTE,
    };

    // SAFETY: plain Win32 calls on handles owned by the window manager; the
    // GUITHREADINFO struct is zeroed and sized before use.
    unsafe {
        let foreground = GetForegroundWindow();
        if foreground.is_null() {
            return Err(KeyboardError::Simulation(
                "no foreground window to paste into".to_string(),
            ));
        }

        let thread_id = GetWindowThreadProcessId(foreground, std::ptr::null_mut());
        let mut info: GUITHREADINFO = std::mem::zeroed();
        info.cbSize = std::mem::size_of::<GUITHREADINFO>() as u32;

        let target = if GetGUIThreadInfo(thread_id, &mut info) != 0 && !info.hwndFocus.is_null() {
            info.hwndFocus
        } else {
            foreground
        };
        SendMessageW(target, WM_PASTE, 0, 0);
    }
    Ok(())
}

#[cfg(test)]
#[path = "keyboard_test.rs"]
mod tests;
