// Rdev-based input backend
//
// This backend uses the rdev crate to listen for keyboard events globally.
// rdev observes events without consuming them, so matched keystrokes still
// reach the focused application (`passes_through` is true).

use super::{
    EventHandle, HotkeyError, HotstringMatcher, InputBackend, InputSuppressor, TriggerCallback,
    TriggerEvent,
};
use crate::keyboard::Key;
use crate::phrase::{Hotkey, Modifier};
use parking_lot::Mutex;
use rdev::{listen, Event, EventType};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Map a key to the rdev key the listener reports for it
fn to_rdev_key(key: Key) -> Result<rdev::Key, HotkeyError> {
    use rdev::Key as R;

    let mapped = match key {
        Key::Tab => R::Tab,
        Key::Return => R::Return,
        Key::Space => R::Space,
        Key::Backspace => R::Backspace,
        Key::Delete => R::Delete,
        Key::Escape => R::Escape,
        Key::Insert => R::Insert,
        Key::Up => R::UpArrow,
        Key::Down => R::DownArrow,
        Key::Left => R::LeftArrow,
        Key::Right => R::RightArrow,
        Key::Home => R::Home,
        Key::End => R::End,
        Key::PageUp => R::PageUp,
        Key::PageDown => R::PageDown,
        Key::CapsLock => R::CapsLock,
        Key::F(1) => R::F1,
        Key::F(2) => R::F2,
        Key::F(3) => R::F3,
        Key::F(4) => R::F4,
        Key::F(5) => R::F5,
        Key::F(6) => R::F6,
        Key::F(7) => R::F7,
        Key::F(8) => R::F8,
        Key::F(9) => R::F9,
        Key::F(10) => R::F10,
        Key::F(11) => R::F11,
        Key::F(12) => R::F12,
        Key::Char(c) => return char_key(c),
        Key::F(_) | Key::Control | Key::Shift | Key::Alt | Key::Meta => {
            return Err(HotkeyError::UnknownKey(key.name()))
        }
    };
    Ok(mapped)
}

fn char_key(c: char) -> Result<rdev::Key, HotkeyError> {
    use rdev::Key as R;

    let mapped = match c {
        'a' => R::KeyA,
        'b' => R::KeyB,
        'c' => R::KeyC,
        'd' => R::KeyD,
        'e' => R::KeyE,
        'f' => R::KeyF,
        'g' => R::KeyG,
        'h' => R::KeyH,
        'i' => R::KeyI,
        'j' => R::KeyJ,
        'k' => R::KeyK,
        'l' => R::KeyL,
        'm' => R::KeyM,
        'n' => R::KeyN,
        'o' => R::KeyO,
        'p' => R::KeyP,
        'q' => R::KeyQ,
        'r' => R::KeyR,
        's' => R::KeyS,
        't' => R::KeyT,
        'u' => R::KeyU,
        'v' => R::KeyV,
        'w' => R::KeyW,
        'x' => R::KeyX,
        'y' => R::KeyY,
        'z' => R::KeyZ,
        '0' => R::Num0,
        '1' => R::Num1,
        '2' => R::Num2,
        '3' => R::Num3,
        '4' => R::Num4,
        '5' => R::Num5,
        '6' => R::Num6,
        '7' => R::Num7,
        '8' => R::Num8,
        '9' => R::Num9,
        other => return Err(HotkeyError::UnknownKey(other.to_string())),
    };
    Ok(mapped)
}

fn modifier_of(key: rdev::Key) -> Option<Modifier> {
    use rdev::Key as R;

    match key {
        R::ControlLeft | R::ControlRight => Some(Modifier::Ctrl),
        R::ShiftLeft | R::ShiftRight => Some(Modifier::Shift),
        R::Alt | R::AltGr => Some(Modifier::Alt),
        R::MetaLeft | R::MetaRight => Some(Modifier::Meta),
        _ => None,
    }
}

/// Keys that type whitespace, which can complete a hotstring
fn whitespace_char(key: rdev::Key) -> Option<char> {
    match key {
        rdev::Key::Return | rdev::Key::KpReturn => Some('\n'),
        rdev::Key::Tab => Some('\t'),
        rdev::Key::Space => Some(' '),
        _ => None,
    }
}

struct HotkeyBinding {
    key: rdev::Key,
    modifiers: BTreeSet<Modifier>,
    label: String,
}

/// State shared between the backend handle and the listener thread
#[derive(Default)]
struct ListenerState {
    matcher: Mutex<HotstringMatcher>,
    hotkeys: Mutex<HashMap<EventHandle, HotkeyBinding>>,
    callbacks: Mutex<HashMap<EventHandle, TriggerCallback>>,
    held_modifiers: Mutex<BTreeSet<Modifier>>,
}

impl ListenerState {
    /// Handle a keyboard event from rdev
    fn handle_event(&self, event: &Event, suppressor: &InputSuppressor) {
        // Modifier state is tracked even while suppressed so it never goes stale
        match event.event_type {
            EventType::KeyPress(key) => {
                if let Some(modifier) = modifier_of(key) {
                    self.held_modifiers.lock().insert(modifier);
                    return;
                }
            }
            EventType::KeyRelease(key) => {
                if let Some(modifier) = modifier_of(key) {
                    self.held_modifiers.lock().remove(&modifier);
                }
                return;
            }
            EventType::ButtonPress(_) => {
                self.matcher.lock().reset();
                return;
            }
            _ => return,
        }

        if suppressor.is_engaged() {
            self.matcher.lock().reset();
            return;
        }

        let EventType::KeyPress(key) = event.event_type else {
            return;
        };

        let held = self.held_modifiers.lock().clone();
        let hotkey_hits: Vec<EventHandle> = self
            .hotkeys
            .lock()
            .iter()
            .filter(|(_, binding)| binding.key == key && binding.modifiers == held)
            .map(|(handle, _)| *handle)
            .collect();

        if !hotkey_hits.is_empty() {
            // A bare hotkey on a whitespace key yields to a hotstring it completes
            if held.is_empty() {
                if let Some(ch) = whitespace_char(key) {
                    let hit = self.matcher.lock().feed(ch);
                    if let Some((handle, trigger_event)) = hit {
                        self.fire(handle, trigger_event);
                        return;
                    }
                }
            }
            self.matcher.lock().reset();
            for handle in hotkey_hits {
                self.fire(handle, TriggerEvent::HotkeyPress);
            }
            return;
        }

        // Shortcuts are not typing
        if held.contains(&Modifier::Ctrl) || held.contains(&Modifier::Alt) || held.contains(&Modifier::Meta) {
            self.matcher.lock().reset();
            return;
        }

        if let Some(ch) = whitespace_char(key) {
            let hit = self.matcher.lock().feed(ch);
            if let Some((handle, trigger_event)) = hit {
                self.fire(handle, trigger_event);
            }
            return;
        }

        let typed: Vec<char> = match key {
            rdev::Key::Backspace => {
                self.matcher.lock().backspace();
                return;
            }
            rdev::Key::UpArrow
            | rdev::Key::DownArrow
            | rdev::Key::LeftArrow
            | rdev::Key::RightArrow
            | rdev::Key::Home
            | rdev::Key::End
            | rdev::Key::PageUp
            | rdev::Key::PageDown
            | rdev::Key::Escape
            | rdev::Key::Delete => {
                self.matcher.lock().reset();
                return;
            }
            _ => event
                .name
                .as_deref()
                .map(|name| name.chars().filter(|c| !c.is_control()).collect())
                .unwrap_or_default(),
        };

        for ch in typed {
            let hit = self.matcher.lock().feed(ch);
            if let Some((handle, trigger_event)) = hit {
                self.fire(handle, trigger_event);
            }
        }
    }

    /// Execute the callback outside of any lock
    fn fire(&self, handle: EventHandle, event: TriggerEvent) {
        let callback = self.callbacks.lock().get(&handle).cloned();
        match callback {
            Some(callback) => callback(handle, event),
            None => crate::debug!("Input event for released handle {}", handle),
        }
    }
}

/// Rdev-based input backend
pub struct RdevInputBackend {
    state: Arc<ListenerState>,
    suppressor: InputSuppressor,
    next_id: AtomicU64,
    /// Whether the listener is running
    running: Arc<AtomicBool>,
    /// Handle to the listener thread
    listener_handle: Mutex<Option<JoinHandle<()>>>,
}

impl RdevInputBackend {
    /// Create a new backend that ignores input while `suppressor` is engaged
    pub fn new(suppressor: InputSuppressor) -> Self {
        Self {
            state: Arc::new(ListenerState::default()),
            suppressor,
            next_id: AtomicU64::new(1),
            running: Arc::new(AtomicBool::new(false)),
            listener_handle: Mutex::new(None),
        }
    }

    fn allocate(&self) -> EventHandle {
        EventHandle::new(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Start the rdev listener if not already running
    fn start_listener(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let state = self.state.clone();
        let suppressor = self.suppressor.clone();
        let running = self.running.clone();

        let handle = thread::spawn(move || {
            let callback = move |event: Event| {
                state.handle_event(&event, &suppressor);
            };

            // rdev::listen blocks until an error occurs
            if let Err(e) = listen(callback) {
                crate::error!("Input listener stopped: {:?}", e);
            }

            running.store(false, Ordering::SeqCst);
        });

        *self.listener_handle.lock() = Some(handle);
        crate::info!("Global input listener started");
    }
}

impl InputBackend for RdevInputBackend {
    fn register_hotstring(
        &self,
        pattern: &str,
        triggers: &BTreeSet<char>,
        callback: TriggerCallback,
    ) -> Result<EventHandle, HotkeyError> {
        if pattern.is_empty() {
            return Err(HotkeyError::RegistrationFailed("empty hotstring".to_string()));
        }

        let handle = {
            let mut matcher = self.state.matcher.lock();
            if matcher.contains(pattern, triggers) {
                return Err(HotkeyError::AlreadyRegistered(pattern.to_string()));
            }
            let handle = self.allocate();
            matcher.insert(handle, pattern, triggers);
            self.state.callbacks.lock().insert(handle, callback);
            handle
        };

        crate::debug!("Registered hotstring '{}' as {}", pattern, handle);
        self.start_listener();
        Ok(handle)
    }

    fn register_hotkey(
        &self,
        hotkey: &Hotkey,
        callback: TriggerCallback,
    ) -> Result<EventHandle, HotkeyError> {
        let key = to_rdev_key(hotkey.key)?;
        let label = hotkey.to_string();

        let handle = {
            let mut hotkeys = self.state.hotkeys.lock();
            if hotkeys
                .values()
                .any(|b| b.key == key && b.modifiers == hotkey.modifiers)
            {
                return Err(HotkeyError::AlreadyRegistered(label));
            }
            let handle = self.allocate();
            hotkeys.insert(
                handle,
                HotkeyBinding {
                    key,
                    modifiers: hotkey.modifiers.clone(),
                    label,
                },
            );
            self.state.callbacks.lock().insert(handle, callback);
            handle
        };

        crate::debug!("Registered hotkey {} as {}", hotkey, handle);
        self.start_listener();
        Ok(handle)
    }

    fn unregister(&self, handle: EventHandle) -> Result<(), HotkeyError> {
        let removed_hotstring = self.state.matcher.lock().remove(handle);
        let removed_hotkey = self.state.hotkeys.lock().remove(&handle);
        self.state.callbacks.lock().remove(&handle);

        if let Some(binding) = &removed_hotkey {
            crate::debug!("Unregistered hotkey {}", binding.label);
        } else if !removed_hotstring {
            crate::debug!("Unregister of unknown handle {}", handle);
        }

        // Note: the listener keeps running with nothing registered because
        // rdev::listen() provides no clean way to stop it.
        Ok(())
    }

    fn passes_through(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "rdev_backend_test.rs"]
mod tests;
