// Recording fakes for the platform seams, shared by unit tests
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::clipboard::{ClipContent, ClipboardError, ClipboardService, Selection};
use crate::form::{FillField, FormError, FormResponse, FormUi};
use crate::input::{EventHandle, HotkeyError, InputBackend, TriggerCallback, TriggerEvent};
use crate::keyboard::{Key, KeyDirection, Keyboard, KeyboardError};
use crate::phrase::Hotkey;
use crate::window::{ActiveWindow, WindowService};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Everything a `RecordingKeyboard` was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injected {
    Text(String),
    Key(Key, KeyDirection),
    MiddleClick,
    PasteFocused,
    /// Paste shortcut fired; carries the clipboard text at that instant
    Pasted(String),
}

#[derive(Default)]
pub struct RecordingKeyboard {
    log: Mutex<Vec<Injected>>,
    clipboard: Option<Arc<MemoryClipboard>>,
    fail_text: bool,
}

impl RecordingKeyboard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record clipboard contents whenever the paste shortcut fires
    pub fn watching(clipboard: Arc<MemoryClipboard>) -> Arc<Self> {
        Arc::new(Self {
            clipboard: Some(clipboard),
            ..Default::default()
        })
    }

    pub fn failing_text() -> Arc<Self> {
        Arc::new(Self {
            fail_text: true,
            ..Default::default()
        })
    }

    pub fn log(&self) -> Vec<Injected> {
        self.log.lock().clone()
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }

    /// Clicks of `key`
    pub fn count(&self, key: Key) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|e| **e == Injected::Key(key, KeyDirection::Click))
            .count()
    }

    /// Concatenated typed text
    pub fn typed(&self) -> String {
        self.log
            .lock()
            .iter()
            .filter_map(|e| match e {
                Injected::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Keyboard for RecordingKeyboard {
    fn key(&self, key: Key, direction: KeyDirection) -> Result<(), KeyboardError> {
        self.log.lock().push(Injected::Key(key, direction));
        Ok(())
    }

    fn text(&self, text: &str) -> Result<(), KeyboardError> {
        if self.fail_text {
            return Err(KeyboardError::Simulation("text rejected".to_string()));
        }
        self.log.lock().push(Injected::Text(text.to_string()));
        Ok(())
    }

    fn middle_click(&self) -> Result<(), KeyboardError> {
        self.log.lock().push(Injected::MiddleClick);
        Ok(())
    }

    fn paste_focused(&self) -> Result<(), KeyboardError> {
        self.log.lock().push(Injected::PasteFocused);
        Ok(())
    }

    fn paste_shortcut(&self) -> Result<(), KeyboardError> {
        let current = self
            .clipboard
            .as_ref()
            .map(|c| c.content(Selection::Clipboard).text)
            .unwrap_or_default();
        self.log.lock().push(Injected::Pasted(current));
        Ok(())
    }
}

/// In-memory clipboard with optional primary selection
#[derive(Default)]
pub struct MemoryClipboard {
    selections: Mutex<HashMap<Selection, ClipContent>>,
    primary: bool,
    reads: AtomicU64,
    unavailable: bool,
}

impl MemoryClipboard {
    pub fn new(text: &str) -> Arc<Self> {
        let clipboard = Self::default();
        clipboard
            .selections
            .lock()
            .insert(Selection::Clipboard, ClipContent::text(text));
        Arc::new(clipboard)
    }

    pub fn with_primary(clipboard_text: &str, primary_text: &str) -> Arc<Self> {
        let clipboard = Self {
            primary: true,
            ..Default::default()
        };
        {
            let mut selections = clipboard.selections.lock();
            selections.insert(Selection::Clipboard, ClipContent::text(clipboard_text));
            selections.insert(Selection::Primary, ClipContent::text(primary_text));
        }
        Arc::new(clipboard)
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            unavailable: true,
            ..Default::default()
        })
    }

    pub fn content(&self, selection: Selection) -> ClipContent {
        self.selections
            .lock()
            .get(&selection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ClipboardService for MemoryClipboard {
    fn get(&self, selection: Selection) -> Result<ClipContent, ClipboardError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(ClipboardError::Unavailable("test".to_string()));
        }
        Ok(self.content(selection))
    }

    fn set(&self, selection: Selection, content: &ClipContent) -> Result<(), ClipboardError> {
        if self.unavailable {
            return Err(ClipboardError::Unavailable("test".to_string()));
        }
        self.selections.lock().insert(selection, content.clone());
        Ok(())
    }

    fn has_primary(&self) -> bool {
        self.primary
    }
}

/// Form that answers with a fixed response
pub struct ScriptedForm {
    response: FormResponse,
    prompts: AtomicU64,
}

impl ScriptedForm {
    pub fn submit(values: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            response: FormResponse::Submitted(values.iter().map(|v| v.to_string()).collect()),
            prompts: AtomicU64::new(0),
        })
    }

    pub fn cancel() -> Arc<Self> {
        Arc::new(Self {
            response: FormResponse::Cancelled,
            prompts: AtomicU64::new(0),
        })
    }

    pub fn prompts(&self) -> u64 {
        self.prompts.load(Ordering::SeqCst)
    }
}

impl FormUi for ScriptedForm {
    fn prompt(&self, _body: &str, _fields: &[FillField]) -> Result<FormResponse, FormError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// Window service reporting a fixed window
pub struct FixedWindow(pub Mutex<Option<ActiveWindow>>);

impl FixedWindow {
    pub fn new(class: &str, title: &str) -> Arc<Self> {
        Arc::new(Self(Mutex::new(Some(ActiveWindow {
            class: class.to_string(),
            title: title.to_string(),
        }))))
    }
}

impl WindowService for FixedWindow {
    fn active_window(&self) -> Option<ActiveWindow> {
        self.0.lock().clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Hotstring(String, BTreeSet<char>),
    Hotkey(Hotkey),
}

/// Input backend that records registrations and fires on demand
#[derive(Default)]
pub struct MockInputBackend {
    next_id: AtomicU64,
    registered: Mutex<HashMap<EventHandle, (Registration, TriggerCallback)>>,
    pub reject_hotkeys: bool,
    pub pass_through: bool,
}

impl MockInputBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn passive() -> Arc<Self> {
        Arc::new(Self {
            pass_through: true,
            ..Default::default()
        })
    }

    pub fn rejecting_hotkeys() -> Arc<Self> {
        Arc::new(Self {
            reject_hotkeys: true,
            ..Default::default()
        })
    }

    pub fn registration_count(&self) -> usize {
        self.registered.lock().len()
    }

    pub fn is_registered(&self, handle: EventHandle) -> bool {
        self.registered.lock().contains_key(&handle)
    }

    /// Handle registered for `hotkey`, if any
    pub fn hotkey_handle(&self, hotkey: &Hotkey) -> Option<EventHandle> {
        self.registered
            .lock()
            .iter()
            .find(|(_, (r, _))| *r == Registration::Hotkey(hotkey.clone()))
            .map(|(h, _)| *h)
    }

    pub fn hotstring_handle(&self, pattern: &str) -> Option<EventHandle> {
        self.registered
            .lock()
            .iter()
            .find(|(_, (r, _))| matches!(r, Registration::Hotstring(p, _) if p == pattern))
            .map(|(h, _)| *h)
    }

    /// Invoke the callback registered for `handle` as the listener would
    pub fn fire(&self, handle: EventHandle, event: TriggerEvent) {
        let callback = self.registered.lock().get(&handle).map(|(_, cb)| cb.clone());
        if let Some(callback) = callback {
            callback(handle, event);
        }
    }

    fn allocate(&self, registration: Registration, callback: TriggerCallback) -> EventHandle {
        let handle = EventHandle::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.registered.lock().insert(handle, (registration, callback));
        handle
    }
}

impl InputBackend for MockInputBackend {
    fn register_hotstring(
        &self,
        pattern: &str,
        triggers: &BTreeSet<char>,
        callback: TriggerCallback,
    ) -> Result<EventHandle, HotkeyError> {
        Ok(self.allocate(
            Registration::Hotstring(pattern.to_string(), triggers.clone()),
            callback,
        ))
    }

    fn register_hotkey(
        &self,
        hotkey: &Hotkey,
        callback: TriggerCallback,
    ) -> Result<EventHandle, HotkeyError> {
        if self.reject_hotkeys {
            return Err(HotkeyError::RegistrationFailed(hotkey.to_string()));
        }
        Ok(self.allocate(Registration::Hotkey(hotkey.clone()), callback))
    }

    fn unregister(&self, handle: EventHandle) -> Result<(), HotkeyError> {
        self.registered.lock().remove(&handle);
        Ok(())
    }

    fn passes_through(&self) -> bool {
        self.pass_through
    }
}
