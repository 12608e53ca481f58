// Global input capture module
//
// Backends watch the keyboard system-wide and report hotstring and hotkey
// matches through a callback keyed by the opaque handle they handed out.

mod hotstring;
mod rdev_backend;

pub use hotstring::HotstringMatcher;
pub use rdev_backend::RdevInputBackend;

use crate::phrase::Hotkey;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Opaque handle identifying one registered hotstring or hotkey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventHandle(u64);

impl EventHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the backend saw when a registered trigger fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Hotstring typed; carries the trigger character that completed it, if any
    HotstringMatch(Option<char>),
    /// Hotkey combination pressed
    HotkeyPress,
}

impl TriggerEvent {
    /// The consumed trigger character, only for hotstring matches
    pub fn trigger_char(&self) -> Option<char> {
        match self {
            TriggerEvent::HotstringMatch(trigger) => *trigger,
            TriggerEvent::HotkeyPress => None,
        }
    }
}

/// Callback invoked from the backend's listener thread
pub type TriggerCallback = Arc<dyn Fn(EventHandle, TriggerEvent) + Send + Sync>;

/// Errors that can occur during trigger registration
#[derive(Debug, Clone, PartialEq)]
pub enum HotkeyError {
    /// The backend refused the registration
    RegistrationFailed(String),
    /// The same hotkey or hotstring is already registered
    AlreadyRegistered(String),
    /// The key cannot be captured by this backend
    UnknownKey(String),
}

impl fmt::Display for HotkeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotkeyError::RegistrationFailed(msg) => write!(f, "Registration failed: {}", msg),
            HotkeyError::AlreadyRegistered(what) => write!(f, "Already registered: {}", what),
            HotkeyError::UnknownKey(key) => write!(f, "Key cannot be captured: {}", key),
        }
    }
}

impl std::error::Error for HotkeyError {}

/// Trait for global input backends (allows mocking in tests)
pub trait InputBackend: Send + Sync {
    /// Watch for `pattern` typed and completed by one of `triggers`
    /// (immediately, if `triggers` is empty)
    fn register_hotstring(
        &self,
        pattern: &str,
        triggers: &BTreeSet<char>,
        callback: TriggerCallback,
    ) -> Result<EventHandle, HotkeyError>;

    fn register_hotkey(
        &self,
        hotkey: &Hotkey,
        callback: TriggerCallback,
    ) -> Result<EventHandle, HotkeyError>;

    fn unregister(&self, handle: EventHandle) -> Result<(), HotkeyError>;

    /// True when matched keystrokes still reach the focused application
    fn passes_through(&self) -> bool {
        false
    }
}

/// Shared flag that mutes trigger matching while output is being injected
///
/// Guards nest; matching resumes when the last guard drops.
#[derive(Debug, Clone, Default)]
pub struct InputSuppressor(Arc<AtomicUsize>);

impl InputSuppressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engage(&self) -> SuppressGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        SuppressGuard(self.0.clone())
    }

    pub fn is_engaged(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }
}

/// Releases its share of suppression on drop
#[must_use = "suppression ends as soon as the guard is dropped"]
pub struct SuppressGuard(Arc<AtomicUsize>);

impl Drop for SuppressGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
