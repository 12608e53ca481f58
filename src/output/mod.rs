// Output dispatcher - erases the hotstring and injects the expansion
//
// Flow: backspaces → fragments by paste method → trigger suffix → caret moves.
// The input suppressor is held for the whole injection, plus a short settle
// for events the OS delivers late, so synthesized keystrokes never feed the
// hotstring matcher.

use crate::clipboard::{ClipContent, ClipboardError, ClipboardService, Selection};
use crate::input::{InputSuppressor, SuppressGuard, TriggerEvent};
use crate::keyboard::{Key, KeyDirection, Keyboard, KeyboardError};
use crate::macros::{Expansion, Fragment};
use crate::phrase::{PasteMethod, Phrase};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Pauses between synthesized events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputDelays {
    /// Between repeated key presses (backspaces, arrows)
    pub key: Duration,
    /// Between fragments
    pub fragment: Duration,
    /// After the paste action, before the clipboard is restored
    pub paste_settle: Duration,
    /// After the last injected key, before matching resumes
    pub release_settle: Duration,
}

impl OutputDelays {
    pub fn none() -> Self {
        Self {
            key: Duration::ZERO,
            fragment: Duration::ZERO,
            paste_settle: Duration::ZERO,
            release_settle: Duration::ZERO,
        }
    }
}

impl Default for OutputDelays {
    fn default() -> Self {
        Self {
            key: Duration::from_millis(10),
            fragment: Duration::from_millis(10),
            paste_settle: Duration::from_millis(100),
            release_settle: Duration::from_millis(20),
        }
    }
}

/// Suppression that outlives the injection by `settle`
struct SettledGuard {
    settle: Duration,
    _guard: SuppressGuard,
}

impl Drop for SettledGuard {
    fn drop(&mut self) {
        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OutputError {
    #[error(transparent)]
    Keyboard(#[from] KeyboardError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

/// Number of backspaces needed to erase what triggered `phrase`
pub fn backspace_count(phrase: &Phrase, event: TriggerEvent) -> usize {
    match event {
        TriggerEvent::HotstringMatch(trigger) => {
            phrase.hotstring.chars().count() + usize::from(trigger.is_some())
        }
        TriggerEvent::HotkeyPress => 0,
    }
}

/// Line endings the focused application expects
#[cfg(target_os = "windows")]
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

#[cfg(not(target_os = "windows"))]
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Sends resolved expansions to the focused application
pub struct OutputDispatcher {
    keyboard: Arc<dyn Keyboard>,
    clipboard: Arc<dyn ClipboardService>,
    suppressor: InputSuppressor,
    delays: RwLock<OutputDelays>,
    // Serializes the worker's output with caret advances from the listener thread
    synth_lock: Mutex<()>,
}

impl OutputDispatcher {
    pub fn new(
        keyboard: Arc<dyn Keyboard>,
        clipboard: Arc<dyn ClipboardService>,
        suppressor: InputSuppressor,
        delays: OutputDelays,
    ) -> Self {
        Self {
            keyboard,
            clipboard,
            suppressor,
            delays: RwLock::new(delays),
            synth_lock: Mutex::new(()),
        }
    }

    pub fn set_delays(&self, delays: OutputDelays) {
        *self.delays.write() = delays;
    }

    pub fn delays(&self) -> OutputDelays {
        *self.delays.read()
    }

    /// Erase the trigger, emit the expansion and park the cursor on the first stop
    pub fn dispatch(
        &self,
        phrase: &Phrase,
        event: TriggerEvent,
        expansion: &Expansion,
    ) -> Result<(), OutputError> {
        let _synth = self.synth_lock.lock();
        let _quiet = self.quiet();

        let erase = backspace_count(phrase, event);
        crate::debug!(
            "Dispatching '{}' via {:?}: {} backspaces, {} fragments",
            phrase.name,
            phrase.method,
            erase,
            expansion.fragments.len()
        );
        self.repeat(Key::Backspace, erase)?;

        for (i, fragment) in expansion.fragments.iter().enumerate() {
            if i > 0 {
                thread::sleep(self.delays().fragment);
            }
            match fragment {
                Fragment::Text { plain, rich } => {
                    self.emit_text(phrase.method, plain, rich.as_deref())?
                }
                Fragment::Key { key, direction } => self.keyboard.key(*key, *direction)?,
            }
        }

        if let Some(trigger) = expansion.trigger_suffix {
            self.emit_text(phrase.method, &trigger.to_string(), None)?;
        }

        if let Some(plan) = &expansion.caret {
            self.repeat(Key::Left, plan.initial_moves())?;
        }

        Ok(())
    }

    /// Move the cursor `steps` characters to the right
    pub fn advance(&self, steps: usize) -> Result<(), OutputError> {
        let _synth = self.synth_lock.lock();
        let _quiet = self.quiet();
        self.repeat(Key::Right, steps)
    }

    /// Click a single key without triggering hotstrings
    pub fn press(&self, key: Key) -> Result<(), OutputError> {
        let _synth = self.synth_lock.lock();
        let _quiet = self.quiet();
        self.keyboard.key(key, KeyDirection::Click)?;
        Ok(())
    }

    fn quiet(&self) -> SettledGuard {
        SettledGuard {
            settle: self.delays().release_settle,
            _guard: self.suppressor.engage(),
        }
    }

    fn repeat(&self, key: Key, count: usize) -> Result<(), OutputError> {
        for i in 0..count {
            if i > 0 {
                thread::sleep(self.delays().key);
            }
            self.keyboard.key(key, KeyDirection::Click)?;
        }
        Ok(())
    }

    fn emit_text(
        &self,
        method: PasteMethod,
        plain: &str,
        rich: Option<&str>,
    ) -> Result<(), OutputError> {
        if plain.is_empty() && rich.map_or(true, str::is_empty) {
            return Ok(());
        }

        let text = normalize_newlines(plain);
        let content = match rich {
            Some(html) => ClipContent::rich(text, html),
            None => ClipContent::text(text),
        };

        match method {
            PasteMethod::Type => self.keyboard.text(&content.text)?,
            PasteMethod::Paste => {
                self.paste_through(Selection::Clipboard, &content, || self.keyboard.paste_shortcut())?
            }
            PasteMethod::AltPaste if self.clipboard.has_primary() => {
                self.paste_through(Selection::Primary, &content, || self.keyboard.middle_click())?
            }
            PasteMethod::AltPaste => {
                self.paste_through(Selection::Clipboard, &content, || self.keyboard.paste_focused())?
            }
        }
        Ok(())
    }

    /// Put `content` on `selection`, run `paste`, then restore what was there
    ///
    /// The snapshot is restored even when `paste` fails. If the snapshot
    /// cannot be read the selection is left holding `content`.
    fn paste_through(
        &self,
        selection: Selection,
        content: &ClipContent,
        paste: impl FnOnce() -> Result<(), KeyboardError>,
    ) -> Result<(), OutputError> {
        let snapshot = match self.clipboard.get(selection) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                crate::warn!("Could not snapshot {:?} before paste: {}", selection, e);
                None
            }
        };

        self.clipboard.set(selection, content)?;
        let pasted = paste();
        thread::sleep(self.delays().paste_settle);

        if let Some(snapshot) = snapshot {
            if let Err(e) = self.clipboard.set(selection, &snapshot) {
                crate::warn!("Failed to restore {:?} after paste: {}", selection, e);
            }
        }

        pasted.map_err(OutputError::from)
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
