// Phrase data model - the unit of expansion
//
// A phrase pairs a template body with the triggers (hotstring and/or hotkey)
// that fire it and the window predicate that gates it.

pub mod store;

pub use store::{PhraseStore, PhraseStoreError};

use crate::input::EventHandle;
use crate::keyboard::Key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// How the body is interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhraseType {
    #[default]
    Plaintext,
    Richtext,
    Markdown,
    Command,
    Html,
}

impl PhraseType {
    /// Rich phrases carry HTML markup once markdown has been converted
    pub fn is_rich(self) -> bool {
        match self {
            PhraseType::Richtext | PhraseType::Markdown | PhraseType::Html => true,
            PhraseType::Plaintext | PhraseType::Command => false,
        }
    }
}

/// How the expansion reaches the focused application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasteMethod {
    /// Synthesized character stream
    #[default]
    Type,
    /// Clipboard plus the paste shortcut
    Paste,
    /// Primary selection plus middle click, or a focused-control paste
    AltPaste,
}

/// Hotkey modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
    Meta,
}

impl Modifier {
    fn from_name(name: &str) -> Option<Modifier> {
        match name.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => Some(Modifier::Ctrl),
            "shift" => Some(Modifier::Shift),
            "alt" | "option" => Some(Modifier::Alt),
            "meta" | "super" | "cmd" | "command" | "win" => Some(Modifier::Meta),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Modifier::Ctrl => "Ctrl",
            Modifier::Shift => "Shift",
            Modifier::Alt => "Alt",
            Modifier::Meta => "Meta",
        }
    }
}

/// A key plus the exact set of modifiers that must be held
///
/// Serialized as its display form, e.g. `"Ctrl+Shift+KEY_E"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hotkey {
    pub key: Key,
    pub modifiers: BTreeSet<Modifier>,
}

impl Hotkey {
    pub fn new(key: Key, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        Self {
            key,
            modifiers: modifiers.into_iter().collect(),
        }
    }

    /// A bare key with no modifiers
    pub fn bare(key: Key) -> Self {
        Self::new(key, [])
    }
}

impl FromStr for Hotkey {
    type Err = String;

    /// Parse `Mod+Mod+Key`; the key is always the last `+`-separated part
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let (key_name, modifier_names) = parts.split_last().ok_or("Empty hotkey")?;

        let key = Key::from_name(key_name).ok_or_else(|| format!("Unknown key: {}", key_name))?;
        let modifiers = modifier_names
            .iter()
            .map(|name| Modifier::from_name(name).ok_or_else(|| format!("Unknown modifier: {}", name)))
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Self { key, modifiers })
    }
}

impl TryFrom<String> for Hotkey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Hotkey> for String {
    fn from(hotkey: Hotkey) -> Self {
        hotkey.to_string()
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier.name())?;
        }
        write!(f, "{}", self.key)
    }
}

/// A stored expansion template and its triggers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Phrase {
    /// Unique name; also the key used by `$<name>` embedding
    #[serde(default)]
    pub name: String,
    /// Abbreviation that fires the phrase when typed
    #[serde(default)]
    pub hotstring: String,
    /// Characters that complete the hotstring; empty fires immediately
    #[serde(default)]
    pub triggers: BTreeSet<char>,
    #[serde(rename = "type", default)]
    pub phrase_type: PhraseType,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub method: PasteMethod,
    /// Window classes the phrase is limited to; empty allows any
    #[serde(default)]
    pub wm_class: BTreeSet<String>,
    /// Case-sensitive substring of the window title; empty allows any
    #[serde(default)]
    pub wm_title: String,
    #[serde(default)]
    pub hotkey: Option<Hotkey>,
    /// Handles currently registered for this phrase. Never persisted.
    #[serde(skip)]
    pub events: Vec<EventHandle>,
}

impl Phrase {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_hotstring(mut self, hotstring: impl Into<String>, triggers: &str) -> Self {
        self.hotstring = hotstring.into();
        self.triggers = triggers.chars().collect();
        self
    }

    pub fn with_hotkey(mut self, hotkey: Hotkey) -> Self {
        self.hotkey = Some(hotkey);
        self
    }

    pub fn with_type(mut self, phrase_type: PhraseType) -> Self {
        self.phrase_type = phrase_type;
        self
    }

    pub fn with_method(mut self, method: PasteMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_window(mut self, classes: &[&str], title: &str) -> Self {
        self.wm_class = classes.iter().map(|c| c.to_string()).collect();
        self.wm_title = title.to_string();
        self
    }

    /// A phrase with neither a hotstring nor a hotkey never fires
    pub fn is_inert(&self) -> bool {
        self.hotstring.is_empty() && self.hotkey.is_none()
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
