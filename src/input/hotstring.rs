// Hotstring matcher - a rolling buffer of typed characters checked against
// registered abbreviations

use super::{EventHandle, TriggerEvent};
use std::collections::{BTreeSet, VecDeque};

struct Entry {
    handle: EventHandle,
    pattern: Vec<char>,
    triggers: BTreeSet<char>,
}

/// Matches typed characters against registered hotstrings
///
/// A hotstring with triggers fires when one of its trigger characters is
/// typed right after the pattern; a hotstring without triggers fires as
/// soon as its last character is typed. The longest matching pattern wins
/// and a match clears the buffer.
#[derive(Default)]
pub struct HotstringMatcher {
    entries: Vec<Entry>,
    buffer: VecDeque<char>,
    capacity: usize,
}

impl HotstringMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: EventHandle, pattern: &str, triggers: &BTreeSet<char>) {
        let pattern: Vec<char> = pattern.chars().collect();
        self.capacity = self.capacity.max(pattern.len());
        self.entries.push(Entry {
            handle,
            pattern,
            triggers: triggers.clone(),
        });
        // Longest pattern first so the most specific match wins
        self.entries
            .sort_by(|a, b| b.pattern.len().cmp(&a.pattern.len()));
    }

    pub fn contains(&self, pattern: &str, triggers: &BTreeSet<char>) -> bool {
        self.entries
            .iter()
            .any(|e| e.pattern.iter().copied().eq(pattern.chars()) && &e.triggers == triggers)
    }

    pub fn remove(&mut self, handle: EventHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.capacity = self.entries.iter().map(|e| e.pattern.len()).max().unwrap_or(0);
        self.entries.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget typed context (focus change, navigation, mouse click)
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Mirror a backspace typed by the user
    pub fn backspace(&mut self) {
        self.buffer.pop_back();
    }

    /// Feed one typed character, returning the fired handle if any
    pub fn feed(&mut self, ch: char) -> Option<(EventHandle, TriggerEvent)> {
        let triggered = self
            .entries
            .iter()
            .find(|e| e.triggers.contains(&ch) && self.buffer_ends_with(&e.pattern))
            .map(|e| e.handle);
        if let Some(handle) = triggered {
            self.buffer.clear();
            return Some((handle, TriggerEvent::HotstringMatch(Some(ch))));
        }

        self.buffer.push_back(ch);
        while self.buffer.len() > self.capacity {
            self.buffer.pop_front();
        }

        let immediate = self
            .entries
            .iter()
            .find(|e| e.triggers.is_empty() && self.buffer_ends_with(&e.pattern))
            .map(|e| e.handle);
        if let Some(handle) = immediate {
            self.buffer.clear();
            return Some((handle, TriggerEvent::HotstringMatch(None)));
        }

        None
    }

    fn buffer_ends_with(&self, pattern: &[char]) -> bool {
        !pattern.is_empty()
            && self.buffer.len() >= pattern.len()
            && self
                .buffer
                .iter()
                .skip(self.buffer.len() - pattern.len())
                .eq(pattern.iter())
    }
}

#[cfg(test)]
#[path = "hotstring_test.rs"]
mod tests;
