// Trigger registry - maps registered input handles and names to phrases
//
// Lookups come from the input listener thread and the worker; writes come
// from the control surface. A single RwLock guards both maps.

use crate::input::{EventHandle, HotkeyError, InputBackend, TriggerCallback};
use crate::macros::PhraseLookup;
use crate::phrase::Phrase;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct RegistryMaps {
    by_handle: HashMap<EventHandle, Phrase>,
    by_name: HashMap<String, Phrase>,
}

/// Registry of phrases whose triggers are live in the input backend
pub struct TriggerRegistry {
    backend: Arc<dyn InputBackend>,
    maps: RwLock<RegistryMaps>,
}

impl TriggerRegistry {
    pub fn new(backend: Arc<dyn InputBackend>) -> Self {
        Self {
            backend,
            maps: RwLock::new(RegistryMaps::default()),
        }
    }

    /// Register the phrase's hotstring and hotkey and record its handles
    ///
    /// Any handles the phrase already holds are released first. If the
    /// hotkey fails after the hotstring succeeded, the hotstring is rolled
    /// back and `phrase.events` stays empty. Inert phrases are still
    /// recorded by name so they can be embedded.
    pub fn register(&self, phrase: &mut Phrase, callback: TriggerCallback) -> Result<(), HotkeyError> {
        if !phrase.events.is_empty() {
            self.unregister(phrase);
        }

        if phrase.is_inert() {
            crate::debug!("Phrase '{}' has no trigger; embeddable only", phrase.name);
        }

        let mut events = Vec::with_capacity(2);
        if !phrase.hotstring.is_empty() {
            let handle =
                self.backend
                    .register_hotstring(&phrase.hotstring, &phrase.triggers, callback.clone())?;
            events.push(handle);
        }

        if let Some(hotkey) = &phrase.hotkey {
            match self.backend.register_hotkey(hotkey, callback) {
                Ok(handle) => events.push(handle),
                Err(e) => {
                    for handle in events {
                        self.release(handle);
                    }
                    return Err(e);
                }
            }
        }

        phrase.events = events;

        let mut maps = self.maps.write();
        for handle in &phrase.events {
            maps.by_handle.insert(*handle, phrase.clone());
        }
        if !phrase.name.is_empty() {
            maps.by_name.insert(phrase.name.clone(), phrase.clone());
        }
        drop(maps);

        crate::debug!(
            "Registered phrase '{}' with {} trigger(s)",
            phrase.name,
            phrase.events.len()
        );
        Ok(())
    }

    /// Release every handle the phrase holds; idempotent
    pub fn unregister(&self, phrase: &mut Phrase) {
        let handles: Vec<EventHandle> = phrase.events.drain(..).collect();
        {
            let mut maps = self.maps.write();
            for handle in &handles {
                maps.by_handle.remove(handle);
            }
            if maps
                .by_name
                .get(&phrase.name)
                .is_some_and(|stored| stored.events.iter().all(|h| handles.contains(h)))
            {
                maps.by_name.remove(&phrase.name);
            }
        }

        for handle in handles {
            self.release(handle);
        }
    }

    fn release(&self, handle: EventHandle) {
        if let Err(e) = self.backend.unregister(handle) {
            crate::warn!("Failed to release input handle {}: {}", handle, e);
        }
    }

    /// Phrase bound to a fired handle
    pub fn lookup(&self, handle: EventHandle) -> Option<Phrase> {
        self.maps.read().by_handle.get(&handle).cloned()
    }
}

impl PhraseLookup for TriggerRegistry {
    fn phrase_by_name(&self, name: &str) -> Option<Phrase> {
        self.maps.read().by_name.get(name).cloned()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
