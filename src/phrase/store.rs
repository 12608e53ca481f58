// Phrase store - one JSON file per phrase inside the phrase directory
// The file stem is the phrase name; `events` is never written.

use super::Phrase;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const PHRASE_EXTENSION: &str = "json";

/// Error types for phrase store operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhraseStoreError {
    /// Name is empty or cannot be used as a file name
    #[error("Invalid phrase name: {0:?}")]
    InvalidName(String),
    /// Phrase not found
    #[error("Phrase {0} not found")]
    NotFound(String),
    /// Failed to persist a phrase
    #[error("Failed to persist phrase: {0}")]
    PersistenceError(String),
    /// Failed to read the phrase directory
    #[error("Failed to load phrases: {0}")]
    LoadError(String),
}

/// Store for phrases with file-based persistence
#[derive(Debug)]
pub struct PhraseStore {
    /// Phrases indexed by name
    phrases: BTreeMap<String, Phrase>,
    /// Directory holding one `<name>.json` per phrase
    dir: PathBuf,
}

impl PhraseStore {
    /// Create a new store over the given directory
    pub fn new(dir: PathBuf) -> Self {
        Self {
            phrases: BTreeMap::new(),
            dir,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load every phrase file from the directory
    ///
    /// Files that fail to parse are skipped with a warning. Returns the
    /// number of phrases loaded.
    pub fn load(&mut self) -> Result<usize, PhraseStoreError> {
        crate::debug!("Loading phrases from {:?}", self.dir);

        self.phrases.clear();
        if !self.dir.exists() {
            crate::debug!("No phrase directory found, starting with empty store");
            return Ok(0);
        }

        let entries =
            fs::read_dir(&self.dir).map_err(|e| PhraseStoreError::LoadError(e.to_string()))?;

        for entry in entries {
            let path = entry
                .map_err(|e| PhraseStoreError::LoadError(e.to_string()))?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some(PHRASE_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            match Self::read_phrase(&path) {
                Ok(mut phrase) => {
                    phrase.name = name.to_string();
                    self.phrases.insert(phrase.name.clone(), phrase);
                }
                Err(e) => crate::warn!("Skipping phrase file {:?}: {}", path, e),
            }
        }

        crate::info!("Loaded {} phrases", self.phrases.len());
        Ok(self.phrases.len())
    }

    fn read_phrase(path: &Path) -> Result<Phrase, String> {
        let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_json::from_str(&content).map_err(|e| e.to_string())
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, PHRASE_EXTENSION))
    }

    fn validate_name(name: &str) -> Result<(), PhraseStoreError> {
        let invalid = name.trim().is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\', ':'])
            || name.chars().any(char::is_control);
        if invalid {
            return Err(PhraseStoreError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    /// Persist a phrase using atomic write (temp file + rename)
    fn save(&self, phrase: &Phrase) -> Result<(), PhraseStoreError> {
        let path = self.path_for(&phrase.name);
        crate::debug!("Persisting phrase '{}' to {:?}", phrase.name, path);

        let content = serde_json::to_string_pretty(phrase)
            .map_err(|e| PhraseStoreError::PersistenceError(e.to_string()))?;
        crate::util::write_atomic(&path, &content)
            .map_err(|e| PhraseStoreError::PersistenceError(e.to_string()))
    }

    /// List all phrases ordered by name
    pub fn list(&self) -> Vec<&Phrase> {
        self.phrases.values().collect()
    }

    pub fn get(&self, name: &str) -> Option<&Phrase> {
        self.phrases.get(name)
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Insert or replace a phrase, returning the previous version
    pub fn upsert(&mut self, phrase: Phrase) -> Result<Option<Phrase>, PhraseStoreError> {
        Self::validate_name(&phrase.name)?;
        self.save(&phrase)?;

        let mut stored = phrase;
        stored.events.clear();
        Ok(self.phrases.insert(stored.name.clone(), stored))
    }

    /// Remove a phrase and its file
    pub fn remove(&mut self, name: &str) -> Result<Phrase, PhraseStoreError> {
        if !self.phrases.contains_key(name) {
            return Err(PhraseStoreError::NotFound(name.to_string()));
        }

        let path = self.path_for(name);
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| PhraseStoreError::PersistenceError(e.to_string()))?;
        }

        crate::debug!("Removed phrase '{}'", name);
        self.phrases
            .remove(name)
            .ok_or_else(|| PhraseStoreError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
