// Window filter - gates phrases on the active window's class and title

mod detector;

pub use detector::{platform_window_service, CommandWindowService};

use crate::phrase::Phrase;
use std::sync::Arc;

/// Class and title of the focused window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveWindow {
    pub class: String,
    pub title: String,
}

/// Reports the focused window (allows mocking in tests)
pub trait WindowService: Send + Sync {
    /// None when the active window cannot be determined
    fn active_window(&self) -> Option<ActiveWindow>;
}

/// True when `window` satisfies the phrase's class and title predicates
pub fn window_matches(phrase: &Phrase, window: &ActiveWindow) -> bool {
    let class_ok = phrase.wm_class.is_empty() || phrase.wm_class.contains(&window.class);
    let title_ok = phrase.wm_title.is_empty() || window.title.contains(&phrase.wm_title);
    class_ok && title_ok
}

/// Evaluates phrase window predicates, failing open
#[derive(Clone, Default)]
pub struct WindowFilter {
    service: Option<Arc<dyn WindowService>>,
}

impl WindowFilter {
    pub fn new(service: Option<Arc<dyn WindowService>>) -> Self {
        Self { service }
    }

    /// Whether the phrase may fire in the current window
    pub fn matches(&self, phrase: &Phrase) -> bool {
        if phrase.wm_class.is_empty() && phrase.wm_title.is_empty() {
            return true;
        }

        let Some(service) = &self.service else {
            crate::debug!("No window service; allowing '{}'", phrase.name);
            return true;
        };

        match service.active_window() {
            Some(window) => {
                let allowed = window_matches(phrase, &window);
                if !allowed {
                    crate::debug!(
                        "Phrase '{}' filtered out in window {:?} ({:?})",
                        phrase.name,
                        window.class,
                        window.title
                    );
                }
                allowed
            }
            None => {
                crate::debug!("Active window unknown; allowing '{}'", phrase.name);
                true
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
