// Shutdown coordination module
// Provides a global flag that stops keystroke synthesis mid-stream

use std::sync::atomic::{AtomicBool, Ordering};

/// Global shutdown flag - set once an immediate stop has been requested
static APP_SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);

/// Signal that the app is shutting down
///
/// Queued expansions still drain, but typing stops between characters.
pub fn signal_shutdown() {
    APP_SHUTTING_DOWN.store(true, Ordering::SeqCst);
    crate::info!("Immediate shutdown signaled");
}

/// Check if the app is shutting down
/// Returns true after signal_shutdown() has been called
pub fn is_shutting_down() -> bool {
    APP_SHUTTING_DOWN.load(Ordering::SeqCst)
}

#[cfg(test)]
pub(crate) fn reset_for_test() {
    APP_SHUTTING_DOWN.store(false, Ordering::SeqCst);
}

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod tests;
