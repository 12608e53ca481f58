//! Shared utilities.
//!
//! - `runtime`: Tokio runtime helper for the async-to-sync bridge used by
//!   command macros
//! - `fs`: atomic JSON file writes shared by the phrase store and settings

mod fs;
mod runtime;

pub use fs::write_atomic;
pub use runtime::run_async;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
