// xpander - desktop text expansion engine
//
// Hotstrings and hotkeys resolve phrase templates through the macro pipeline
// and are typed or pasted back into the focused application.

// Enable coverage attribute on nightly for explicit exclusions
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod app;
pub mod clipboard;
pub mod engine;
pub mod form;
pub mod input;
pub mod keyboard;
pub mod macros;
pub mod output;
pub mod phrase;
pub mod registry;
pub mod settings;
pub mod shutdown;
#[cfg(test)]
pub(crate) mod testing;
mod util;
pub mod window;
pub mod worker;

// Re-export log macros for use throughout the crate
pub use log::{debug, error, info, trace, warn};

pub use app::{run, AppError};
