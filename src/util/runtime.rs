//! Tokio runtime helpers for async-to-sync bridges.
//!
//! Command macros run on the expansion worker thread, which has no runtime
//! of its own.

/// Run an async future in the current context.
///
/// Handles two scenarios:
/// 1. If a Tokio runtime is already running, uses `block_in_place` to block on the future.
/// 2. If no runtime is available, creates a temporary current-thread one.
///
/// # Errors
/// Returns the I/O error when a runtime cannot be created.
pub fn run_async<F, T>(future: F) -> std::io::Result<T>
where
    F: std::future::Future<Output = T>,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Ok(tokio::task::block_in_place(|| handle.block_on(future))),
        Err(_) => {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            Ok(rt.block_on(future))
        }
    }
}

#[cfg(test)]
#[path = "runtime_test.rs"]
mod tests;
