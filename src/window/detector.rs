// Active window detection for Linux/X11
//
// Shells out to xdotool for the focused window's class and title. Other
// platforms have no detector and the filter fails open.

use super::{ActiveWindow, WindowService};
use std::process::Command;
use std::sync::Arc;

/// Window service that queries the focused window through a command-line tool
#[derive(Debug, Clone)]
pub struct CommandWindowService {
    program: String,
}

impl CommandWindowService {
    /// Use xdotool from PATH
    pub fn xdotool() -> Self {
        Self::with_program("xdotool")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn query(&self, args: &[&str]) -> Result<String, String> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| format!("Failed to run {}: {}", self.program, e))?;

        if !output.status.success() {
            return Err(format!(
                "{} {} exited with {}",
                self.program,
                args.join(" "),
                output.status
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Class on the first line, title on the second
///
/// A missing title line reads as an empty title; empty output is no window.
fn parse_window(stdout: &str) -> Option<ActiveWindow> {
    let mut lines = stdout.lines().map(str::trim_end);
    let class = lines.next().filter(|class| !class.is_empty())?;
    let title = lines.next().unwrap_or_default();
    Some(ActiveWindow {
        class: class.to_string(),
        title: title.to_string(),
    })
}

impl WindowService for CommandWindowService {
    fn active_window(&self) -> Option<ActiveWindow> {
        // One invocation so class and title describe the same window
        match self.query(&["getactivewindow", "getwindowclassname", "getwindowname"]) {
            Ok(stdout) => parse_window(&stdout),
            Err(e) => {
                crate::debug!("Window detection failed: {}", e);
                None
            }
        }
    }
}

/// The window service for this platform, if one exists
#[cfg(target_os = "linux")]
pub fn platform_window_service() -> Option<Arc<dyn WindowService>> {
    let x11 = std::env::var_os("DISPLAY").is_some();
    let wayland = std::env::var_os("WAYLAND_DISPLAY").is_some();
    if x11 && !wayland {
        Some(Arc::new(CommandWindowService::xdotool()))
    } else {
        crate::info!("No X11 display; window filters are disabled");
        None
    }
}

#[cfg(not(target_os = "linux"))]
pub fn platform_window_service() -> Option<Arc<dyn WindowService>> {
    crate::info!("Window detection unavailable on this platform; window filters are disabled");
    None
}

#[cfg(test)]
#[path = "detector_test.rs"]
mod tests;
