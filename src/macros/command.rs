// Command phrases: the body is a shell command whose stdout becomes the body

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Default hard limit for a command phrase
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("failed to start command: {0}")]
    Spawn(String),
    #[error("command timed out after {0:?}")]
    Timeout(Duration),
    #[error("command exited with {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },
    #[error("could not start async runtime: {0}")]
    Runtime(String),
}

/// Run `command` through the platform shell and capture stdout
///
/// Trailing newlines are stripped. The child is killed when `timeout`
/// elapses.
pub fn run_command(command: &str, timeout: Duration) -> Result<String, CommandError> {
    crate::debug!("Running command phrase: {}", command);
    crate::util::run_async(run(command, timeout))
        .map_err(|e| CommandError::Runtime(e.to_string()))?
}

async fn run(command: &str, timeout: Duration) -> Result<String, CommandError> {
    let child = shell(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| CommandError::Spawn(e.to_string()))?;

    // Dropping the timed-out future drops the child, which kills it
    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| CommandError::Timeout(timeout))?
        .map_err(|e| CommandError::Spawn(e.to_string()))?;

    if !output.status.success() {
        return Err(CommandError::NonZeroExit {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.trim_end_matches(|c| c == '\n' || c == '\r').to_string())
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(test)]
#[path = "command_test.rs"]
mod tests;
