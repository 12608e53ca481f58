// Tests for command phrases
// These spawn real shell processes, so they only run on Unix.
#![cfg(unix)]
#![cfg_attr(coverage_nightly, coverage(off))]

use super::*;
use std::time::Instant;

#[test]
fn test_stdout_becomes_body() {
    let out = run_command("echo hello; echo world", DEFAULT_COMMAND_TIMEOUT).unwrap();
    assert_eq!(out, "hello\nworld");
}

#[test]
fn test_only_trailing_newlines_stripped() {
    let out = run_command("printf '  padded  \\n\\n'", DEFAULT_COMMAND_TIMEOUT).unwrap();
    assert_eq!(out, "  padded  ");
}

#[test]
fn test_non_zero_exit() {
    let err = run_command("echo oops >&2; exit 3", DEFAULT_COMMAND_TIMEOUT).unwrap_err();
    assert_eq!(
        err,
        CommandError::NonZeroExit {
            code: Some(3),
            stderr: "oops".to_string()
        }
    );
}

#[test]
fn test_timeout_kills_child() {
    let start = Instant::now();
    let err = run_command("sleep 5", Duration::from_millis(200)).unwrap_err();

    assert_eq!(err, CommandError::Timeout(Duration::from_millis(200)));
    assert!(start.elapsed() < Duration::from_secs(3));
}
