// Tests for the command-line window detector

use super::*;

#[test]
fn test_parse_window_reads_class_then_title() {
    assert_eq!(
        parse_window("firefox\nInbox - Mail\n"),
        Some(ActiveWindow {
            class: "firefox".to_string(),
            title: "Inbox - Mail".to_string(),
        })
    );
    assert_eq!(
        parse_window("xterm\r\n\r\n"),
        Some(ActiveWindow {
            class: "xterm".to_string(),
            title: String::new(),
        })
    );
    assert_eq!(parse_window(""), None);
}

#[test]
fn test_missing_program_reports_unknown_window() {
    let service = CommandWindowService::with_program("xpander-no-such-tool");
    assert_eq!(service.active_window(), None);
}

#[cfg(unix)]
#[test]
fn test_single_invocation_supplies_class_and_title() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::TempDir::new().unwrap();
    let log = dir.path().join("calls");
    let tool = dir.path().join("fake-xdotool");
    std::fs::write(
        &tool,
        format!(
            "#!/bin/sh\necho \"$@\" >> '{}'\nprintf 'Navigator\\nDocs - Browser\\n'\n",
            log.display()
        ),
    )
    .unwrap();
    std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

    let service = CommandWindowService::with_program(tool.to_string_lossy());
    let window = service.active_window().unwrap();

    assert_eq!(window.class, "Navigator");
    assert_eq!(window.title, "Docs - Browser");
    let calls = std::fs::read_to_string(&log).unwrap();
    assert_eq!(
        calls.lines().collect::<Vec<_>>(),
        vec!["getactivewindow getwindowclassname getwindowname"]
    );
}

#[test]
#[ignore] // Requires X11 and xdotool
fn test_xdotool_integration() {
    let window = CommandWindowService::xdotool().active_window();
    assert!(window.is_some());
}
