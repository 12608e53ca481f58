// Clipboard service - text and HTML access to the clipboard and the X11
// primary selection

use std::cell::RefCell;

/// Which system selection to read or write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
    Clipboard,
    /// X11 primary selection (highlighted text)
    Primary,
}

/// Clipboard contents: plain text plus an optional HTML twin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipContent {
    pub text: String,
    pub html: Option<String>,
}

impl ClipContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: None,
        }
    }

    pub fn rich(text: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: Some(html.into()),
        }
    }

    /// HTML when the target is rich and HTML is present, else escaped or plain text
    pub fn for_target(&self, rich: bool) -> String {
        match (&self.html, rich) {
            (Some(html), true) => html.clone(),
            (None, true) => crate::macros::html::escape(&self.text),
            (_, false) => self.text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("Selection {0:?} is not supported on this platform")]
    Unsupported(Selection),
}

/// Access to system selections (allows mocking in tests)
pub trait ClipboardService: Send + Sync {
    fn get(&self, selection: Selection) -> Result<ClipContent, ClipboardError>;
    fn set(&self, selection: Selection, content: &ClipContent) -> Result<(), ClipboardError>;

    /// Whether `Selection::Primary` is backed by a real primary selection
    fn has_primary(&self) -> bool;
}

thread_local! {
    // One arboard handle per thread keeps X11 selection ownership alive for
    // the lifetime of the thread that set it.
    static CLIPBOARD: RefCell<Option<arboard::Clipboard>> = const { RefCell::new(None) };
}

fn with_clipboard<T>(
    f: impl FnOnce(&mut arboard::Clipboard) -> Result<T, arboard::Error>,
) -> Result<T, ClipboardError> {
    CLIPBOARD.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            *slot = Some(clipboard);
        }
        match slot.as_mut() {
            Some(clipboard) => f(clipboard).map_err(|e| ClipboardError::Unavailable(e.to_string())),
            None => Err(ClipboardError::Unavailable("no clipboard handle".to_string())),
        }
    })
}

/// Clipboard service backed by arboard
///
/// Reads return the text flavor plus the HTML flavor when one is offered,
/// so a snapshot written back restores both.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArboardClipboard;

impl ArboardClipboard {
    pub fn new() -> Self {
        Self
    }
}

impl ClipboardService for ArboardClipboard {
    fn get(&self, selection: Selection) -> Result<ClipContent, ClipboardError> {
        with_clipboard(|clipboard| {
            let text = match read_text(clipboard, selection) {
                Err(arboard::Error::ContentNotAvailable) => String::new(),
                other => other?,
            };
            let html = match read_html(clipboard, selection) {
                Ok(html) => Some(html),
                Err(arboard::Error::ContentNotAvailable) => None,
                Err(e) => {
                    crate::debug!("No HTML flavor on {:?}: {}", selection, e);
                    None
                }
            };
            Ok(ClipContent { text, html })
        })
    }

    fn set(&self, selection: Selection, content: &ClipContent) -> Result<(), ClipboardError> {
        with_clipboard(|clipboard| write_content(clipboard, selection, content))
    }

    fn has_primary(&self) -> bool {
        cfg!(all(unix, not(target_os = "macos")))
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn linux_kind(selection: Selection) -> arboard::LinuxClipboardKind {
    match selection {
        Selection::Clipboard => arboard::LinuxClipboardKind::Clipboard,
        Selection::Primary => arboard::LinuxClipboardKind::Primary,
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn read_text(clipboard: &mut arboard::Clipboard, selection: Selection) -> Result<String, arboard::Error> {
    use arboard::GetExtLinux;
    clipboard.get().clipboard(linux_kind(selection)).text()
}

#[cfg(all(unix, not(target_os = "macos")))]
fn read_html(clipboard: &mut arboard::Clipboard, selection: Selection) -> Result<String, arboard::Error> {
    use arboard::GetExtLinux;
    clipboard.get().clipboard(linux_kind(selection)).html()
}

#[cfg(all(unix, not(target_os = "macos")))]
fn write_content(
    clipboard: &mut arboard::Clipboard,
    selection: Selection,
    content: &ClipContent,
) -> Result<(), arboard::Error> {
    use arboard::SetExtLinux;
    let kind = linux_kind(selection);
    match &content.html {
        Some(html) => clipboard
            .set()
            .clipboard(kind)
            .html(html.as_str(), Some(content.text.as_str())),
        None => clipboard.set().clipboard(kind).text(content.text.as_str()),
    }
}

// Without a primary selection both selections share the clipboard
#[cfg(not(all(unix, not(target_os = "macos"))))]
fn read_text(clipboard: &mut arboard::Clipboard, _selection: Selection) -> Result<String, arboard::Error> {
    clipboard.get_text()
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn read_html(clipboard: &mut arboard::Clipboard, _selection: Selection) -> Result<String, arboard::Error> {
    clipboard.get().html()
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn write_content(
    clipboard: &mut arboard::Clipboard,
    _selection: Selection,
    content: &ClipContent,
) -> Result<(), arboard::Error> {
    match &content.html {
        Some(html) => clipboard.set_html(html.as_str(), Some(content.text.as_str())),
        None => clipboard.set_text(content.text.as_str()),
    }
}

#[cfg(test)]
#[path = "clipboard_test.rs"]
mod tests;
