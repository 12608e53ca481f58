// Clipboard and primary selection substitution: `$C` and `$S`

use crate::clipboard::{ClipContent, ClipboardService, Selection};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

pub const CLIPBOARD_TOKEN: &str = "$C";
pub const SELECTION_TOKEN: &str = "$S";

static SELECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[CS]").expect("selection regex"));

/// Replace selection tokens, reading each source at most once
///
/// `$S` falls back to the clipboard where there is no primary selection.
/// An unreadable source substitutes as empty text.
pub fn expand_selections(body: &str, target_rich: bool, clipboard: &dyn ClipboardService) -> String {
    if !body.contains(CLIPBOARD_TOKEN) && !body.contains(SELECTION_TOKEN) {
        return body.to_string();
    }

    let primary = if clipboard.has_primary() {
        Selection::Primary
    } else {
        Selection::Clipboard
    };

    let mut cache: HashMap<Selection, String> = HashMap::new();

    SELECTION_RE
        .replace_all(body, |caps: &Captures| {
            let selection = if &caps[0] == CLIPBOARD_TOKEN {
                Selection::Clipboard
            } else {
                primary
            };
            cache
                .entry(selection)
                .or_insert_with(|| read(clipboard, selection).for_target(target_rich))
                .clone()
        })
        .into_owned()
}

fn read(clipboard: &dyn ClipboardService, selection: Selection) -> ClipContent {
    clipboard.get(selection).unwrap_or_else(|e| {
        crate::warn!("Could not read {:?}: {}", selection, e);
        ClipContent::default()
    })
}
