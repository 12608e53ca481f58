// Literal key injection tokens: `${KEY_TAB}`, `${KEY_SHIFT:down}`

use super::ResolveError;
use crate::keyboard::{Key, KeyDirection};
use regex::Regex;
use std::sync::LazyLock;

static KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(?P<key>KEY_\w+)(?::(?P<state>down|up))?\}").expect("key token regex")
});

/// A piece of body text or a key token, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Key(Key, KeyDirection),
}

/// Remove key tokens, leaving only the text that will be typed
pub fn strip_key_tokens(body: &str) -> String {
    KEY_RE.replace_all(body, "").into_owned()
}

/// Split the body into text and key segments
///
/// Empty text between adjacent tokens is dropped. Unknown key names fail
/// the whole split.
pub fn split(body: &str) -> Result<Vec<Segment<'_>>, ResolveError> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in KEY_RE.captures_iter(body) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            segments.push(Segment::Text(&body[last..whole.start()]));
        }

        let name = &caps["key"];
        let key = Key::from_name(name).ok_or_else(|| ResolveError::UnknownKey(name.to_string()))?;
        let direction = KeyDirection::from_state(caps.name("state").map(|m| m.as_str()))
            .unwrap_or(KeyDirection::Click);
        segments.push(Segment::Key(key, direction));
        last = whole.end();
    }

    if last < body.len() {
        segments.push(Segment::Text(&body[last..]));
    }
    Ok(segments)
}

#[cfg(test)]
#[path = "keys_test.rs"]
mod tests;
