// Rich to plain text extraction and plain text escaping

use regex::{Captures, Regex};
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<(/?)([a-zA-Z][a-zA-Z0-9]*)((?:[^>\x22']|\x22[^\x22]*\x22|'[^']*')*)>")
        .expect("tag regex")
});

static ALT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\balt\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("alt regex")
});

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("entity regex")
});

/// Elements whose text never reaches the plain rendition
const SKIPPED: &[&str] = &["head", "style", "script", "title"];

/// Closing tags that end a line
const BLOCKS: &[&str] = &[
    "p", "div", "li", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "blockquote", "pre",
];

/// Extract plain text from HTML markup
///
/// `<br>` and the end of block elements become newlines, images become
/// their alt text, entities are decoded and a trailing newline is dropped.
/// Newlines inside text runs are source formatting: they become spaces, and
/// newlines or tabs at the edges of a run are trimmed.
pub fn to_plain(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut skipping = 0usize;
    let mut last = 0;

    for caps in TAG_RE.captures_iter(html) {
        let Some(whole) = caps.get(0) else { continue };
        if skipping == 0 {
            push_text(&mut out, &html[last..whole.start()]);
        }
        last = whole.end();

        let Some(name) = caps.get(2) else {
            continue; // comment
        };
        let name = name.as_str().to_ascii_lowercase();
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());

        if SKIPPED.contains(&name.as_str()) {
            skipping = if closing {
                skipping.saturating_sub(1)
            } else {
                skipping + 1
            };
            continue;
        }
        if skipping > 0 {
            continue;
        }

        match (name.as_str(), closing) {
            ("br", _) => out.push('\n'),
            ("img", false) => {
                let attrs = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
                if let Some(alt) = ALT_RE.captures(attrs) {
                    let text = alt.get(1).or_else(|| alt.get(2)).map(|m| m.as_str());
                    out.push_str(&decode_entities(text.unwrap_or_default()));
                }
            }
            (block, true) if BLOCKS.contains(&block) => out.push('\n'),
            _ => {}
        }
    }

    if skipping == 0 {
        push_text(&mut out, &html[last..]);
    }

    while out.ends_with('\n') {
        out.pop();
    }
    out
}

fn push_text(out: &mut String, data: &str) {
    // Source formatting newlines are not content
    let trimmed = data.trim_matches(|c| c == '\n' || c == '\r' || c == '\t');
    if trimmed.is_empty() {
        return;
    }
    let flattened = trimmed.replace("\r\n", " ").replace('\n', " ");
    out.push_str(&decode_entities(&flattened));
}

/// Decode named and numeric character references
pub fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            decode_entity(entity).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<String> {
    let ch = match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        numeric => {
            let digits = numeric.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u32>().ok()?,
            };
            char::from_u32(code)?
        }
    };
    Some(ch.to_string())
}

/// Escape plain text for insertion into HTML
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("<br>"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "html_test.rs"]
mod tests;
