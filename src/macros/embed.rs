// Embedded phrase substitution: `$<name>`

use super::{html, PhraseLookup};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static EMBED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$<(?P<name>[^<>]+?)>").expect("embed regex"));

/// Replace each `$<name>` with the named phrase's raw body, one level deep
///
/// Bodies pulled in are not scanned again. Rich bodies embedded into a
/// plain target are reduced to plain text; unknown names stay as written.
pub fn embed_phrases(body: &str, target_rich: bool, phrases: &dyn PhraseLookup) -> String {
    if !body.contains("$<") {
        return body.to_string();
    }

    EMBED_RE
        .replace_all(body, |caps: &Captures| {
            let name = &caps["name"];
            match phrases.phrase_by_name(name) {
                Some(embedded) if embedded.phrase_type.is_rich() && !target_rich => {
                    html::to_plain(&embedded.body)
                }
                Some(embedded) => embedded.body,
                None => {
                    crate::debug!("Embedded phrase '{}' not found; leaving token", name);
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}
