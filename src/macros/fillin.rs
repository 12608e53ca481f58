// Interactive fill-in fields: `$fillentry:name=who:default=Bob$` and friends

use super::{html, ResolveError};
use crate::form::{FillField, FillKind, FormResponse, FormUi};
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static FILL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$fill(?P<kind>entry|multi|choice|option)(?::name=(?P<name>[^:$]+?))?(?::(?P<options>[^$]+?))?\$",
    )
    .expect("fill-in regex")
});

pub fn has_fillins(body: &str) -> bool {
    body.contains("$fill") && FILL_RE.is_match(body)
}

/// Parse every fill-in placeholder in order of appearance
pub fn parse_fields(body: &str) -> Vec<FillField> {
    FILL_RE.captures_iter(body).map(|caps| parse_field(&caps)).collect()
}

fn parse_field(caps: &Captures) -> FillField {
    let mut field = FillField {
        kind: caps
            .name("kind")
            .and_then(|m| FillKind::from_tag(m.as_str()))
            .unwrap_or_default(),
        name: caps.name("name").map(|m| m.as_str().to_string()),
        ..Default::default()
    };

    let options = caps.name("options").map(|m| m.as_str()).unwrap_or_default();
    for option in options.split(':').filter(|o| !o.is_empty()) {
        match option.split_once('=') {
            Some(("default", value)) => {
                field.default = Some(value.to_string());
                field.values.push(value.to_string());
            }
            Some(("width", value)) => field.width = Some(value.to_string()),
            Some(("height", value)) => field.height = Some(value.to_string()),
            _ => field.values.push(option.to_string()),
        }
    }

    // The default choice is listed once
    if field.kind == FillKind::Choice {
        let mut seen = HashSet::new();
        field.values.retain(|v| seen.insert(v.clone()));
    }
    field
}

/// Prompt for every field and substitute the answers
///
/// Returns `None` when the user cancels. Values are HTML-escaped for rich
/// targets.
pub fn fill(body: &str, target_rich: bool, form: &dyn FormUi) -> Result<Option<String>, ResolveError> {
    let fields = parse_fields(body);
    if fields.is_empty() {
        return Ok(Some(body.to_string()));
    }

    let values = match form
        .prompt(body, &fields)
        .map_err(|e| ResolveError::Form(e.to_string()))?
    {
        FormResponse::Submitted(values) => values,
        FormResponse::Cancelled => return Ok(None),
    };

    if values.len() != fields.len() {
        return Err(ResolveError::Malformed(format!(
            "form returned {} values for {} fields",
            values.len(),
            fields.len()
        )));
    }

    // The first field with a given name decides its value
    let mut named: HashMap<&str, &str> = HashMap::new();
    for (field, value) in fields.iter().zip(&values) {
        if let Some(name) = field.name.as_deref().filter(|n| !n.is_empty()) {
            named.entry(name).or_insert(value.as_str());
        }
    }

    let mut index = 0;
    let filled = FILL_RE.replace_all(body, |_: &Captures| {
        let field = &fields[index];
        let mut value = values[index].as_str();
        index += 1;

        if let Some(shared) = field.name.as_deref().and_then(|n| named.get(n).copied()) {
            value = shared;
        }
        if target_rich {
            html::escape(value)
        } else {
            value.to_string()
        }
    });

    Ok(Some(filled.into_owned()))
}

#[cfg(test)]
#[path = "fillin_test.rs"]
mod tests;
