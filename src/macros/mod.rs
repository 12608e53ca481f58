// Macro resolver - turns a phrase template into ready-to-send output
//
// Stages run in a fixed order: embedded phrases, trigger overrides,
// markdown, dates, selections, command, fill-in, caret stops, key tokens.
// Nothing is emitted here; a failure or cancellation leaves no trace.

pub mod caret;
pub mod command;
pub mod date;
pub mod embed;
pub mod fillin;
pub mod html;
pub mod keys;
pub mod selection;
pub mod trigger;

pub use caret::CaretPlan;
pub use command::CommandError;

use crate::clipboard::ClipboardService;
use crate::form::FormUi;
use crate::keyboard::{Key, KeyDirection};
use crate::phrase::{Phrase, PhraseType};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Error raised while resolving a template
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("unknown key name in macro: {0}")]
    UnknownKey(String),
    #[error("malformed macro: {0}")]
    Malformed(String),
    #[error("date arithmetic out of range: {0}")]
    DateOutOfRange(String),
    #[error("invalid date format: {0:?}")]
    Format(String),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("fill-in form failed: {0}")]
    Form(String),
}

/// Named phrase lookup used by `$<name>` embedding
pub trait PhraseLookup: Send + Sync {
    fn phrase_by_name(&self, name: &str) -> Option<Phrase>;
}

impl PhraseLookup for HashMap<String, Phrase> {
    fn phrase_by_name(&self, name: &str) -> Option<Phrase> {
        self.get(name).cloned()
    }
}

/// Per-expansion inputs that do not come from the phrase
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext {
    /// Trigger character that completed the hotstring
    pub trigger: Option<char>,
    /// Global keep-trigger setting
    pub keep_trigger: bool,
    pub now: DateTime<Local>,
}

impl ResolveContext {
    pub fn new(trigger: Option<char>, keep_trigger: bool) -> Self {
        Self {
            trigger,
            keep_trigger,
            now: Local::now(),
        }
    }
}

/// An ordered piece of output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Text with its HTML twin for rich phrases
    Text { plain: String, rich: Option<String> },
    Key { key: Key, direction: KeyDirection },
}

/// Fully resolved output for one trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub fragments: Vec<Fragment>,
    /// All text without markup, key tokens or caret tokens
    pub plain: String,
    /// Markup rendition for rich phrases
    pub rich: Option<String>,
    /// Trigger character to re-emit after the body
    pub trigger_suffix: Option<char>,
    pub caret: Option<CaretPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Expanded(Expansion),
    /// The user dismissed a fill-in form
    Cancelled,
}

/// Runs the macro pipeline against a phrase
pub struct Resolver {
    phrases: Arc<dyn PhraseLookup>,
    clipboard: Arc<dyn ClipboardService>,
    form: Arc<dyn FormUi>,
    command_timeout: Duration,
}

impl Resolver {
    pub fn new(
        phrases: Arc<dyn PhraseLookup>,
        clipboard: Arc<dyn ClipboardService>,
        form: Arc<dyn FormUi>,
    ) -> Self {
        Self {
            phrases,
            clipboard,
            form,
            command_timeout: command::DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn resolve(&self, phrase: &Phrase, ctx: &ResolveContext) -> Result<Resolution, ResolveError> {
        let rich = phrase.phrase_type.is_rich();

        let body = embed::embed_phrases(&phrase.body, rich, self.phrases.as_ref());
        let (body, keep_trigger) = trigger::resolve_trigger_override(&body, ctx.keep_trigger);

        let body = match phrase.phrase_type {
            PhraseType::Markdown => markdown_to_html(&body),
            PhraseType::Plaintext | PhraseType::Richtext | PhraseType::Command | PhraseType::Html => body,
        };

        let body = date::expand_dates(&body, ctx.now)?;
        let body = selection::expand_selections(&body, rich, self.clipboard.as_ref());

        let body = match phrase.phrase_type {
            PhraseType::Command => command::run_command(&body, self.command_timeout)?,
            PhraseType::Plaintext | PhraseType::Richtext | PhraseType::Markdown | PhraseType::Html => body,
        };

        let body = if fillin::has_fillins(&body) {
            match fillin::fill(&body, rich, self.form.as_ref())? {
                Some(filled) => filled,
                None => return Ok(Resolution::Cancelled),
            }
        } else {
            body
        };

        let trigger_suffix = ctx.trigger.filter(|_| keep_trigger);

        // Caret positions are measured on what actually lands in the target
        let marked_plain = keys::strip_key_tokens(&if rich { html::to_plain(&body) } else { body.clone() });
        let caret = CaretPlan::from_marked_text(&marked_plain, trigger_suffix);
        let body = caret::strip_carets(&body);

        let fragments = build_fragments(&body, rich)?;
        let rich_body = rich.then(|| keys::strip_key_tokens(&body));

        Ok(Resolution::Expanded(Expansion {
            fragments,
            plain: caret::strip_carets(&marked_plain),
            rich: rich_body,
            trigger_suffix,
            caret,
        }))
    }
}

fn build_fragments(body: &str, rich: bool) -> Result<Vec<Fragment>, ResolveError> {
    let fragments = keys::split(body)?
        .into_iter()
        .map(|segment| match segment {
            keys::Segment::Text(text) if rich => Fragment::Text {
                plain: html::to_plain(text),
                rich: Some(text.to_string()),
            },
            keys::Segment::Text(text) => Fragment::Text {
                plain: text.to_string(),
                rich: None,
            },
            keys::Segment::Key(key, direction) => Fragment::Key { key, direction },
        })
        .collect();
    Ok(fragments)
}

/// CommonMark to HTML
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = pulldown_cmark::Parser::new(markdown);
    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html, parser);
    html
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
