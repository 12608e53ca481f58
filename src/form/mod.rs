// Fill-in form seam
//
// The resolver hands parsed `$fill…$` fields to a FormUi and substitutes the
// submitted values; a GUI would implement the trait with a dialog.

/// Kind of fill-in field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FillKind {
    /// Single-line text entry
    #[default]
    Entry,
    /// Multi-line text entry
    Multi,
    /// Drop-down choice among `values`
    Choice,
    /// Checkbox that inserts its text when checked
    Option,
}

impl FillKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "entry" => Some(FillKind::Entry),
            "multi" => Some(FillKind::Multi),
            "choice" => Some(FillKind::Choice),
            "option" => Some(FillKind::Option),
            _ => None,
        }
    }
}

/// One parsed fill-in placeholder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillField {
    pub kind: FillKind,
    /// Fields sharing a name share one value
    pub name: Option<String>,
    pub default: Option<String>,
    /// Choices (for `Choice`) or the checkbox text (for `Option`)
    pub values: Vec<String>,
    pub width: Option<String>,
    pub height: Option<String>,
}

impl FillField {
    pub fn new(kind: FillKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// The value a form shows before the user edits anything
    pub fn initial_value(&self) -> String {
        match self.kind {
            FillKind::Option => String::new(),
            FillKind::Choice => self
                .default
                .clone()
                .or_else(|| self.values.first().cloned())
                .unwrap_or_default(),
            FillKind::Entry | FillKind::Multi => self.default.clone().unwrap_or_default(),
        }
    }
}

/// Outcome of showing a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormResponse {
    /// One value per field, in field order
    Submitted(Vec<String>),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Form failed: {0}")]
pub struct FormError(pub String);

/// Presents fill-in fields to the user (allows mocking in tests)
pub trait FormUi: Send + Sync {
    /// `body` is the template being filled, for context
    fn prompt(&self, body: &str, fields: &[FillField]) -> Result<FormResponse, FormError>;
}

/// Headless form that submits every field's initial value
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultsFormUi;

impl FormUi for DefaultsFormUi {
    fn prompt(&self, _body: &str, fields: &[FillField]) -> Result<FormResponse, FormError> {
        crate::debug!("Submitting defaults for {} fill-in fields", fields.len());
        Ok(FormResponse::Submitted(
            fields.iter().map(FillField::initial_value).collect(),
        ))
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
