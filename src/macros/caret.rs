// Caret stops: `$|` marks where the cursor lands after output

use std::collections::VecDeque;

pub const CARET: &str = "$|";

/// Cursor stops measured in characters from the start of the final plain text
///
/// The first stop is applied right after output with `initial_moves` left
/// presses; the remaining stops are forward deltas taken one per advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaretPlan {
    len: usize,
    positions: Vec<usize>,
}

impl CaretPlan {
    /// Build a plan from plain text still containing caret tokens
    ///
    /// `suffix` is the trigger character re-emitted after the text, if any.
    /// Returns `None` when there are no caret tokens.
    pub fn from_marked_text(text: &str, suffix: Option<char>) -> Option<CaretPlan> {
        if !text.contains(CARET) {
            return None;
        }

        let mut positions = Vec::new();
        let mut len = 0;
        let mut rest = text;
        while let Some(idx) = rest.find(CARET) {
            len += rest[..idx].chars().count();
            positions.push(len);
            rest = &rest[idx + CARET.len()..];
        }
        len += rest.chars().count() + usize::from(suffix.is_some());

        Some(CaretPlan { len, positions })
    }

    /// Length of the text the plan was measured against
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Left presses that move the cursor from the end of output to the first stop
    pub fn initial_moves(&self) -> usize {
        self.positions.first().map_or(0, |first| self.len - first)
    }

    /// Right presses for each later stop, in order
    pub fn remaining_stops(&self) -> VecDeque<usize> {
        self.positions.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

/// Remove every caret token
pub fn strip_carets(text: &str) -> String {
    text.replace(CARET, "")
}

#[cfg(test)]
#[path = "caret_test.rs"]
mod tests;
