#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Accessor strategies for loosely shaped input documents.
//!
//! Quiz exports and form dumps name the same logical value differently
//! (`text` vs `question`, `points` vs `maxScore`, `email` vs
//! `respondentEmail`). Each logical value gets exactly one [`FieldChain`]
//! here, listing candidate keys from highest to lowest precedence. The first
//! key that holds a usable value wins; callers supply the final default.

use serde_json::{Map, Value};

/// An ordered list of keys that all name the same logical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldChain {
    /// Human readable name of the logical value, used in logs.
    name: &'static str,
    /// Candidate keys, highest precedence first.
    keys: &'static [&'static str],
}

/// Question prompt text: `text`, then `question`.
pub const QUESTION_TEXT: FieldChain = FieldChain::new("question text", &["text", "question"]);

/// Question kind, e.g. `short_answer`. Only `type` is recognised.
pub const QUESTION_TYPE: FieldChain = FieldChain::new("question type", &["type"]);

/// Maximum points for a question: `points`, then `maxScore`.
pub const QUESTION_POINTS: FieldChain = FieldChain::new("question points", &["points", "maxScore"]);

/// Respondent email in a form export: `respondentEmail`, `email`, `Email`.
pub const STUDENT_EMAIL: FieldChain =
    FieldChain::new("student email", &["respondentEmail", "email", "Email"]);

/// Respondent display name: `respondentName`, `name`, `Name`.
pub const STUDENT_NAME: FieldChain =
    FieldChain::new("student name", &["respondentName", "name", "Name"]);

/// Form-side response identifier: `responseId`, then `id`.
pub const RESPONSE_ID: FieldChain = FieldChain::new("response id", &["responseId", "id"]);

impl FieldChain {
    /// Creates a chain from a name and its keys in precedence order.
    pub const fn new(name: &'static str, keys: &'static [&'static str]) -> Self {
        Self { name, keys }
    }

    /// Returns the logical name of this value.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the first value stored under any key. `null` counts as absent.
    pub fn resolve<'a>(&self, object: &'a Map<String, Value>) -> Option<&'a Value> {
        self.keys
            .iter()
            .filter_map(|key| object.get(*key))
            .find(|value| !value.is_null())
    }

    /// Like [`FieldChain::resolve`], but also skips blank strings and `false`.
    ///
    /// Form exports frequently carry empty columns, which must not shadow a
    /// lower precedence key that actually has data.
    pub fn resolve_present<'a>(&self, object: &'a Map<String, Value>) -> Option<&'a Value> {
        self.keys
            .iter()
            .filter_map(|key| object.get(*key))
            .find(|value| match value {
                Value::Null | Value::Bool(false) => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            })
    }

    /// Resolves the value and renders it as plain text.
    pub fn text(&self, object: &Map<String, Value>) -> Option<String> {
        self.resolve(object).map(render_scalar)
    }

    /// Resolves a non-blank value and renders it as plain text.
    pub fn present_text(&self, object: &Map<String, Value>) -> Option<String> {
        self.resolve_present(object).map(render_scalar)
    }
}

/// Renders a JSON value the way it should read inside a prompt.
///
/// Strings are emitted without quotes, numbers in their JSON spelling, and
/// anything structured as compact JSON.
pub fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
