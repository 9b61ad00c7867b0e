#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Turns raw model output into a typed result.

use serde_json::{Map, Value};

/// What could be recovered from a model response.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// A JSON object was found in the response.
    Parsed(Map<String, Value>),
    /// No JSON object could be recovered; holds the response verbatim.
    Unparsed(String),
}

impl Extracted {
    /// Returns true when no JSON object was recovered.
    pub fn is_unparsed(&self) -> bool {
        matches!(self, Extracted::Unparsed(_))
    }
}

/// Extracts the JSON object spanning the first `{` to the last `}`.
///
/// Models like to wrap JSON in prose or code fences; anything outside the
/// outermost braces is discarded. Never fails: malformed input comes back
/// as [`Extracted::Unparsed`].
pub fn extract(raw: &str) -> Extracted {
    let span = raw
        .find('{')
        .zip(raw.rfind('}'))
        .filter(|(start, end)| start < end);

    if let Some((start, end)) = span
        && let Ok(Value::Object(object)) = serde_json::from_str::<Value>(&raw[start..=end])
    {
        return Extracted::Parsed(object);
    }

    Extracted::Unparsed(raw.to_owned())
}
