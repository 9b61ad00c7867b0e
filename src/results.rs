#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Terminal per-pair results and the map that collects them.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::Value;

use crate::{dry_run::DRY_RUN_FEEDBACK, extract::Extracted, fields::render_scalar};

/// Per-student, per-question results of one run.
///
/// Students keep response-document order, questions ascend by index, and
/// keys are the stringified question indices.
pub type GradeMap = IndexMap<String, IndexMap<String, GradeResult>>;

/// The final outcome for one (student, question) pair. Never mutated once
/// built.
#[derive(Debug, Clone, PartialEq)]
pub enum GradeResult {
    /// The capability answered.
    Graded {
        /// What was recovered from the answer.
        extracted: Extracted,
        /// When the answer arrived.
        graded_at: DateTime<Utc>,
    },
    /// The capability call failed.
    Failed {
        /// Description of the failure.
        message: String,
    },
    /// Synthesized without calling the capability.
    DryRun,
}

impl GradeResult {
    /// Wraps an extracted answer, stamping the current time.
    pub fn graded(extracted: Extracted) -> Self {
        GradeResult::Graded {
            extracted,
            graded_at: Utc::now(),
        }
    }

    /// Builds a failure record from any displayable error.
    pub fn failed(error: impl std::fmt::Display) -> Self {
        GradeResult::Failed {
            message: error.to_string(),
        }
    }

    /// Numeric score; zero for failures, dry runs, and unusable answers.
    pub fn score(&self) -> f64 {
        match self {
            GradeResult::Graded {
                extracted: Extracted::Parsed(object),
                ..
            } => object.get("score").and_then(score_value).unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Feedback text as it appears in the grade document.
    pub fn feedback(&self) -> String {
        match self {
            GradeResult::Graded {
                extracted: Extracted::Parsed(object),
                ..
            } => object.get("feedback").map(render_scalar).unwrap_or_default(),
            GradeResult::Graded {
                extracted: Extracted::Unparsed(raw),
                ..
            } => raw.clone(),
            GradeResult::Failed { message } => format!("Grading error: {message}"),
            GradeResult::DryRun => DRY_RUN_FEEDBACK.to_string(),
        }
    }

    /// Time the answer arrived, for graded results.
    pub fn graded_at(&self) -> Option<DateTime<Utc>> {
        match self {
            GradeResult::Graded { graded_at, .. } => Some(*graded_at),
            _ => None,
        }
    }

    /// True when the capability answered with something other than JSON.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            GradeResult::Graded {
                extracted: Extracted::Unparsed(_),
                ..
            }
        )
    }

    /// True when the capability call failed.
    pub fn is_error(&self) -> bool {
        matches!(self, GradeResult::Failed { .. })
    }

    /// True for dry-run placeholders.
    pub fn is_dry_run(&self) -> bool {
        matches!(self, GradeResult::DryRun)
    }
}

/// Reads a score that the model may have sent as a number or a numeric
/// string.
fn score_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Formats timestamps as RFC 3339 UTC with a `Z` suffix.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Serialize for GradeResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GradeResult::Graded {
                extracted: Extracted::Parsed(object),
                graded_at,
            } => {
                // The model's object is passed through as-is; only the
                // timestamp is ours.
                let mut map = serializer.serialize_map(None)?;
                for (key, value) in object.iter().filter(|(k, _)| k.as_str() != "gradedAt") {
                    map.serialize_entry(key, value)?;
                }
                map.serialize_entry("gradedAt", &timestamp(graded_at))?;
                map.end()
            }
            GradeResult::Graded {
                extracted: Extracted::Unparsed(raw),
                graded_at,
            } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("score", &0)?;
                map.serialize_entry("feedback", raw)?;
                map.serialize_entry("parse_error", &true)?;
                map.serialize_entry("gradedAt", &timestamp(graded_at))?;
                map.end()
            }
            GradeResult::Failed { .. } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("score", &0)?;
                map.serialize_entry("feedback", &self.feedback())?;
                map.serialize_entry("error", &true)?;
                map.end()
            }
            GradeResult::DryRun => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("score", &0)?;
                map.serialize_entry("feedback", DRY_RUN_FEEDBACK)?;
                map.serialize_entry("dry_run", &true)?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::extract::extract;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap()
    }

    #[test]
    fn parsed_result_passes_model_fields_through() {
        let result = GradeResult::Graded {
            extracted: extract(r#"{"score": 4, "feedback": "Good", "confidence": "high"}"#),
            graded_at: at(),
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "score": 4,
                "feedback": "Good",
                "confidence": "high",
                "gradedAt": "2025-01-15T10:30:00.000000Z"
            })
        );
        assert_eq!(result.score(), 4.0);
        assert_eq!(result.feedback(), "Good");
    }

    #[test]
    fn unparsed_result_is_flagged() {
        let result = GradeResult::Graded {
            extracted: extract("no json"),
            graded_at: at(),
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "score": 0,
                "feedback": "no json",
                "parse_error": true,
                "gradedAt": "2025-01-15T10:30:00.000000Z"
            })
        );
        assert!(result.is_parse_error());
        assert!(!result.is_error());
    }

    #[test]
    fn failed_result_is_flagged() {
        let result = GradeResult::failed("connection reset");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"score": 0, "feedback": "Grading error: connection reset", "error": true})
        );
        assert!(result.graded_at().is_none());
    }

    #[test]
    fn dry_run_result_shape() {
        assert_eq!(
            serde_json::to_value(GradeResult::DryRun).unwrap(),
            json!({
                "score": 0,
                "feedback": "[DRY RUN - no actual grading performed]",
                "dry_run": true
            })
        );
    }

    #[test]
    fn string_scores_are_read() {
        let result = GradeResult::graded(extract(r#"{"score": " 2.5 ", "feedback": 7}"#));
        assert_eq!(result.score(), 2.5);
        assert_eq!(result.feedback(), "7");
    }

    #[test]
    fn model_supplied_timestamp_is_replaced() {
        let result = GradeResult::Graded {
            extracted: extract(r#"{"score": 1, "gradedAt": "yesterday"}"#),
            graded_at: at(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["gradedAt"], json!("2025-01-15T10:30:00.000000Z"));
    }
}
