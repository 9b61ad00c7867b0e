#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Input documents: the grading context and the student responses.

use std::{borrow::Cow, path::Path};

use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    error::ConfigError,
    fields::{QUESTION_POINTS, QUESTION_TEXT, QUESTION_TYPE, render_scalar},
};

/// Text used when a question has neither `text` nor `question`.
pub const MISSING_QUESTION_TEXT: &str = "Question not found";
/// Type used when a question does not declare one.
pub const UNKNOWN_QUESTION_TYPE: &str = "unknown";
/// Points assumed when a question declares neither `points` nor `maxScore`.
pub const DEFAULT_QUESTION_POINTS: u32 = 1;

/// A quiz question as written in the context document.
///
/// Field names vary between exports, so the raw object is kept and read
/// through the accessor strategies in [`crate::fields`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Question(Map<String, Value>);

impl Question {
    /// Stand-in for an index the quiz does not have.
    pub fn placeholder(index: i128) -> Self {
        let mut object = Map::new();
        object.insert("text".into(), Value::from(format!("Question {index}")));
        object.insert("type".into(), Value::from(UNKNOWN_QUESTION_TYPE));
        object.insert("points".into(), Value::from(DEFAULT_QUESTION_POINTS));
        Self(object)
    }

    /// Question text, falling back to [`MISSING_QUESTION_TEXT`].
    pub fn text(&self) -> String {
        QUESTION_TEXT
            .text(&self.0)
            .unwrap_or_else(|| MISSING_QUESTION_TEXT.to_string())
    }

    /// Question type, falling back to [`UNKNOWN_QUESTION_TYPE`].
    pub fn kind(&self) -> String {
        QUESTION_TYPE
            .text(&self.0)
            .unwrap_or_else(|| UNKNOWN_QUESTION_TYPE.to_string())
    }

    /// Maximum points, falling back to [`DEFAULT_QUESTION_POINTS`].
    pub fn points(&self) -> Value {
        QUESTION_POINTS
            .resolve(&self.0)
            .cloned()
            .unwrap_or_else(|| Value::from(DEFAULT_QUESTION_POINTS))
    }

    /// Maximum points rendered for a prompt.
    pub fn points_text(&self) -> String {
        render_scalar(&self.points())
    }
}

/// Quiz metadata and its ordered questions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quiz {
    /// Quiz title.
    pub title:       Option<String>,
    /// Free-form description shown to the grader.
    pub description: Option<String>,
    /// Questions, addressed by zero-based index.
    pub questions:   Vec<Question>,
}

impl Quiz {
    /// Returns the question at `index`, or a placeholder when the quiz has
    /// no such question. Old response sets may reference removed questions,
    /// and negative indices never match.
    pub fn question(&self, index: i128) -> Cow<'_, Question> {
        match usize::try_from(index).ok().and_then(|i| self.questions.get(i)) {
            Some(question) => Cow::Borrowed(question),
            None => {
                tracing::debug!(index = %index, "question index out of range, using placeholder");
                Cow::Owned(Question::placeholder(index))
            }
        }
    }
}

/// Scoring guidance for one rubric key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RubricEntry {
    /// Maximum score; any scalar, rendered `N/A` when absent.
    pub max_score:    Option<Value>,
    /// What earns credit.
    pub criteria:     Option<String>,
    /// Reference answer, omitted from the prompt when blank.
    pub model_answer: Option<String>,
}

/// A previously scored answer used to calibrate strictness and tone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationExample {
    /// The example answer.
    pub answer:   Option<String>,
    /// Score it received.
    pub score:    Option<Value>,
    /// Feedback it received.
    pub feedback: Option<String>,
}

/// Everything the grader needs besides the answers. Immutable for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    /// The quiz being graded.
    pub quiz:                 Quiz,
    /// Rubric entries in document order.
    pub rubric:               IndexMap<String, RubricEntry>,
    /// Calibration examples in document order.
    pub calibration_examples: Vec<CalibrationExample>,
}

impl Context {
    /// Parses a context document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Json {
            document: "context".into(),
            source,
        })
    }

    /// Reads and parses a context document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = read(path)?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            document: path.display().to_string(),
            source,
        })
    }
}

/// One answer to grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer<'a> {
    /// Opaque student identifier.
    pub student_id: &'a str,
    /// Question index as written; may lie outside the quiz.
    pub index:      i128,
    /// The answer exactly as submitted.
    pub text:       &'a str,
}

/// Student answers keyed by student, then by question index.
///
/// Students keep document order; each student's answers are sorted by
/// numeric question index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseSet {
    /// Per-student answers as `(index, text)`, ascending by index.
    students: IndexMap<String, Vec<(i128, String)>>,
}

impl ResponseSet {
    /// Builds a response set from the raw document shape, normalizing the
    /// string question indices to integers. Any integer is accepted; only
    /// indices that are not integers at all are rejected.
    pub fn from_raw(raw: IndexMap<String, IndexMap<String, String>>) -> Result<Self, ConfigError> {
        let mut students = IndexMap::with_capacity(raw.len());

        for (student, answers) in raw {
            let mut normalized = Vec::with_capacity(answers.len());
            for (index, text) in answers {
                let parsed = index.trim().parse::<i128>().map_err(|_| {
                    ConfigError::QuestionIndex {
                        student: student.clone(),
                        index:   index.clone(),
                    }
                })?;
                normalized.push((parsed, text));
            }

            normalized.sort_by_key(|(index, _)| *index);
            if let Some(index) = normalized.iter().map(|(index, _)| *index).duplicates().next() {
                return Err(ConfigError::DuplicateIndex { student, index });
            }

            students.insert(student, normalized);
        }

        Ok(Self { students })
    }

    /// Parses a responses document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let raw = serde_json::from_str(text).map_err(|source| ConfigError::Json {
            document: "responses".into(),
            source,
        })?;
        Self::from_raw(raw)
    }

    /// Reads and parses a responses document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = read(path)?;
        let raw = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            document: path.display().to_string(),
            source,
        })?;
        Self::from_raw(raw)
    }

    /// Student identifiers in document order.
    pub fn students(&self) -> impl Iterator<Item = &str> {
        self.students.keys().map(String::as_str)
    }

    /// Every (student, question) pair in grading order.
    pub fn answers(&self) -> impl Iterator<Item = Answer<'_>> {
        self.students.iter().flat_map(|(student_id, answers)| {
            answers.iter().map(move |(index, text)| Answer {
                student_id,
                index: *index,
                text,
            })
        })
    }

    /// Number of students.
    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    /// Number of (student, question) pairs.
    pub fn answer_count(&self) -> usize {
        self.students.values().map(Vec::len).sum()
    }
}

/// Reads a whole input file.
fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn question_fallbacks() {
        let q: Question = serde_json::from_value(json!({"question": "Why?", "maxScore": 3}))
            .expect("question");
        assert_eq!(q.text(), "Why?");
        assert_eq!(q.kind(), "unknown");
        assert_eq!(q.points_text(), "3");

        let empty = Question::default();
        assert_eq!(empty.text(), "Question not found");
        assert_eq!(empty.points(), json!(1));
    }

    #[test]
    fn out_of_range_index_yields_placeholder() {
        let quiz = Quiz::default();
        let q = quiz.question(7);
        assert_eq!(q.text(), "Question 7");
        assert_eq!(q.kind(), "unknown");
        assert_eq!(q.points(), json!(1));
    }

    #[test]
    fn empty_context_document_is_valid() {
        let ctx = Context::from_json_str("{}").expect("context");
        assert!(ctx.quiz.questions.is_empty());
        assert!(ctx.rubric.is_empty());
    }

    #[test]
    fn rubric_keeps_document_order() {
        let ctx = Context::from_json_str(r#"{"rubric": {"b": {}, "a": {}, "c": {}}}"#)
            .expect("context");
        let keys: Vec<_> = ctx.rubric.keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn answers_sorted_numerically_students_in_order() {
        let set = ResponseSet::from_json_str(
            r#"{"zed": {"10": "x", "2": "y"}, "amy": {"1": "z", "0": "w"}}"#,
        )
        .expect("responses");

        let order: Vec<_> = set.answers().map(|a| (a.student_id, a.index)).collect();
        assert_eq!(order, [("zed", 2), ("zed", 10), ("amy", 0), ("amy", 1)]);
        assert_eq!(set.student_count(), 2);
        assert_eq!(set.answer_count(), 4);
    }

    #[test]
    fn student_without_answers_is_kept() {
        let set = ResponseSet::from_json_str(r#"{"s001": {}}"#).expect("responses");
        assert_eq!(set.students().collect::<Vec<_>>(), ["s001"]);
        assert_eq!(set.answer_count(), 0);
    }

    #[test]
    fn negative_and_huge_indices_are_kept() {
        let set = ResponseSet::from_json_str(
            r#"{"s1": {"0": "y", "-1": "x", "99999999999999999999999": "z"}}"#,
        )
        .expect("responses");
        let order: Vec<_> = set.answers().map(|a| a.index).collect();
        assert_eq!(order, [-1, 0, 99_999_999_999_999_999_999_999]);

        let quiz = Quiz {
            questions: vec![Question::default()],
            ..Quiz::default()
        };
        assert_eq!(quiz.question(-1).text(), "Question -1");
        assert_eq!(quiz.question(99_999_999_999_999_999_999_999).kind(), "unknown");
        assert_eq!(quiz.question(0).text(), "Question not found");
    }

    #[test]
    fn non_integer_index_is_config_error() {
        let err = ResponseSet::from_json_str(r#"{"s001": {"first": "x"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::QuestionIndex { .. }));
    }

    #[test]
    fn colliding_indices_are_config_error() {
        let err = ResponseSet::from_json_str(r#"{"s001": {"1": "x", "01": "y"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateIndex { index: 1, .. }));
    }

    #[test]
    fn malformed_document_is_config_error() {
        let err = ResponseSet::from_json_str(r#"{"s001": ["not", "a", "map"]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
    }
}
