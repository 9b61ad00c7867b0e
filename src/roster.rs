#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Student rosters.
//!
//! Grade documents only ever carry opaque ids like `s001`. A roster maps
//! those ids back to personal information and is kept outside any shared
//! files. Nothing in the grading path reads a roster.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::{Table, Tabled, settings::Style};

use crate::{
    error::ConfigError,
    fields::{RESPONSE_ID, STUDENT_EMAIL, STUDENT_NAME},
};

/// Identity details for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentEntry {
    /// Contact email.
    pub email:       String,
    /// Form-side response identifier, used when exporting grades back.
    #[serde(rename = "responseId", default)]
    pub response_id: Option<String>,
    /// Display name, when the export had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name:        Option<String>,
}

/// A mapping from generated student ids to identity details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    /// When the roster was created.
    pub created:  String,
    /// Where the responses came from.
    pub source:   String,
    /// Students in creation order.
    pub students: IndexMap<String, StudentEntry>,
}

/// Formats the 1-based `index` as a student id, e.g. `s001`.
pub fn generate_student_id(index: usize) -> String {
    format!("s{index:03}")
}

/// Builds a roster from a form export.
///
/// Accepts `{"responses": [...]}` or a bare array of response objects.
/// Students are numbered from 1 in export order.
pub fn create_roster_from_responses(raw: &Value, source: &str) -> Roster {
    let responses = match raw {
        Value::Array(items) => items.as_slice(),
        Value::Object(object) => object
            .get("responses")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };

    let students = responses
        .iter()
        .enumerate()
        .map(|(i, response)| {
            let position = i + 1;
            let entry = match response.as_object() {
                Some(object) => StudentEntry {
                    email:       STUDENT_EMAIL.present_text(object).unwrap_or_else(|| {
                        tracing::debug!(
                            field = STUDENT_EMAIL.name(),
                            position,
                            "no value found, using placeholder"
                        );
                        format!("student{position}@unknown")
                    }),
                    response_id: RESPONSE_ID.present_text(object),
                    name:        STUDENT_NAME.present_text(object),
                },
                None => StudentEntry {
                    email:       format!("student{position}@unknown"),
                    response_id: None,
                    name:        None,
                },
            };
            (generate_student_id(position), entry)
        })
        .collect();

    Roster {
        created: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        source: source.to_string(),
        students,
    }
}

/// Returns true for paths that should be stored as YAML.
fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

impl Roster {
    /// Reads a form export from disk and builds a roster from it.
    pub fn create(responses_path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = responses_path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: Value = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            document: path.display().to_string(),
            source,
        })?;
        Ok(create_roster_from_responses(&raw, &path.display().to_string()))
    }

    /// Loads a roster; `.yaml`/`.yml` files are read as YAML, anything else
    /// as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let document = path.display().to_string();

        if is_yaml(path) {
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml { document, source })
        } else {
            serde_json::from_str(&text).map_err(|source| ConfigError::Json { document, source })
        }
    }

    /// Saves the roster, picking the format from the extension as
    /// [`Roster::load`] does.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let document = path.display().to_string();

        let text = if is_yaml(path) {
            serde_yaml::to_string(self).map_err(|source| ConfigError::Yaml { document, source })?
        } else {
            serde_json::to_string_pretty(self)
                .map_err(|source| ConfigError::Json { document, source })?
        };

        std::fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Looks up a student by id.
    pub fn lookup_by_id(&self, student_id: &str) -> Option<&StudentEntry> {
        self.students.get(student_id)
    }

    /// Looks up a student by email, ignoring case.
    pub fn lookup_by_email(&self, email: &str) -> Option<(&str, &StudentEntry)> {
        let email = email.to_lowercase();
        self.students
            .iter()
            .find(|(_, entry)| entry.email.to_lowercase() == email)
            .map(|(id, entry)| (id.as_str(), entry))
    }

    /// All students in roster order.
    pub fn list_students(&self) -> Vec<(&str, &StudentEntry)> {
        self.students
            .iter()
            .map(|(id, entry)| (id.as_str(), entry))
            .collect()
    }

    /// Renders the roster as a table of id, email and name.
    pub fn table(&self) -> String {
        let rows = self.list_students().into_iter().map(|(id, entry)| RosterRow {
            id:    id.to_string(),
            email: truncate(&entry.email, 28),
            name:  truncate(entry.name.as_deref().unwrap_or("N/A"), 18),
        });
        Table::new(rows).with(Style::psql()).to_string()
    }
}

/// A display row for [`Roster::table`].
#[derive(Tabled)]
struct RosterRow {
    /// Student id.
    #[tabled(rename = "ID")]
    id:    String,
    /// Email, truncated.
    #[tabled(rename = "Email")]
    email: String,
    /// Name, truncated.
    #[tabled(rename = "Name")]
    name:  String,
}

/// Cuts `text` to at most `max` characters.
fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
