#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Error types shared across the crate.
//!
//! Only [`ConfigError`] ever aborts a run. [`CapabilityError`] is raised by a
//! grading capability and is absorbed per pair by the grader.

use std::{path::PathBuf, time::Duration};

use async_openai::error::OpenAIError;
use thiserror::Error;

/// Malformed or missing input. Fatal, raised before any grading call.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An input file could not be read.
    #[error("could not read {}", path.display())]
    Read {
        /// File that failed to load.
        path:   PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// An output file could not be written.
    #[error("could not write {}", path.display())]
    Write {
        /// File that failed to save.
        path:   PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// A document was not valid JSON, or had the wrong shape.
    #[error("{document} is not a valid JSON document")]
    Json {
        /// Which document failed, e.g. `context` or a file path.
        document: String,
        /// Underlying parse failure.
        #[source]
        source:   serde_json::Error,
    },
    /// A document was not valid YAML, or had the wrong shape.
    #[error("{document} is not a valid YAML document")]
    Yaml {
        /// Which document failed.
        document: String,
        /// Underlying parse failure.
        #[source]
        source:   serde_yaml::Error,
    },
    /// A question index in the responses could not be read as an integer.
    #[error("student `{student}` has question index `{index}`, which is not an integer")]
    QuestionIndex {
        /// Student the answer belongs to.
        student: String,
        /// Offending index as written.
        index:   String,
    },
    /// Two indices of one student normalize to the same question.
    #[error("student `{student}` answers question {index} more than once")]
    DuplicateIndex {
        /// Student the answers belong to.
        student: String,
        /// Normalized question index.
        index:   i128,
    },
    /// A live run was requested without credentials.
    #[error("no API key configured; set OPENAI_API_KEY or ANTHROPIC_API_KEY")]
    MissingApiKey,
    /// The HTTP client for the grading capability could not be built.
    #[error("failed to construct HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

/// A single grading call failed.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The API rejected the request or the transport failed.
    #[error("{0}")]
    Api(#[from] OpenAIError),
    /// No response arrived within the configured deadline.
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// The API answered without any text content.
    #[error("response contained no text content")]
    EmptyResponse,
    /// Any other failure reported by a capability implementation.
    #[error("{0}")]
    Other(String),
}
