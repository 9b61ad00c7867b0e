//! # quizgrade
//!
//! Bulk grading of free-text quiz answers. Judgment is delegated to an
//! LLM; prompt construction, result extraction and failure handling stay
//! deterministic and local.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// The external grading capability and its OpenAI-compatible client
pub mod capability;
/// Environment-driven configuration
pub mod config;
/// Context and response documents
pub mod context;
/// Prompt-only runs
pub mod dry_run;
/// Error types
pub mod error;
/// Recovering JSON from model output
pub mod extract;
/// Ordered field-name fallbacks for loosely shaped documents
pub mod fields;
/// For all things related to grading
pub mod grade;
/// Prompt construction
pub mod prompt;
/// Per-pair results and the grade map
pub mod results;
/// Student rosters
pub mod roster;

pub use capability::{GradingCapability, OpenAiCapability};
pub use config::GraderConfig;
pub use context::{Context, ResponseSet};
pub use dry_run::{DryRunReport, dry_run};
pub use error::{CapabilityError, ConfigError};
pub use extract::{Extracted, extract};
pub use grade::Grader;
pub use results::{GradeMap, GradeResult};
