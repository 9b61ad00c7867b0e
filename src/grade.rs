#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The grading loop.
//!
//! Every (student, question) pair walks `Pending -> Prompted -> Graded` or
//! `Pending -> Prompted -> Failed`. A failure stays with its pair; the run
//! always returns a complete [`GradeMap`].

use std::sync::Arc;

use futures::{StreamExt, stream};
use indexmap::IndexMap;
use tracing::{info, warn};
use typed_builder::TypedBuilder;

use crate::{
    capability::GradingCapability,
    context::{Answer, Context, ResponseSet},
    extract::extract,
    prompt::{build_system_prompt, build_user_prompt},
    results::{GradeMap, GradeResult},
};

/// Where a single pair is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PairState {
    /// Nothing done yet.
    Pending,
    /// Question resolved and user prompt built.
    Prompted {
        /// Prompt for this answer.
        user_prompt: String,
    },
    /// The capability answered.
    Graded(GradeResult),
    /// The capability call failed.
    Failed(GradeResult),
}

impl PairState {
    /// True for `Graded` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PairState::Graded(_) | PairState::Failed(_))
    }

    /// Moves a pending pair to `Prompted`, substituting a placeholder for
    /// questions the quiz no longer has.
    fn prompt(context: &Context, answer: &Answer<'_>) -> Self {
        let question = context.quiz.question(answer.index);
        PairState::Prompted {
            user_prompt: build_user_prompt(&question, answer.text),
        }
    }
}

/// Grades response sets through a [`GradingCapability`].
#[derive(Clone, TypedBuilder)]
pub struct Grader {
    /// Service that performs the actual grading.
    capability:  Arc<dyn GradingCapability>,
    /// Model identifier passed to every call.
    #[builder(setter(into))]
    model:       String,
    /// Maximum number of calls in flight; zero is treated as one.
    #[builder(default = 1)]
    concurrency: usize,
}

impl Grader {
    /// Grades every answer in `responses`.
    ///
    /// Pairs are processed in response order with at most `concurrency`
    /// calls in flight. Each pair gets at most one call.
    pub async fn grade(&self, context: &Context, responses: &ResponseSet) -> GradeMap {
        let system_prompt = build_system_prompt(context);
        let system_prompt = system_prompt.as_str();

        info!(
            provider = self.capability.provider_name(),
            model = %self.model,
            students = responses.student_count(),
            answers = responses.answer_count(),
            concurrency = self.concurrency.max(1),
            "grading responses"
        );

        let outcomes: Vec<(Answer<'_>, GradeResult)> = stream::iter(responses.answers())
            .map(|answer| async move {
                let result = self.grade_answer(context, system_prompt, &answer).await;
                (answer, result)
            })
            .buffered(self.concurrency.max(1))
            .collect()
            .await;

        assemble(responses, outcomes)
    }

    /// Drives one pair to a terminal state.
    async fn grade_answer(
        &self,
        context: &Context,
        system_prompt: &str,
        answer: &Answer<'_>,
    ) -> GradeResult {
        let mut state = PairState::Pending;

        loop {
            state = match state {
                PairState::Pending => PairState::prompt(context, answer),
                PairState::Prompted { user_prompt } => {
                    match self
                        .capability
                        .complete(system_prompt, &user_prompt, &self.model)
                        .await
                    {
                        Ok(raw) => {
                            let extracted = extract(&raw);
                            if extracted.is_unparsed() {
                                warn!(
                                    student = answer.student_id,
                                    question = %answer.index,
                                    "response was not JSON, keeping raw text"
                                );
                            }
                            let result = GradeResult::graded(extracted);
                            info!(
                                student = answer.student_id,
                                question = %answer.index,
                                score = result.score(),
                                "graded"
                            );
                            PairState::Graded(result)
                        }
                        Err(e) => {
                            warn!(
                                student = answer.student_id,
                                question = %answer.index,
                                error = %e,
                                "grading call failed"
                            );
                            PairState::Failed(GradeResult::failed(e))
                        }
                    }
                }
                PairState::Graded(result) | PairState::Failed(result) => return result,
            };
        }
    }
}

/// Builds the output map: every student of `responses` gets an entry, even
/// one without answers, and results keep iteration order.
pub(crate) fn assemble<'a>(
    responses: &'a ResponseSet,
    outcomes: impl IntoIterator<Item = (Answer<'a>, GradeResult)>,
) -> GradeMap {
    let mut grades: GradeMap = responses
        .students()
        .map(|student| (student.to_string(), IndexMap::new()))
        .collect();

    for (answer, result) in outcomes {
        if let Some(per_student) = grades.get_mut(answer.student_id) {
            per_student.insert(answer.index.to_string(), result);
        }
    }

    grades
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_state_terminality() {
        assert!(!PairState::Pending.is_terminal());
        assert!(
            !PairState::Prompted {
                user_prompt: String::new()
            }
            .is_terminal()
        );
        assert!(PairState::Graded(GradeResult::DryRun).is_terminal());
        assert!(PairState::Failed(GradeResult::failed("x")).is_terminal());
    }

    #[test]
    fn prompting_uses_placeholder_for_stale_index() {
        let state = PairState::prompt(&Context::default(), &Answer {
            student_id: "s001",
            index:      3,
            text:       "answer",
        });
        match state {
            PairState::Prompted { user_prompt } => {
                assert!(user_prompt.contains("Question (unknown, max 1 points):\nQuestion 3\n"));
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn assemble_keeps_students_without_answers() {
        let responses =
            ResponseSet::from_json_str(r#"{"a": {}, "b": {"0": "x"}}"#).expect("responses");
        let outcomes = responses
            .answers()
            .map(|answer| (answer, GradeResult::DryRun))
            .collect::<Vec<_>>();
        let grades = assemble(&responses, outcomes);
        assert_eq!(grades.len(), 2);
        assert!(grades["a"].is_empty());
        assert!(grades["b"]["0"].is_dry_run());
    }
}
