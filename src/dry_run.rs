#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Prompt-only grading runs.
//!
//! A dry run builds every prompt a real run would send, but never touches
//! the grading capability. The resulting [`GradeMap`] has the same shape as
//! a real one.

use std::fmt::{self, Display};

use crate::{
    context::{Context, ResponseSet},
    grade::assemble,
    prompt::{build_system_prompt, build_user_prompt},
    results::{GradeMap, GradeResult},
};

/// Feedback placed in every dry-run result.
pub const DRY_RUN_FEEDBACK: &str = "[DRY RUN - no actual grading performed]";

/// One user prompt that a real run would have sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunPrompt {
    /// Student the answer belongs to.
    pub student_id:  String,
    /// Question index.
    pub index:       i128,
    /// Fully built user prompt.
    pub user_prompt: String,
}

/// Everything a dry run produced.
#[derive(Debug, Clone)]
pub struct DryRunReport {
    /// The shared system prompt.
    pub system_prompt: String,
    /// User prompts in grading order.
    pub prompts:       Vec<DryRunPrompt>,
    /// Placeholder grades for every pair.
    pub grades:        GradeMap,
}

/// Builds all prompts for `responses` and placeholder grades for each pair.
pub fn dry_run(context: &Context, responses: &ResponseSet) -> DryRunReport {
    let system_prompt = build_system_prompt(context);
    let mut prompts = Vec::with_capacity(responses.answer_count());

    let outcomes = responses
        .answers()
        .map(|answer| {
            let question = context.quiz.question(answer.index);
            prompts.push(DryRunPrompt {
                student_id:  answer.student_id.to_string(),
                index:       answer.index,
                user_prompt: build_user_prompt(&question, answer.text),
            });
            (answer, GradeResult::DryRun)
        })
        .collect::<Vec<_>>();

    let grades = assemble(responses, outcomes);
    tracing::info!(prompts = prompts.len(), "dry run complete, no grading calls made");

    DryRunReport {
        system_prompt,
        prompts,
        grades,
    }
}

impl Display for DryRunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(40);
        writeln!(f, "\nSYSTEM PROMPT:")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "{}", self.system_prompt)?;
        writeln!(f, "{rule}")?;

        for prompt in &self.prompts {
            writeln!(
                f,
                "\n[Student: {}, Question: {}]",
                prompt.student_id, prompt.index
            )?;
            writeln!(f, "USER PROMPT:")?;
            writeln!(f, "{}", prompt.user_prompt)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_every_prompt_in_order() {
        let responses = ResponseSet::from_json_str(r#"{"s002": {"1": "b", "0": "a"}, "s001": {"0": "c"}}"#)
            .expect("responses");
        let report = dry_run(&Context::default(), &responses);

        let order: Vec<_> = report
            .prompts
            .iter()
            .map(|p| (p.student_id.as_str(), p.index))
            .collect();
        assert_eq!(order, [("s002", 0), ("s002", 1), ("s001", 0)]);

        let rendered = report.to_string();
        assert!(rendered.contains("SYSTEM PROMPT:"));
        assert!(rendered.contains("[Student: s001, Question: 0]\nUSER PROMPT:\n"));
    }
}
