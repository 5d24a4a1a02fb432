use regqa_domain::types::{FusedCandidate, Judgment};

use crate::{FailureClass, RegqaService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JudgeFailurePolicy {
	/// Favor availability: answer anyway at reduced consistency.
	AssumeAnswerable,
	/// Favor precision: refuse when the judge cannot be reached.
	AssumeUnanswerable,
}
impl JudgeFailurePolicy {
	pub(crate) fn from_config(raw: &str) -> Self {
		match raw {
			"assume_unanswerable" => Self::AssumeUnanswerable,
			_ => Self::AssumeAnswerable,
		}
	}
}

/// Decide whether the retrieved context can support an answer at all. Empty
/// context refuses immediately without an external call; a judge failure
/// falls back to the configured policy.
pub(crate) async fn check(
	service: &RegqaService,
	query: &str,
	contexts: &[FusedCandidate],
) -> Judgment {
	if contexts.is_empty() {
		return Judgment {
			can_answer: false,
			reason: "No supporting context was retrieved.".to_string(),
			consistency: 0.0,
		};
	}

	let texts: Vec<String> =
		contexts.iter().map(|context| context.candidate.text.clone()).collect();

	match service
		.providers
		.judge
		.check_answerability(&service.cfg.providers.judge, query, &texts)
		.await
	{
		Ok(judgment) => judgment,
		Err(err) => {
			let policy = JudgeFailurePolicy::from_config(&service.cfg.gate.on_judge_failure);

			tracing::warn!(
				failure = FailureClass::JudgeFailure.as_str(),
				error = %err,
				policy = ?policy,
				"Answerability judge failed; applying fallback policy."
			);

			match policy {
				JudgeFailurePolicy::AssumeAnswerable => Judgment {
					can_answer: true,
					reason: "Answerability check unavailable; proceeding.".to_string(),
					consistency: service.cfg.gate.failure_consistency,
				},
				JudgeFailurePolicy::AssumeUnanswerable => Judgment {
					can_answer: false,
					reason: "Answerability check unavailable.".to_string(),
					consistency: 0.0,
				},
			}
		},
	}
}
