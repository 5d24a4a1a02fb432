use regqa_domain::{
	grounding, text,
	types::{AnswerResult, Citation, FusedCandidate},
};
use uuid::Uuid;

pub(crate) const APOLOGY_ANSWER: &str =
	"We were unable to generate an answer for this question. Please try again.";
pub(crate) const NO_EVIDENCE_ANSWER: &str =
	"No supporting evidence could be retrieved for this question.";
pub(crate) const REFUSAL_ANSWER: &str =
	"The retrieved documents do not sufficiently support an answer to this question.";

/// Map the contexts the generator actually cited back to source records.
/// When the answer carries no markers at all, every supplied context is
/// listed so the caller can still see what the answer was based on.
pub(crate) fn assemble(
	contexts: &[FusedCandidate],
	answer: &str,
	snippet_max_chars: usize,
) -> Vec<Citation> {
	let cited = grounding::cited_indices(answer);
	let indices: Vec<u32> = if cited.is_empty() {
		(1..=contexts.len() as u32).collect()
	} else {
		cited.into_iter().filter(|index| *index as usize <= contexts.len()).collect()
	};

	indices
		.into_iter()
		.map(|index| {
			let context = &contexts[index as usize - 1];

			Citation {
				index,
				chunk_id: context.candidate.chunk_id,
				document_id: context.candidate.document_id,
				title: context.candidate.document_title.clone(),
				published_at: context.candidate.published_at,
				url: context.candidate.url.clone(),
				snippet: text::truncate_chars(&context.candidate.text, snippet_max_chars),
				provenance: context.candidate.provenance.clone(),
			}
		})
		.collect()
}

pub(crate) fn no_evidence_result(trace_id: Uuid) -> AnswerResult {
	unanswerable(
		trace_id,
		NO_EVIDENCE_ANSWER,
		Some("Both retrieval sources were unavailable.".to_string()),
	)
}

pub(crate) fn refusal_result(trace_id: Uuid, reason: String) -> AnswerResult {
	unanswerable(trace_id, REFUSAL_ANSWER, Some(reason))
}

pub(crate) fn apology_result(trace_id: Uuid) -> AnswerResult {
	unanswerable(trace_id, APOLOGY_ANSWER, None)
}

fn unanswerable(trace_id: Uuid, answer: &str, uncertainty_note: Option<String>) -> AnswerResult {
	AnswerResult {
		answer: answer.to_string(),
		citations: Vec::new(),
		confidence: 0.0,
		groundedness: 0.0,
		citation_coverage: 0.0,
		hallucination_flag: false,
		answerable: false,
		uncertainty_note,
		trace_id,
	}
}

#[cfg(test)]
mod tests {
	use regqa_domain::types::CandidateResult;

	use super::*;

	fn context(chunk: u128, body: &str) -> FusedCandidate {
		FusedCandidate {
			candidate: CandidateResult {
				chunk_id: Uuid::from_u128(chunk),
				document_id: Uuid::from_u128(100 + chunk),
				document_title: format!("Rulebook {chunk}"),
				text: body.to_string(),
				score: 0.9,
				published_at: None,
				url: Some("https://law.example/doc".to_string()),
				provenance: Some("pdf_text".to_string()),
				metadata: serde_json::Value::Null,
			},
			score: 0.9,
			sources: 2,
		}
	}

	#[test]
	fn maps_cited_indices_to_sources() {
		let contexts = vec![context(1, "first"), context(2, "second"), context(3, "third")];
		let citations = assemble(&contexts, "Claim [1] and claim [3].", 100);
		let indices: Vec<u32> = citations.iter().map(|citation| citation.index).collect();

		assert_eq!(indices, vec![1, 3]);
		assert_eq!(citations[1].chunk_id, Uuid::from_u128(3));
	}

	#[test]
	fn uncited_answer_lists_every_context() {
		let contexts = vec![context(1, "first"), context(2, "second")];
		let citations = assemble(&contexts, "No markers here.", 100);

		assert_eq!(citations.len(), 2);
	}

	#[test]
	fn out_of_range_markers_are_dropped() {
		let contexts = vec![context(1, "first")];
		let citations = assemble(&contexts, "Claim [1] and bogus [7].", 100);

		assert_eq!(citations.len(), 1);
	}

	#[test]
	fn snippets_are_truncated() {
		let contexts = vec![context(1, &"조항 ".repeat(500))];
		let citations = assemble(&contexts, "Claim [1].", 40);

		assert_eq!(citations[0].snippet.chars().count(), 40);
	}
}
