use regqa_cache::CachedAnswer;
use regqa_domain::{
	fusion::{self, FusionWeights},
	grounding, normalize,
	types::{AnswerResult, GroundingReport},
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	FailureClass, Filters, RegqaService, ServiceError, ServiceResult, citation, gate, retrieval,
};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnswerRequest {
	pub query: String,
	#[serde(default)]
	pub filters: Filters,
	pub top_k: Option<u32>,
	pub bypass_cache: Option<bool>,
}

/// Outcome of one verification round over a generated answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VerifyState {
	Checking { round: u32 },
	Passed,
	/// The round budget ran out; the best attempt ships as-is.
	ForcedPass,
}

pub(crate) fn next_verify_state(state: VerifyState, passed: bool, max_rounds: u32) -> VerifyState {
	match state {
		VerifyState::Checking { .. } if passed => VerifyState::Passed,
		VerifyState::Checking { round } if round >= max_rounds => VerifyState::ForcedPass,
		VerifyState::Checking { round } => VerifyState::Checking { round: round + 1 },
		terminal => terminal,
	}
}

impl RegqaService {
	/// Answer a natural-language question over the regulatory corpus.
	///
	/// The pipeline: cache lookup, query embedding, concurrent vector and
	/// keyword retrieval, per-list normalization, weighted RRF fusion,
	/// threshold filtering, pairwise reranking, answerability gate,
	/// generation with a bounded verification loop, grounding scoring, and
	/// citation assembly. Collaborator failures degrade per their fail-open
	/// policies; only an invalid request is an error.
	pub async fn answer(&self, request: AnswerRequest) -> ServiceResult<AnswerResult> {
		let query = request.query.trim().to_string();

		if query.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "query must be non-empty.".to_string(),
			});
		}
		if request.top_k == Some(0) {
			return Err(ServiceError::InvalidRequest {
				message: "top_k must be greater than zero.".to_string(),
			});
		}

		let trace_id = Uuid::new_v4();
		let top_k = request
			.top_k
			.unwrap_or(self.cfg.retrieval.top_k)
			.min(self.cfg.retrieval.candidate_k) as usize;
		let bypass_cache = request.bypass_cache.unwrap_or(false);

		if !bypass_cache
			&& let Some(cached) = self.cache.get(&query, &request.filters).await
		{
			let mut result = cached.result;

			result.trace_id = trace_id;

			return Ok(result);
		}

		let lists = retrieval::gather(self, &query, &request.filters).await;

		if lists.vector_failed && lists.keyword_failed {
			return Ok(citation::no_evidence_result(trace_id));
		}

		let mut vector = lists.vector;
		let mut keyword = lists.keyword;

		normalize::min_max_normalize(&mut vector);
		normalize::min_max_normalize(&mut keyword);

		let weights = FusionWeights {
			vector: self.cfg.retrieval.vector_weight,
			keyword: self.cfg.retrieval.keyword_weight,
			k: self.cfg.retrieval.rrf_k,
		};
		let fused = fusion::fuse(vector, keyword, &weights);
		let filtered =
			fusion::threshold_filter(fused, self.cfg.retrieval.similarity_threshold, top_k);
		let contexts = retrieval::rerank_contexts(self, &query, filtered, top_k).await;
		let judgment = gate::check(self, &query, &contexts).await;

		if !judgment.can_answer {
			return Ok(citation::refusal_result(trace_id, judgment.reason));
		}

		let context_texts: Vec<String> =
			contexts.iter().map(|context| context.candidate.text.clone()).collect();
		let mut best: Option<(String, GroundingReport)> = None;
		let mut state = VerifyState::Checking { round: 1 };

		while let VerifyState::Checking { round } = state {
			let answer_text = match self
				.providers
				.generator
				.answer(&self.cfg.providers.generator, &query, &context_texts)
				.await
			{
				Ok(text) => text,
				Err(err) => {
					tracing::warn!(
						failure = FailureClass::GenerationFailure.as_str(),
						trace_id = %trace_id,
						error = %err,
						"Answer generation failed."
					);

					return Ok(citation::apology_result(trace_id));
				},
			};
			let report =
				grounding::score_grounding(&answer_text, &contexts, judgment.consistency);
			let passed = !report.hallucination_flag
				|| report.confidence >= self.cfg.answer.min_confidence_for_pass;
			let improved = best
				.as_ref()
				.map(|(_, best_report)| report.confidence > best_report.confidence)
				.unwrap_or(true);

			if improved {
				best = Some((answer_text, report));
			}
			if !passed {
				tracing::info!(
					trace_id = %trace_id,
					round,
					"Answer flagged for hallucination; regenerating."
				);
			}

			state = next_verify_state(state, passed, self.cfg.answer.max_verify_rounds);
		}

		let Some((answer_text, report)) = best else {
			return Ok(citation::apology_result(trace_id));
		};

		if state == VerifyState::ForcedPass {
			tracing::info!(trace_id = %trace_id, "Verification budget exhausted; forced pass.");
		}

		let citations = citation::assemble(
			&contexts,
			&answer_text,
			self.cfg.answer.snippet_max_chars as usize,
		);
		let uncertainty_note = report.hallucination_flag.then(|| {
			"Some statements could not be fully verified against the cited sources.".to_string()
		});
		let result = AnswerResult {
			answer: answer_text,
			citations,
			confidence: report.confidence / 100.0,
			groundedness: report.groundedness / 100.0,
			citation_coverage: report.citation_coverage,
			hallucination_flag: report.hallucination_flag,
			answerable: true,
			uncertainty_note,
			trace_id,
		};

		tracing::info!(
			trace_id = %trace_id,
			contexts = result.citations.len(),
			confidence = result.confidence,
			groundedness = result.groundedness,
			"Answer pipeline complete."
		);

		if !bypass_cache {
			let mut document_ids: Vec<Uuid> =
				result.citations.iter().map(|citation| citation.document_id).collect();

			document_ids.sort_unstable();
			document_ids.dedup();

			let cached = CachedAnswer {
				result: result.clone(),
				document_ids,
				stored_at: OffsetDateTime::now_utc(),
			};

			self.cache.store(&query, &request.filters, &cached).await;
		}

		Ok(result)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn passing_round_terminates() {
		let state = next_verify_state(VerifyState::Checking { round: 1 }, true, 3);

		assert_eq!(state, VerifyState::Passed);
	}

	#[test]
	fn failing_rounds_advance_then_force_pass() {
		let mut state = VerifyState::Checking { round: 1 };

		state = next_verify_state(state, false, 2);

		assert_eq!(state, VerifyState::Checking { round: 2 });

		state = next_verify_state(state, false, 2);

		assert_eq!(state, VerifyState::ForcedPass);
	}

	#[test]
	fn terminal_states_are_absorbing() {
		assert_eq!(next_verify_state(VerifyState::Passed, false, 2), VerifyState::Passed);
		assert_eq!(next_verify_state(VerifyState::ForcedPass, true, 2), VerifyState::ForcedPass);
	}
}
