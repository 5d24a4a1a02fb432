use std::collections::{BTreeSet, HashSet};

use regex::Regex;

use crate::{
	text,
	types::{FusedCandidate, GroundingReport},
};

/// Weights of the groundedness blend, in declaration order: judge
/// consistency, evidence strength, citation coverage, sentence grounding,
/// inverted hallucination ratio.
const GROUNDEDNESS_WEIGHTS: [f32; 5] = [0.30, 0.20, 0.20, 0.15, 0.15];
const MAX_UNCERTAINTY_PENALTY: f32 = 40.0;
const MAX_GROUNDED_SENTENCES: usize = 10;
const HALLUCINATION_FLAG_THRESHOLD: f32 = 0.35;
/// Generic prose with no factual tokens is treated as low risk.
const NO_FACTS_RATIO: f32 = 0.1;
const EMPTY_CONTEXT_RATIO: f32 = 0.5;

const CITATION_MARKER: &str = r"\[(\d{1,3})\]";
const NUMERIC_TOKEN: &str = r"\d+(?:[.,]\d+)?\s?%?";
const STATUTE_PATTERNS: [&str; 3] = [
	r"제\s*\d+\s*조(?:\s*의\s*\d+)?",
	r"(?i)article\s+\d+",
	r"(?i)section\s+\d+(?:\.\d+)*",
];
const INSTITUTIONS: [&str; 13] = [
	"금융위원회",
	"금융감독원",
	"한국은행",
	"공정거래위원회",
	"예금보험공사",
	"금융결제원",
	"기획재정부",
	"국세청",
	"financial services commission",
	"financial supervisory service",
	"bank of korea",
	"fsc",
	"fss",
];

const HEDGING_PHRASES: [(&str, f32); 12] = [
	("cannot be determined", 20.0),
	("알 수 없습니다", 20.0),
	("확실하지 않", 15.0),
	("not sure", 15.0),
	("it is unclear", 10.0),
	("불분명", 10.0),
	("추정됩니다", 10.0),
	("일 수 있습니다", 10.0),
	("might be", 10.0),
	("possibly", 5.0),
	("appears to", 5.0),
	("보입니다", 5.0),
];

/// Distinct 1-based citation indices referenced by `[n]` markers.
pub fn cited_indices(answer: &str) -> BTreeSet<u32> {
	let Ok(marker) = Regex::new(CITATION_MARKER) else { return BTreeSet::new() };

	marker
		.captures_iter(answer)
		.filter_map(|capture| capture.get(1)?.as_str().parse::<u32>().ok())
		.filter(|index| *index > 0)
		.collect()
}

/// Answer text with `[n]` markers removed, so marker digits are not mistaken
/// for factual numeric tokens.
pub fn strip_citation_markers(answer: &str) -> String {
	match Regex::new(CITATION_MARKER) {
		Ok(marker) => marker.replace_all(answer, "").into_owned(),
		Err(_) => answer.to_string(),
	}
}

/// Numeric tokens plus domain entities (regulator names, statute/article
/// references) found in `text`, normalized for set comparison.
pub fn extract_factual_tokens(input: &str) -> HashSet<String> {
	let mut tokens = HashSet::new();
	let lowered = input.to_lowercase();

	if let Ok(numeric) = Regex::new(NUMERIC_TOKEN) {
		for found in numeric.find_iter(input) {
			tokens.insert(normalize_token(found.as_str()));
		}
	}

	for pattern in STATUTE_PATTERNS {
		let Ok(statute) = Regex::new(pattern) else { continue };

		for found in statute.find_iter(input) {
			tokens.insert(normalize_token(&found.as_str().to_lowercase()));
		}
	}

	for institution in INSTITUTIONS {
		if lowered.contains(institution) {
			tokens.insert(institution.to_string());
		}
	}

	tokens
}

fn normalize_token(token: &str) -> String {
	token.chars().filter(|ch| !ch.is_whitespace()).collect()
}

/// Fraction of the answer's factual tokens that cannot be traced to the
/// context, clamped to [0, 1].
pub fn hallucination_ratio(answer: &str, context_text: &str) -> f32 {
	if context_text.trim().is_empty() {
		return EMPTY_CONTEXT_RATIO;
	}

	let stripped = strip_citation_markers(answer);
	let answer_facts = extract_factual_tokens(&stripped);

	if answer_facts.is_empty() {
		return NO_FACTS_RATIO;
	}

	let context_facts = extract_factual_tokens(context_text);
	let context_lowered: String =
		context_text.to_lowercase().chars().filter(|ch| !ch.is_whitespace()).collect();
	let missing = answer_facts
		.iter()
		.filter(|token| !context_facts.contains(*token) && !context_lowered.contains(*token))
		.count();

	(missing as f32 / answer_facts.len() as f32).clamp(0.0, 1.0)
}

/// Mean grounding of the first ten answer sentences: an explicit citation
/// marker grounds a sentence outright, otherwise lexical overlap with the
/// concatenated context decides. 0.5 when the answer has no sentences.
pub fn sentence_grounding(answer: &str, context_text: &str) -> f32 {
	let sentences = text::split_sentences(answer);

	if sentences.is_empty() {
		return 0.5;
	}

	let marker = Regex::new(CITATION_MARKER).ok();
	let context_tokens = text::token_set(context_text);
	let mut total = 0.0;
	let mut counted = 0_usize;

	for sentence in sentences.iter().take(MAX_GROUNDED_SENTENCES) {
		let cited = marker.as_ref().map(|re| re.is_match(sentence)).unwrap_or(false);
		let score = if cited {
			1.0
		} else {
			match text::token_overlap(sentence, &context_tokens) {
				overlap if overlap >= 0.30 => 0.8,
				overlap if overlap >= 0.15 => 0.5,
				_ => 0.0,
			}
		};

		total += score;
		counted += 1;
	}

	total / counted as f32
}

/// Sum of fixed penalties for hedging phrases, capped at 40 points.
pub fn uncertainty_penalty(answer: &str) -> f32 {
	let lowered = answer.to_lowercase();
	let mut penalty = 0.0;

	for (phrase, points) in HEDGING_PHRASES {
		if lowered.contains(phrase) {
			penalty += points;
		}
	}

	penalty.min(MAX_UNCERTAINTY_PENALTY)
}

/// Compute the full grounding report for a generated answer against the
/// context it was generated from. `consistency` comes from the answerability
/// gate. Groundedness and confidence are on a 0-100 scale.
pub fn score_grounding(
	answer: &str,
	contexts: &[FusedCandidate],
	consistency: f32,
) -> GroundingReport {
	let cited: Vec<u32> = cited_indices(answer)
		.into_iter()
		.filter(|index| (*index as usize) <= contexts.len())
		.collect();
	let citation_coverage = if contexts.is_empty() {
		0.0
	} else {
		(cited.len() as f32 / contexts.len() as f32).min(1.0)
	};
	let evidence_strength = if cited.is_empty() {
		0.0
	} else {
		let sum: f32 = cited
			.iter()
			.map(|index| contexts[*index as usize - 1].score.clamp(0.0, 1.0))
			.sum();

		sum / cited.len() as f32
	};
	let context_text =
		contexts.iter().map(|context| context.candidate.text.as_str()).collect::<Vec<_>>().join(" ");
	let sentence_grounding = sentence_grounding(answer, &context_text);
	let hallucination_ratio = hallucination_ratio(answer, &context_text);
	let [w_consistency, w_evidence, w_coverage, w_sentence, w_hallucination] =
		GROUNDEDNESS_WEIGHTS;
	let groundedness = (100.0
		* (w_consistency * consistency.clamp(0.0, 1.0)
			+ w_evidence * evidence_strength
			+ w_coverage * citation_coverage
			+ w_sentence * sentence_grounding
			+ w_hallucination * (1.0 - hallucination_ratio)))
		.clamp(0.0, 100.0);
	let uncertainty_penalty = uncertainty_penalty(answer);
	let mut confidence = (groundedness - uncertainty_penalty).max(0.0);

	if citation_coverage >= 0.6 && hallucination_ratio < 0.1 {
		confidence = (confidence + 5.0).min(100.0);
	}

	GroundingReport {
		citation_coverage,
		evidence_strength,
		sentence_grounding,
		hallucination_ratio,
		groundedness,
		uncertainty_penalty,
		confidence,
		hallucination_flag: hallucination_ratio >= HALLUCINATION_FLAG_THRESHOLD,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::CandidateResult;

	fn context(text: &str, score: f32) -> FusedCandidate {
		FusedCandidate {
			candidate: CandidateResult {
				chunk_id: uuid::Uuid::new_v4(),
				document_id: uuid::Uuid::new_v4(),
				document_title: "title".to_string(),
				text: text.to_string(),
				score,
				published_at: None,
				url: None,
				provenance: None,
				metadata: serde_json::Value::Null,
			},
			score,
			sources: 1,
		}
	}

	#[test]
	fn parses_distinct_citation_indices() {
		let cited = cited_indices("First [1], again [1], then [3].");

		assert_eq!(cited.into_iter().collect::<Vec<_>>(), vec![1, 3]);
	}

	#[test]
	fn stripping_markers_removes_their_digits() {
		let stripped = strip_citation_markers("Rate is 3.5% [1]");

		assert!(!stripped.contains("[1]"));
		assert!(stripped.contains("3.5%"));
	}

	#[test]
	fn cited_number_present_in_context_is_not_hallucinated() {
		// Scenario: the answer cites a rate the context states verbatim.
		let ratio = hallucination_ratio("금리는 3.5%입니다 [1]", "기준금리를 3.5%로 인상하였다");

		assert_eq!(ratio, 0.0);
	}

	#[test]
	fn number_absent_from_context_is_hallucinated() {
		let ratio = hallucination_ratio("금리는 9.9%입니다", "기준금리를 3.5%로 인상하였다");

		assert!(ratio > 0.0);
	}

	#[test]
	fn statute_reference_counts_as_entity() {
		let tokens = extract_factual_tokens("은행법 제 34 조에 따라");

		assert!(tokens.contains("제34조"));
	}

	#[test]
	fn institution_counts_as_entity() {
		let tokens = extract_factual_tokens("The Financial Services Commission announced");

		assert!(tokens.contains("financial services commission"));
	}

	#[test]
	fn prose_without_facts_defaults_to_low_risk() {
		assert_eq!(hallucination_ratio("규정이 개정되었습니다", "다른 내용"), NO_FACTS_RATIO);
	}

	#[test]
	fn empty_context_defaults_to_half() {
		assert_eq!(hallucination_ratio("금리는 3.5%입니다", "  "), EMPTY_CONTEXT_RATIO);
	}

	#[test]
	fn cited_sentence_grounds_fully() {
		// Scenario C: explicit marker carries the sentence regardless of overlap.
		let grounding = sentence_grounding("금리는 3.5%입니다 [1]", "기준금리는 3.5%이다");

		assert_eq!(grounding, 1.0);
	}

	#[test]
	fn no_sentences_grounds_to_half() {
		assert_eq!(sentence_grounding("네.", "context"), 0.5);
	}

	#[test]
	fn hedging_penalty_is_capped() {
		let answer = "It is unclear, not sure, cannot be determined, possibly, might be.";

		assert_eq!(uncertainty_penalty(answer), MAX_UNCERTAINTY_PENALTY);
	}

	#[test]
	fn report_bounds_hold_for_arbitrary_inputs() {
		let cases = [
			("", Vec::new()),
			("no citations at all", vec![context("unrelated", 0.9)]),
			("fully cited [1] [2]", vec![context("a", 1.0), context("b", 0.5)]),
			("out of range [9]", vec![context("a", 1.0)]),
		];

		for (answer, contexts) in cases {
			for consistency in [0.0, 0.5, 1.0, 2.0, -1.0] {
				let report = score_grounding(answer, &contexts, consistency);

				assert!((0.0..=1.0).contains(&report.citation_coverage));
				assert!((0.0..=1.0).contains(&report.evidence_strength));
				assert!((0.0..=1.0).contains(&report.hallucination_ratio));
				assert!((0.0..=100.0).contains(&report.groundedness));
				assert!((0.0..=100.0).contains(&report.confidence));
			}
		}
	}

	#[test]
	fn full_coverage_without_hallucination_earns_bonus() {
		let contexts = vec![context("기준금리는 3.5%이다", 1.0)];
		let report = score_grounding("금리는 3.5%입니다 [1]", &contexts, 1.0);

		assert_eq!(report.citation_coverage, 1.0);
		assert!(report.hallucination_ratio < 0.1);
		assert!(!report.hallucination_flag);
		// 0.30 + 0.20 + 0.20 + 0.15 + 0.15 fully earned, plus the bonus cap.
		assert_eq!(report.groundedness, 100.0);
		assert_eq!(report.confidence, 100.0);
	}
}
