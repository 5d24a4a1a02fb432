use crate::types::{CandidateResult, FusedCandidate};

/// Rescale one candidate list to [0, 1] by list-local min-max. When every raw
/// score is equal the whole list collapses to 1.0 if the shared score is
/// positive, else 0.0. Runs independently per source list before fusion, and
/// again over fused scores before threshold filtering.
pub fn min_max_normalize(results: &mut [CandidateResult]) {
	let mut scores: Vec<f32> = results.iter().map(|result| result.score).collect();

	rescale(&mut scores);

	for (result, score) in results.iter_mut().zip(scores) {
		result.score = score;
	}
}

/// Fused-list variant; fusion scores are not inherently bounded.
pub fn min_max_normalize_fused(results: &mut [FusedCandidate]) {
	let mut scores: Vec<f32> = results.iter().map(|result| result.score).collect();

	rescale(&mut scores);

	for (result, score) in results.iter_mut().zip(scores) {
		result.score = score;
	}
}

fn rescale(scores: &mut [f32]) {
	let Some(first) = scores.first().copied() else { return };
	let mut min = first;
	let mut max = first;

	for score in scores.iter().copied() {
		min = min.min(score);
		max = max.max(score);
	}

	let range = max - min;

	if range <= f32::EPSILON {
		let flat = if max > 0.0 { 1.0 } else { 0.0 };

		scores.fill(flat);

		return;
	}

	for score in scores.iter_mut() {
		*score = (*score - min) / range;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::CandidateResult;

	fn candidate(score: f32) -> CandidateResult {
		CandidateResult {
			chunk_id: uuid::Uuid::new_v4(),
			document_id: uuid::Uuid::new_v4(),
			document_title: "t".to_string(),
			text: "text".to_string(),
			score,
			published_at: None,
			url: None,
			provenance: None,
			metadata: serde_json::Value::Null,
		}
	}

	#[test]
	fn maps_extremes_to_zero_and_one() {
		let mut results = vec![candidate(0.2), candidate(0.9), candidate(0.55)];

		min_max_normalize(&mut results);

		assert_eq!(results[0].score, 0.0);
		assert_eq!(results[1].score, 1.0);
		assert!(results[2].score > 0.0 && results[2].score < 1.0);
	}

	#[test]
	fn all_equal_positive_scores_become_one() {
		let mut results = vec![candidate(0.4), candidate(0.4)];

		min_max_normalize(&mut results);

		assert!(results.iter().all(|result| result.score == 1.0));
	}

	#[test]
	fn all_equal_zero_scores_become_zero() {
		let mut results = vec![candidate(0.0), candidate(0.0)];

		min_max_normalize(&mut results);

		assert!(results.iter().all(|result| result.score == 0.0));
	}

	#[test]
	fn empty_input_is_a_no_op() {
		let mut results: Vec<CandidateResult> = Vec::new();

		min_max_normalize(&mut results);

		assert!(results.is_empty());
	}
}
