use std::{cmp::Ordering, collections::HashMap};

use uuid::Uuid;

use crate::types::{CandidateResult, FusedCandidate};

#[derive(Debug, Clone, Copy)]
pub struct FusionWeights {
	pub vector: f32,
	pub keyword: f32,
	/// RRF smoothing constant. Higher values flatten the influence of the
	/// top ranks of any single list.
	pub k: u32,
}

impl Default for FusionWeights {
	fn default() -> Self {
		Self { vector: 0.7, keyword: 0.3, k: 60 }
	}
}

/// Merge two rank-ordered candidate lists (best first) with weighted
/// Reciprocal Rank Fusion: each list contributes `weight / (k + rank + 1)`
/// per chunk, summed across lists. Display fields come from the first list
/// that produced the chunk, vector taking priority on collision. Ties break
/// on source count, then chunk id, so the output is deterministic.
pub fn fuse(
	vector: Vec<CandidateResult>,
	keyword: Vec<CandidateResult>,
	weights: &FusionWeights,
) -> Vec<FusedCandidate> {
	let mut by_chunk: HashMap<Uuid, FusedCandidate> = HashMap::new();

	for (list, weight) in [(vector, weights.vector), (keyword, weights.keyword)] {
		for (rank, candidate) in list.into_iter().enumerate() {
			let contribution = weight / (weights.k as f32 + rank as f32 + 1.0);

			match by_chunk.get_mut(&candidate.chunk_id) {
				Some(existing) => {
					existing.score += contribution;
					existing.sources = existing.sources.saturating_add(1);
				},
				None => {
					by_chunk.insert(
						candidate.chunk_id,
						FusedCandidate { candidate, score: contribution, sources: 1 },
					);
				},
			}
		}
	}

	let mut fused: Vec<FusedCandidate> = by_chunk.into_values().collect();

	sort_fused(&mut fused);

	fused
}

/// Re-normalize fused scores, drop everything below `threshold`, and truncate
/// to `top_k`. Returning fewer than `top_k` candidates is not an error.
pub fn threshold_filter(
	mut fused: Vec<FusedCandidate>,
	threshold: f32,
	top_k: usize,
) -> Vec<FusedCandidate> {
	crate::normalize::min_max_normalize_fused(&mut fused);

	fused.retain(|candidate| candidate.score >= threshold);

	sort_fused(&mut fused);

	fused.truncate(top_k);

	fused
}

pub fn sort_fused(fused: &mut [FusedCandidate]) {
	fused.sort_by(|left, right| {
		cmp_f32_desc(left.score, right.score)
			.then_with(|| right.sources.cmp(&left.sources))
			.then_with(|| left.candidate.chunk_id.cmp(&right.candidate.chunk_id))
	});
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn candidate(chunk: u128, score: f32) -> CandidateResult {
		CandidateResult {
			chunk_id: Uuid::from_u128(chunk),
			document_id: Uuid::from_u128(chunk),
			document_title: format!("doc-{chunk}"),
			text: format!("text-{chunk}"),
			score,
			published_at: None,
			url: None,
			provenance: None,
			metadata: serde_json::Value::Null,
		}
	}

	#[test]
	fn dual_presence_outranks_single_presence() {
		// Vector: c1 > c2. Keyword: c2 > c3. c2 must win on dual presence.
		let vector = vec![candidate(1, 0.9), candidate(2, 0.5)];
		let keyword = vec![candidate(2, 0.8), candidate(3, 0.4)];
		let fused = fuse(vector, keyword, &FusionWeights::default());
		let order: Vec<Uuid> = fused.iter().map(|f| f.candidate.chunk_id).collect();

		assert_eq!(
			order,
			vec![Uuid::from_u128(2), Uuid::from_u128(1), Uuid::from_u128(3)]
		);
		assert_eq!(fused[0].sources, 2);
	}

	#[test]
	fn earlier_rank_never_scores_lower() {
		let vector = vec![candidate(1, 0.9), candidate(2, 0.8), candidate(3, 0.7)];
		let fused = fuse(vector, Vec::new(), &FusionWeights::default());

		for pair in fused.windows(2) {
			assert!(pair[0].score >= pair[1].score);
		}
	}

	#[test]
	fn vector_list_supplies_display_fields_on_collision() {
		let mut from_vector = candidate(7, 0.9);

		from_vector.document_title = "vector title".to_string();

		let mut from_keyword = candidate(7, 0.8);

		from_keyword.document_title = "keyword title".to_string();

		let fused = fuse(vec![from_vector], vec![from_keyword], &FusionWeights::default());

		assert_eq!(fused.len(), 1);
		assert_eq!(fused[0].candidate.document_title, "vector title");
	}

	#[test]
	fn fusion_is_deterministic_for_identical_inputs() {
		let build = || {
			(
				vec![candidate(1, 0.9), candidate(2, 0.5), candidate(3, 0.3)],
				vec![candidate(4, 0.8), candidate(5, 0.4)],
			)
		};
		let (vector_a, keyword_a) = build();
		let (vector_b, keyword_b) = build();
		let fused_a = fuse(vector_a, keyword_a, &FusionWeights::default());
		let fused_b = fuse(vector_b, keyword_b, &FusionWeights::default());
		let ids_a: Vec<Uuid> = fused_a.iter().map(|f| f.candidate.chunk_id).collect();
		let ids_b: Vec<Uuid> = fused_b.iter().map(|f| f.candidate.chunk_id).collect();

		assert_eq!(ids_a, ids_b);
	}

	#[test]
	fn threshold_filter_keeps_subset_in_descending_order() {
		let vector = (1..=6).map(|i| candidate(i, 1.0 - i as f32 * 0.1)).collect();
		let fused = fuse(vector, Vec::new(), &FusionWeights::default());
		let filtered = threshold_filter(fused.clone(), 0.3, 4);

		assert!(filtered.len() <= 4);

		for item in &filtered {
			assert!(item.score >= 0.3);
			assert!(fused.iter().any(|f| f.candidate.chunk_id == item.candidate.chunk_id));
		}
		for pair in filtered.windows(2) {
			assert!(pair[0].score >= pair[1].score);
		}
	}

	#[test]
	fn threshold_filter_returns_fewer_than_top_k_without_error() {
		let fused = fuse(vec![candidate(1, 0.9)], Vec::new(), &FusionWeights::default());
		let filtered = threshold_filter(fused, 0.3, 10);

		assert_eq!(filtered.len(), 1);
	}
}
