use regqa_domain::{
	fusion::{self, FusionWeights},
	grounding, normalize, text,
	types::CandidateResult,
};
use uuid::Uuid;

fn candidate(chunk: u128, score: f32, body: &str) -> CandidateResult {
	CandidateResult {
		chunk_id: Uuid::from_u128(chunk),
		document_id: Uuid::from_u128(100 + chunk),
		document_title: format!("Regulation {chunk}"),
		text: body.to_string(),
		score,
		published_at: None,
		url: Some(format!("https://law.example/{chunk}")),
		provenance: Some("pdf_text".to_string()),
		metadata: serde_json::Value::Null,
	}
}

#[test]
fn normalize_fuse_filter_score_chain() {
	let mut vector = vec![
		candidate(1, 12.0, "기준금리를 3.5%로 인상하였다"),
		candidate(2, 7.0, "은행법 제34조는 자본 요건을 정한다"),
		candidate(3, 1.0, "공시 의무에 관한 조항"),
	];
	let mut keyword = vec![
		candidate(2, 0.8, "은행법 제34조는 자본 요건을 정한다"),
		candidate(4, 0.2, "약관 변경 신고 절차"),
	];

	normalize::min_max_normalize(&mut vector);
	normalize::min_max_normalize(&mut keyword);

	assert_eq!(vector[0].score, 1.0);
	assert_eq!(vector[2].score, 0.0);

	let fused = fusion::fuse(vector, keyword, &FusionWeights::default());

	// Chunk 2 sits in both lists and must outrank the single-source chunk 1.
	assert_eq!(fused[0].candidate.chunk_id, Uuid::from_u128(2));
	assert_eq!(fused[0].sources, 2);

	let contexts = fusion::threshold_filter(fused, 0.3, 2);

	assert!(contexts.len() <= 2);

	let report = grounding::score_grounding(
		"은행법 제34조에 따라 자본 요건이 적용됩니다 [1]",
		&contexts,
		0.9,
	);

	assert!(report.citation_coverage > 0.0);
	assert!(report.hallucination_ratio < 0.1);
	assert!(report.groundedness > 50.0);
	assert!(!report.hallucination_flag);
}

#[test]
fn rrf_rank_improvement_is_monotone() {
	let weights = FusionWeights::default();
	let back = fusion::fuse(
		vec![candidate(9, 0.5, "a"), candidate(1, 0.4, "b")],
		Vec::new(),
		&weights,
	);
	let front = fusion::fuse(
		vec![candidate(1, 0.5, "b"), candidate(9, 0.4, "a")],
		Vec::new(),
		&weights,
	);
	let score_at = |fused: &[regqa_domain::types::FusedCandidate], chunk: u128| {
		fused
			.iter()
			.find(|f| f.candidate.chunk_id == Uuid::from_u128(chunk))
			.map(|f| f.score)
			.expect("chunk missing from fusion output")
	};

	assert!(score_at(&front, 1) >= score_at(&back, 1));
}

#[test]
fn truncation_feeds_rerank_budget() {
	let long_text = "조항 ".repeat(2_000);
	let truncated = text::truncate_chars(&long_text, 1_600);

	assert_eq!(truncated.chars().count(), 1_600);
	assert!(long_text.starts_with(&truncated));
}
