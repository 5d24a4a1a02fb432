use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// One retrieval hit from either candidate source. `score` is on the
/// backend's own scale until normalization rescales it to [0, 1].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CandidateResult {
	pub chunk_id: Uuid,
	pub document_id: Uuid,
	pub document_title: String,
	pub text: String,
	pub score: f32,
	#[serde(with = "time::serde::rfc3339::option")]
	pub published_at: Option<OffsetDateTime>,
	pub url: Option<String>,
	/// How the source text was extracted, e.g. "pdf_text" or "html_main".
	pub provenance: Option<String>,
	#[serde(default)]
	pub metadata: Value,
}

/// A candidate after rank fusion. Display fields come from whichever source
/// list produced the chunk first; `score` starts as the RRF accumulator and
/// is later overwritten by re-normalization and reranking.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FusedCandidate {
	pub candidate: CandidateResult,
	pub score: f32,
	/// How many source lists contained this chunk.
	pub sources: u8,
}

/// Verdict of the answerability gate.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Judgment {
	pub can_answer: bool,
	pub reason: String,
	pub consistency: f32,
}

/// Sub-scores and the final (groundedness, confidence) pair computed over a
/// generated answer and the context it was generated from. `groundedness`,
/// `uncertainty_penalty`, and `confidence` live on a 0-100 scale; everything
/// else is in [0, 1].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GroundingReport {
	pub citation_coverage: f32,
	pub evidence_strength: f32,
	pub sentence_grounding: f32,
	pub hallucination_ratio: f32,
	pub groundedness: f32,
	pub uncertainty_penalty: f32,
	pub confidence: f32,
	pub hallucination_flag: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Citation {
	/// 1-based context position, stable for the lifetime of one request only.
	pub index: u32,
	pub chunk_id: Uuid,
	pub document_id: Uuid,
	pub title: String,
	#[serde(with = "time::serde::rfc3339::option")]
	pub published_at: Option<OffsetDateTime>,
	pub url: Option<String>,
	pub snippet: String,
	pub provenance: Option<String>,
}

/// Final pipeline output. Scores are scaled to [0, 1] at this boundary.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnswerResult {
	pub answer: String,
	pub citations: Vec<Citation>,
	pub confidence: f32,
	pub groundedness: f32,
	pub citation_coverage: f32,
	pub hallucination_flag: bool,
	pub answerable: bool,
	pub uncertainty_note: Option<String>,
	pub trace_id: Uuid,
}
