use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub gate: Gate,
	#[serde(default)]
	pub answer: Answer,
	#[serde(default)]
	pub cache: Cache,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub rerank: ProviderConfig,
	pub judge: LlmProviderConfig,
	pub generator: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Retrieval {
	/// How many candidates each source fetches before fusion.
	#[serde(default = "default_candidate_k")]
	pub candidate_k: u32,
	/// Context window size after filtering and reranking.
	#[serde(default = "default_top_k")]
	pub top_k: u32,
	#[serde(default = "default_vector_weight")]
	pub vector_weight: f32,
	#[serde(default = "default_keyword_weight")]
	pub keyword_weight: f32,
	#[serde(default = "default_rrf_k")]
	pub rrf_k: u32,
	#[serde(default = "default_similarity_threshold")]
	pub similarity_threshold: f32,
	#[serde(default = "default_source_timeout_ms")]
	pub source_timeout_ms: u64,
	/// Character budget per document sent to the pairwise scorer.
	#[serde(default = "default_rerank_doc_max_chars")]
	pub rerank_doc_max_chars: u32,
}

#[derive(Debug, Deserialize)]
pub struct Gate {
	/// Policy when the answerability judge itself fails: "assume_answerable"
	/// trades precision for availability, "assume_unanswerable" the reverse.
	#[serde(default = "default_on_judge_failure")]
	pub on_judge_failure: String,
	#[serde(default = "default_failure_consistency")]
	pub failure_consistency: f32,
}

#[derive(Debug, Deserialize)]
pub struct Answer {
	#[serde(default = "default_snippet_max_chars")]
	pub snippet_max_chars: u32,
	#[serde(default = "default_max_verify_rounds")]
	pub max_verify_rounds: u32,
	/// Confidence (0-100) at which a flagged answer is accepted without
	/// another verification round.
	#[serde(default = "default_min_confidence_for_pass")]
	pub min_confidence_for_pass: f32,
}

#[derive(Debug, Deserialize)]
pub struct Cache {
	#[serde(default = "default_cache_enabled")]
	pub enabled: bool,
	#[serde(default = "default_cache_ttl_seconds")]
	pub ttl_seconds: u64,
	#[serde(default = "default_cache_key_version")]
	pub key_version: u32,
}

impl Default for Retrieval {
	fn default() -> Self {
		Self {
			candidate_k: default_candidate_k(),
			top_k: default_top_k(),
			vector_weight: default_vector_weight(),
			keyword_weight: default_keyword_weight(),
			rrf_k: default_rrf_k(),
			similarity_threshold: default_similarity_threshold(),
			source_timeout_ms: default_source_timeout_ms(),
			rerank_doc_max_chars: default_rerank_doc_max_chars(),
		}
	}
}
impl Default for Gate {
	fn default() -> Self {
		Self {
			on_judge_failure: default_on_judge_failure(),
			failure_consistency: default_failure_consistency(),
		}
	}
}
impl Default for Answer {
	fn default() -> Self {
		Self {
			snippet_max_chars: default_snippet_max_chars(),
			max_verify_rounds: default_max_verify_rounds(),
			min_confidence_for_pass: default_min_confidence_for_pass(),
		}
	}
}
impl Default for Cache {
	fn default() -> Self {
		Self {
			enabled: default_cache_enabled(),
			ttl_seconds: default_cache_ttl_seconds(),
			key_version: default_cache_key_version(),
		}
	}
}

fn default_candidate_k() -> u32 {
	50
}
fn default_top_k() -> u32 {
	5
}
fn default_vector_weight() -> f32 {
	0.7
}
fn default_keyword_weight() -> f32 {
	0.3
}
fn default_rrf_k() -> u32 {
	60
}
fn default_similarity_threshold() -> f32 {
	0.3
}
fn default_source_timeout_ms() -> u64 {
	5_000
}
fn default_rerank_doc_max_chars() -> u32 {
	1_600
}
fn default_on_judge_failure() -> String {
	"assume_answerable".to_string()
}
fn default_failure_consistency() -> f32 {
	0.5
}
fn default_snippet_max_chars() -> u32 {
	280
}
fn default_max_verify_rounds() -> u32 {
	2
}
fn default_min_confidence_for_pass() -> f32 {
	40.0
}
fn default_cache_enabled() -> bool {
	true
}
fn default_cache_ttl_seconds() -> u64 {
	3_600
}
fn default_cache_key_version() -> u32 {
	1
}
