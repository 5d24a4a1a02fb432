//! In-memory fakes for exercising the answer pipeline without network
//! collaborators or a running backend.

use std::sync::{
	Arc, Mutex,
	atomic::{AtomicUsize, Ordering},
};

use regqa_cache::{BoxFuture as KvFuture, KvError, KvResult, KvStore};
use regqa_config::{
	Config, EmbeddingProviderConfig, LlmProviderConfig, ProviderConfig,
	Providers as ProvidersConfig, Service,
};
use regqa_domain::types::{CandidateResult, Judgment};
use regqa_service::{
	BoxFuture, EmbeddingProvider, Filters, GeneratorProvider, JudgeProvider, KeywordIndex,
	RerankProvider, VectorIndex,
};
use uuid::Uuid;

/// Install a tracing subscriber honoring `RUST_LOG`. Safe to call from every
/// test; repeat installs are ignored.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

/// A configuration with inert provider endpoints and library defaults for
/// everything tunable.
pub fn test_config() -> Config {
	Config {
		service: Service { log_level: "info".to_string() },
		providers: ProvidersConfig {
			embedding: EmbeddingProviderConfig {
				provider_id: "test-embedding".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "test-embed".to_string(),
				dimensions: 8,
				timeout_ms: 1_000,
				default_headers: serde_json::Map::new(),
			},
			rerank: ProviderConfig {
				provider_id: "test-rerank".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/rerank".to_string(),
				model: "test-rerank".to_string(),
				timeout_ms: 1_000,
				default_headers: serde_json::Map::new(),
			},
			judge: test_llm_config(),
			generator: test_llm_config(),
		},
		retrieval: Default::default(),
		gate: Default::default(),
		answer: Default::default(),
		cache: Default::default(),
	}
}

fn test_llm_config() -> LlmProviderConfig {
	LlmProviderConfig {
		provider_id: "test-llm".to_string(),
		api_base: "http://127.0.0.1:1".to_string(),
		api_key: "test-key".to_string(),
		path: "/v1/chat/completions".to_string(),
		model: "test-chat".to_string(),
		temperature: 0.0,
		timeout_ms: 1_000,
		default_headers: serde_json::Map::new(),
	}
}

/// A candidate with deterministic ids derived from `chunk`.
pub fn candidate(chunk: u128, title: &str, text: &str, score: f32) -> CandidateResult {
	CandidateResult {
		chunk_id: Uuid::from_u128(chunk),
		document_id: Uuid::from_u128(1_000 + chunk),
		document_title: title.to_string(),
		text: text.to_string(),
		score,
		published_at: None,
		url: Some(format!("https://law.example/doc/{chunk}")),
		provenance: Some("pdf_text".to_string()),
		metadata: serde_json::Value::Null,
	}
}

pub struct StaticVectorIndex {
	pub results: Vec<CandidateResult>,
}
impl VectorIndex for StaticVectorIndex {
	fn search<'a>(
		&'a self,
		_vector: &'a [f32],
		top_k: u32,
		_filters: &'a Filters,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateResult>>> {
		Box::pin(async move {
			Ok(self.results.iter().take(top_k as usize).cloned().collect())
		})
	}
}

pub struct FailingVectorIndex;
impl VectorIndex for FailingVectorIndex {
	fn search<'a>(
		&'a self,
		_vector: &'a [f32],
		_top_k: u32,
		_filters: &'a Filters,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateResult>>> {
		Box::pin(async { Err(color_eyre::eyre::eyre!("vector index unavailable")) })
	}
}

/// Keyword source with an optional failing primary path; `degraded` is what
/// the fallback matcher returns.
pub struct StaticKeywordIndex {
	pub results: Vec<CandidateResult>,
	pub fail_primary: bool,
	pub degraded: Vec<CandidateResult>,
}
impl StaticKeywordIndex {
	pub fn healthy(results: Vec<CandidateResult>) -> Self {
		Self { results, fail_primary: false, degraded: Vec::new() }
	}
}
impl KeywordIndex for StaticKeywordIndex {
	fn search<'a>(
		&'a self,
		_query: &'a str,
		top_k: u32,
		_filters: &'a Filters,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateResult>>> {
		Box::pin(async move {
			if self.fail_primary {
				return Err(color_eyre::eyre::eyre!("keyword index unavailable"));
			}

			Ok(self.results.iter().take(top_k as usize).cloned().collect())
		})
	}

	fn search_degraded<'a>(
		&'a self,
		_query: &'a str,
		top_k: u32,
		_filters: &'a Filters,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateResult>>> {
		Box::pin(async move {
			Ok(self.degraded.iter().take(top_k as usize).cloned().collect())
		})
	}
}

pub struct FailingKeywordIndex;
impl KeywordIndex for FailingKeywordIndex {
	fn search<'a>(
		&'a self,
		_query: &'a str,
		_top_k: u32,
		_filters: &'a Filters,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateResult>>> {
		Box::pin(async { Err(color_eyre::eyre::eyre!("keyword index unavailable")) })
	}

	fn search_degraded<'a>(
		&'a self,
		_query: &'a str,
		_top_k: u32,
		_filters: &'a Filters,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateResult>>> {
		Box::pin(async { Err(color_eyre::eyre::eyre!("degraded matcher unavailable")) })
	}
}

pub struct StubEmbedding {
	pub dimensions: usize,
}
impl EmbeddingProvider for StubEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(texts.iter().map(|_| vec![0.1; self.dimensions]).collect()) })
	}
}

pub struct FailingEmbedding;
impl EmbeddingProvider for FailingEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async { Err(color_eyre::eyre::eyre!("embedding provider unavailable")) })
	}
}

/// Returns the scripted scores in order, regardless of the documents.
pub struct StubRerank {
	pub scores: Vec<f32>,
}
impl RerankProvider for StubRerank {
	fn rerank<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		_query: &'a str,
		_docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(async move { Ok(self.scores.clone()) })
	}
}

pub struct FailingRerank;
impl RerankProvider for FailingRerank {
	fn rerank<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		_query: &'a str,
		_docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(async { Err(color_eyre::eyre::eyre!("rerank provider unavailable")) })
	}
}

/// Always returns the scripted judgment and counts invocations, so tests can
/// assert the gate was (or was not) consulted.
pub struct ScriptedJudge {
	pub judgment: Judgment,
	pub calls: Arc<AtomicUsize>,
}
impl ScriptedJudge {
	pub fn answerable() -> Self {
		Self {
			judgment: Judgment {
				can_answer: true,
				reason: "Context covers the question.".to_string(),
				consistency: 0.9,
			},
			calls: Arc::new(AtomicUsize::new(0)),
		}
	}

	pub fn unanswerable(reason: &str) -> Self {
		Self {
			judgment: Judgment {
				can_answer: false,
				reason: reason.to_string(),
				consistency: 0.9,
			},
			calls: Arc::new(AtomicUsize::new(0)),
		}
	}

	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl JudgeProvider for ScriptedJudge {
	fn check_answerability<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_query: &'a str,
		_contexts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Judgment>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			Ok(self.judgment.clone())
		})
	}
}

pub struct FailingJudge;
impl JudgeProvider for FailingJudge {
	fn check_answerability<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_query: &'a str,
		_contexts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Judgment>> {
		Box::pin(async { Err(color_eyre::eyre::eyre!("judge unavailable")) })
	}
}

/// Emits the scripted answers in sequence, repeating the last one once the
/// script is exhausted.
pub struct ScriptedGenerator {
	answers: Vec<String>,
	cursor: AtomicUsize,
}
impl ScriptedGenerator {
	pub fn new(answers: Vec<String>) -> Self {
		Self { answers, cursor: AtomicUsize::new(0) }
	}

	pub fn single(answer: &str) -> Self {
		Self::new(vec![answer.to_string()])
	}

	pub fn call_count(&self) -> usize {
		self.cursor.load(Ordering::SeqCst)
	}
}
impl GeneratorProvider for ScriptedGenerator {
	fn answer<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_query: &'a str,
		_contexts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(async move {
			let taken = self.cursor.fetch_add(1, Ordering::SeqCst);
			let index = taken.min(self.answers.len().saturating_sub(1));

			self.answers
				.get(index)
				.cloned()
				.ok_or_else(|| color_eyre::eyre::eyre!("generator script is empty"))
		})
	}
}

pub struct FailingGenerator;
impl GeneratorProvider for FailingGenerator {
	fn answer<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_query: &'a str,
		_contexts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(async { Err(color_eyre::eyre::eyre!("generator unavailable")) })
	}
}

pub struct MemoryKv {
	entries: Mutex<std::collections::HashMap<String, Vec<u8>>>,
}
impl MemoryKv {
	pub fn new() -> Self {
		Self { entries: Mutex::new(std::collections::HashMap::new()) }
	}
}
impl Default for MemoryKv {
	fn default() -> Self {
		Self::new()
	}
}
impl KvStore for MemoryKv {
	fn get<'a>(&'a self, key: &'a str) -> KvFuture<'a, KvResult<Option<Vec<u8>>>> {
		Box::pin(async move { Ok(self.entries.lock().expect("lock poisoned").get(key).cloned()) })
	}

	fn set_ex<'a>(
		&'a self,
		key: &'a str,
		value: Vec<u8>,
		_ttl_seconds: u64,
	) -> KvFuture<'a, KvResult<()>> {
		Box::pin(async move {
			self.entries.lock().expect("lock poisoned").insert(key.to_string(), value);

			Ok(())
		})
	}

	fn keys<'a>(&'a self, pattern: &'a str) -> KvFuture<'a, KvResult<Vec<String>>> {
		Box::pin(async move {
			let prefix = pattern.trim_end_matches('*');

			Ok(self
				.entries
				.lock()
				.expect("lock poisoned")
				.keys()
				.filter(|key| key.starts_with(prefix))
				.cloned()
				.collect())
		})
	}

	fn delete<'a>(&'a self, keys: &'a [String]) -> KvFuture<'a, KvResult<()>> {
		Box::pin(async move {
			let mut entries = self.entries.lock().expect("lock poisoned");

			for key in keys {
				entries.remove(key);
			}

			Ok(())
		})
	}
}

/// Every operation fails, for exercising the cache's fail-open contract.
pub struct PoisonedKv;
impl KvStore for PoisonedKv {
	fn get<'a>(&'a self, _key: &'a str) -> KvFuture<'a, KvResult<Option<Vec<u8>>>> {
		Box::pin(async { Err(KvError { message: "backend down".to_string() }) })
	}

	fn set_ex<'a>(
		&'a self,
		_key: &'a str,
		_value: Vec<u8>,
		_ttl_seconds: u64,
	) -> KvFuture<'a, KvResult<()>> {
		Box::pin(async { Err(KvError { message: "backend down".to_string() }) })
	}

	fn keys<'a>(&'a self, _pattern: &'a str) -> KvFuture<'a, KvResult<Vec<String>>> {
		Box::pin(async { Err(KvError { message: "backend down".to_string() }) })
	}

	fn delete<'a>(&'a self, _keys: &'a [String]) -> KvFuture<'a, KvResult<()>> {
		Box::pin(async { Err(KvError { message: "backend down".to_string() }) })
	}
}
