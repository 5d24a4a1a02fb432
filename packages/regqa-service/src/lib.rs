pub mod answer;

mod citation;
mod gate;
mod retrieval;

pub use answer::AnswerRequest;

use std::{future::Future, pin::Pin, sync::Arc};

use regqa_cache::AnswerCache;
use regqa_config::{Config, EmbeddingProviderConfig, LlmProviderConfig, ProviderConfig};
use regqa_domain::types::{CandidateResult, Judgment};
use regqa_providers::{embedding, generator, judge, rerank};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Opaque retrieval filters, forwarded to both candidate sources and folded
/// into the cache key.
pub type Filters = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
}

/// Failure taxonomy for the pipeline's fail-open paths. These never surface
/// as errors; they only label the structured warnings.
#[derive(Debug, Clone, Copy)]
pub enum FailureClass {
	RetrievalUnavailable,
	RerankFailure,
	JudgeFailure,
	GenerationFailure,
}
impl FailureClass {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::RetrievalUnavailable => "retrieval_unavailable",
			Self::RerankFailure => "rerank_failure",
			Self::JudgeFailure => "judge_failure",
			Self::GenerationFailure => "generation_failure",
		}
	}
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait RerankProvider
where
	Self: Send + Sync,
{
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>>;
}

pub trait JudgeProvider
where
	Self: Send + Sync,
{
	fn check_answerability<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
		contexts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Judgment>>;
}

pub trait GeneratorProvider
where
	Self: Send + Sync,
{
	fn answer<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
		contexts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

/// Dense similarity search over the chunk embedding index.
pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		vector: &'a [f32],
		top_k: u32,
		filters: &'a Filters,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateResult>>>;
}

/// Lexical/full-text search. `search_degraded` is the fallback matcher the
/// pipeline switches to when the primary index errors.
pub trait KeywordIndex
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		query: &'a str,
		top_k: u32,
		filters: &'a Filters,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateResult>>>;

	fn search_degraded<'a>(
		&'a self,
		query: &'a str,
		top_k: u32,
		filters: &'a Filters,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateResult>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub rerank: Arc<dyn RerankProvider>,
	pub judge: Arc<dyn JudgeProvider>,
	pub generator: Arc<dyn GeneratorProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		rerank: Arc<dyn RerankProvider>,
		judge: Arc<dyn JudgeProvider>,
		generator: Arc<dyn GeneratorProvider>,
	) -> Self {
		Self { embedding, rerank, judge, generator }
	}

	/// Providers backed by the real HTTP clients in `regqa-providers`.
	pub fn default_providers() -> Self {
		let defaults = Arc::new(DefaultProviders);

		Self {
			embedding: defaults.clone(),
			rerank: defaults.clone(),
			judge: defaults.clone(),
			generator: defaults,
		}
	}
}

#[derive(Clone)]
pub struct Sources {
	pub vector: Arc<dyn VectorIndex>,
	pub keyword: Arc<dyn KeywordIndex>,
}
impl Sources {
	pub fn new(vector: Arc<dyn VectorIndex>, keyword: Arc<dyn KeywordIndex>) -> Self {
		Self { vector, keyword }
	}
}

pub struct RegqaService {
	pub cfg: Config,
	pub sources: Sources,
	pub providers: Providers,
	pub cache: AnswerCache,
}
impl RegqaService {
	pub fn new(cfg: Config, sources: Sources, providers: Providers, cache: AnswerCache) -> Self {
		Self { cfg, sources, providers, cache }
	}

	/// Drop every cached answer citing `document_id`. Called when a source
	/// document is re-ingested or withdrawn.
	pub async fn invalidate_document(&self, document_id: Uuid) -> usize {
		self.cache.invalidate_document(document_id).await
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl RerankProvider for DefaultProviders {
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(rerank::rerank(cfg, query, docs))
	}
}

impl JudgeProvider for DefaultProviders {
	fn check_answerability<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
		contexts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Judgment>> {
		Box::pin(judge::check_answerability(cfg, query, contexts))
	}
}

impl GeneratorProvider for DefaultProviders {
	fn answer<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
		contexts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(generator::answer(cfg, query, contexts))
	}
}
