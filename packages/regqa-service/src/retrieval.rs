use std::{future::Future, time::Duration};

use color_eyre::eyre;
use regqa_domain::{fusion, text, types::CandidateResult, types::FusedCandidate};
use tokio::time::timeout;

use crate::{FailureClass, Filters, RegqaService};

pub(crate) struct RetrievedLists {
	pub(crate) vector: Vec<CandidateResult>,
	pub(crate) keyword: Vec<CandidateResult>,
	pub(crate) vector_failed: bool,
	pub(crate) keyword_failed: bool,
}

/// Fan out to both candidate sources concurrently and join the results.
/// Each branch is independently bounded by `retrieval.source_timeout_ms`;
/// a failed branch contributes an empty list and a failure flag instead of
/// an error.
pub(crate) async fn gather(
	service: &RegqaService,
	query: &str,
	filters: &Filters,
) -> RetrievedLists {
	let source_timeout = Duration::from_millis(service.cfg.retrieval.source_timeout_ms);
	let candidate_k = service.cfg.retrieval.candidate_k;
	let vector_branch = async {
		let query_text = [query.to_string()];
		let embedded = bounded(
			source_timeout,
			service.providers.embedding.embed(&service.cfg.providers.embedding, &query_text),
		)
		.await;
		let query_vector = match embedded {
			Ok(mut vectors) if !vectors.is_empty() => vectors.remove(0),
			Ok(_) => {
				tracing::warn!(
					failure = FailureClass::RetrievalUnavailable.as_str(),
					source = "vector",
					"Embedding provider returned no vector."
				);

				return (Vec::new(), true);
			},
			Err(err) => {
				tracing::warn!(
					failure = FailureClass::RetrievalUnavailable.as_str(),
					source = "vector",
					error = %err,
					"Query embedding failed."
				);

				return (Vec::new(), true);
			},
		};

		match bounded(
			source_timeout,
			service.sources.vector.search(&query_vector, candidate_k, filters),
		)
		.await
		{
			Ok(results) => (results, false),
			Err(err) => {
				tracing::warn!(
					failure = FailureClass::RetrievalUnavailable.as_str(),
					source = "vector",
					error = %err,
					"Vector search failed."
				);

				(Vec::new(), true)
			},
		}
	};
	let keyword_branch = async {
		match bounded(
			source_timeout,
			service.sources.keyword.search(query, candidate_k, filters),
		)
		.await
		{
			Ok(results) => (results, false),
			Err(err) => {
				tracing::warn!(
					source = "keyword",
					error = %err,
					"Primary keyword search failed; trying degraded matcher."
				);

				match bounded(
					source_timeout,
					service.sources.keyword.search_degraded(query, candidate_k, filters),
				)
				.await
				{
					Ok(results) => (results, false),
					Err(err) => {
						tracing::warn!(
							failure = FailureClass::RetrievalUnavailable.as_str(),
							source = "keyword",
							error = %err,
							"Degraded keyword search failed."
						);

						(Vec::new(), true)
					},
				}
			},
		}
	};
	let ((vector, vector_failed), (keyword, keyword_failed)) =
		tokio::join!(vector_branch, keyword_branch);

	RetrievedLists { vector, keyword, vector_failed, keyword_failed }
}

/// Re-score the filtered candidates with the pairwise relevance model. On
/// any failure the pre-rerank ordering is returned unchanged, truncated to
/// `target_k`.
pub(crate) async fn rerank_contexts(
	service: &RegqaService,
	query: &str,
	mut contexts: Vec<FusedCandidate>,
	target_k: usize,
) -> Vec<FusedCandidate> {
	if contexts.is_empty() {
		return contexts;
	}

	let budget = service.cfg.retrieval.rerank_doc_max_chars as usize;
	let docs: Vec<String> = contexts
		.iter()
		.map(|context| text::truncate_chars(&context.candidate.text, budget))
		.collect();

	match service.providers.rerank.rerank(&service.cfg.providers.rerank, query, &docs).await {
		Ok(scores) if scores.len() == contexts.len() => {
			for (context, score) in contexts.iter_mut().zip(scores) {
				context.score = score;
			}

			fusion::sort_fused(&mut contexts);
			contexts.truncate(target_k);

			contexts
		},
		Ok(scores) => {
			tracing::warn!(
				failure = FailureClass::RerankFailure.as_str(),
				expected = contexts.len(),
				received = scores.len(),
				"Rerank provider returned mismatched score count; keeping pre-rerank order."
			);

			contexts.truncate(target_k);

			contexts
		},
		Err(err) => {
			tracing::warn!(
				failure = FailureClass::RerankFailure.as_str(),
				error = %err,
				"Rerank failed; keeping pre-rerank order."
			);

			contexts.truncate(target_k);

			contexts
		},
	}
}

async fn bounded<T>(
	limit: Duration,
	call: impl Future<Output = color_eyre::Result<T>>,
) -> color_eyre::Result<T> {
	match timeout(limit, call).await {
		Ok(result) => result,
		Err(_) => Err(eyre::eyre!("Call timed out after {limit:?}.")),
	}
}
