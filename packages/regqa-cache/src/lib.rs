mod key;

pub use key::{build_answer_cache_key, cache_key_prefix};

use std::{future::Future, pin::Pin, sync::Arc};

use regqa_domain::types::AnswerResult;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type KvResult<T> = Result<T, KvError>;

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct KvError {
	pub message: String,
}

/// Minimal key-value backend: TTL'd set, glob key listing, batch delete.
/// Implementations may fail; the cache layer above never propagates those
/// failures.
pub trait KvStore
where
	Self: Send + Sync,
{
	fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, KvResult<Option<Vec<u8>>>>;
	fn set_ex<'a>(
		&'a self,
		key: &'a str,
		value: Vec<u8>,
		ttl_seconds: u64,
	) -> BoxFuture<'a, KvResult<()>>;
	fn keys<'a>(&'a self, pattern: &'a str) -> BoxFuture<'a, KvResult<Vec<String>>>;
	fn delete<'a>(&'a self, keys: &'a [String]) -> BoxFuture<'a, KvResult<()>>;
}

/// Serialized cache payload. `document_ids` is denormalized from the
/// citations so invalidation scans do not have to understand the full
/// answer shape.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CachedAnswer {
	pub result: AnswerResult,
	pub document_ids: Vec<Uuid>,
	#[serde(with = "time::serde::rfc3339")]
	pub stored_at: OffsetDateTime,
}

/// Fail-open answer cache keyed by (query, filters). Every backend error is
/// logged and treated as a miss or no-op; a broken cache must never fail the
/// surrounding request.
#[derive(Clone)]
pub struct AnswerCache {
	kv: Arc<dyn KvStore>,
	enabled: bool,
	ttl_seconds: u64,
	key_version: u32,
}

impl AnswerCache {
	pub fn new(kv: Arc<dyn KvStore>, enabled: bool, ttl_seconds: u64, key_version: u32) -> Self {
		Self { kv, enabled, ttl_seconds, key_version }
	}

	pub async fn get(&self, query: &str, filters: &Map<String, Value>) -> Option<CachedAnswer> {
		if !self.enabled {
			return None;
		}

		let key = self.build_key(query, filters)?;

		match self.kv.get(&key).await {
			Ok(Some(raw)) => match serde_json::from_slice::<CachedAnswer>(&raw) {
				Ok(cached) => {
					tracing::info!(
						cache_key_prefix = cache_key_prefix(&key),
						hit = true,
						"Cache hit."
					);

					Some(cached)
				},
				Err(err) => {
					tracing::warn!(
						error = %err,
						cache_key_prefix = cache_key_prefix(&key),
						"Cache payload decode failed."
					);

					None
				},
			},
			Ok(None) => {
				tracing::info!(
					cache_key_prefix = cache_key_prefix(&key),
					hit = false,
					"Cache miss."
				);

				None
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_key_prefix = cache_key_prefix(&key),
					"Cache read failed."
				);

				None
			},
		}
	}

	pub async fn store(&self, query: &str, filters: &Map<String, Value>, cached: &CachedAnswer) {
		if !self.enabled {
			return;
		}

		let Some(key) = self.build_key(query, filters) else { return };
		let raw = match serde_json::to_vec(cached) {
			Ok(raw) => raw,
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_key_prefix = cache_key_prefix(&key),
					"Cache payload encode failed."
				);

				return;
			},
		};

		match self.kv.set_ex(&key, raw, self.ttl_seconds).await {
			Ok(()) => {
				tracing::info!(
					cache_key_prefix = cache_key_prefix(&key),
					ttl_seconds = self.ttl_seconds,
					"Cache stored."
				);
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_key_prefix = cache_key_prefix(&key),
					"Cache write failed."
				);
			},
		}
	}

	/// Scan stored answers and delete every entry citing `document_id`.
	/// Returns how many entries were deleted; fail-open throughout.
	pub async fn invalidate_document(&self, document_id: Uuid) -> usize {
		if !self.enabled {
			return 0;
		}

		let keys = match self.kv.keys("answer:*").await {
			Ok(keys) => keys,
			Err(err) => {
				tracing::warn!(error = %err, "Cache key scan failed.");

				return 0;
			},
		};
		let mut stale = Vec::new();

		for key in keys {
			let raw = match self.kv.get(&key).await {
				Ok(Some(raw)) => raw,
				Ok(None) => continue,
				Err(err) => {
					tracing::warn!(
						error = %err,
						cache_key_prefix = cache_key_prefix(&key),
						"Cache read failed during invalidation."
					);

					continue;
				},
			};

			match serde_json::from_slice::<CachedAnswer>(&raw) {
				Ok(cached) =>
					if cached.document_ids.contains(&document_id) {
						stale.push(key);
					},
				// Undecodable entries referencing unknown documents cannot be
				// trusted to survive a document change; drop them too.
				Err(_) => stale.push(key),
			}
		}

		if stale.is_empty() {
			return 0;
		}

		match self.kv.delete(&stale).await {
			Ok(()) => {
				tracing::info!(
					document_id = %document_id,
					deleted = stale.len(),
					"Cache entries invalidated."
				);

				stale.len()
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					document_id = %document_id,
					"Cache delete failed during invalidation."
				);

				0
			},
		}
	}

	fn build_key(&self, query: &str, filters: &Map<String, Value>) -> Option<String> {
		match build_answer_cache_key(query, filters, self.key_version) {
			Ok(key) => Some(key),
			Err(err) => {
				tracing::warn!(error = %err, "Cache key build failed.");

				None
			},
		}
	}
}
