mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Answer, Cache, Config, EmbeddingProviderConfig, Gate, LlmProviderConfig, ProviderConfig,
	Providers, Retrieval, Service,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}

	for (label, weight) in [
		("retrieval.vector_weight", cfg.retrieval.vector_weight),
		("retrieval.keyword_weight", cfg.retrieval.keyword_weight),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number."),
			});
		}
		if !(0.0..=1.0).contains(&weight) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if cfg.retrieval.vector_weight + cfg.retrieval.keyword_weight <= 0.0 {
		return Err(Error::Validation {
			message: "retrieval source weights must sum to greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.rrf_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.rrf_k must be greater than zero.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.retrieval.similarity_threshold) {
		return Err(Error::Validation {
			message: "retrieval.similarity_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.top_k > cfg.retrieval.candidate_k {
		return Err(Error::Validation {
			message: "retrieval.top_k must not exceed retrieval.candidate_k.".to_string(),
		});
	}
	if cfg.retrieval.source_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "retrieval.source_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.rerank_doc_max_chars == 0 {
		return Err(Error::Validation {
			message: "retrieval.rerank_doc_max_chars must be greater than zero.".to_string(),
		});
	}

	if !matches!(cfg.gate.on_judge_failure.as_str(), "assume_answerable" | "assume_unanswerable") {
		return Err(Error::Validation {
			message: "gate.on_judge_failure must be one of assume_answerable or assume_unanswerable."
				.to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.gate.failure_consistency) {
		return Err(Error::Validation {
			message: "gate.failure_consistency must be in the range 0.0-1.0.".to_string(),
		});
	}

	if cfg.answer.snippet_max_chars == 0 {
		return Err(Error::Validation {
			message: "answer.snippet_max_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.answer.max_verify_rounds == 0 {
		return Err(Error::Validation {
			message: "answer.max_verify_rounds must be greater than zero.".to_string(),
		});
	}
	if !(0.0..=100.0).contains(&cfg.answer.min_confidence_for_pass) {
		return Err(Error::Validation {
			message: "answer.min_confidence_for_pass must be in the range 0.0-100.0.".to_string(),
		});
	}

	if cfg.cache.enabled && cfg.cache.ttl_seconds == 0 {
		return Err(Error::Validation {
			message: "cache.ttl_seconds must be greater than zero when the cache is enabled."
				.to_string(),
		});
	}
	if cfg.cache.key_version == 0 {
		return Err(Error::Validation {
			message: "cache.key_version must be greater than zero.".to_string(),
		});
	}

	for (label, provider_timeout_ms) in [
		("embedding", cfg.providers.embedding.timeout_ms),
		("rerank", cfg.providers.rerank.timeout_ms),
		("judge", cfg.providers.judge.timeout_ms),
		("generator", cfg.providers.generator.timeout_ms),
	] {
		if provider_timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("Provider {label} timeout_ms must be greater than zero."),
			});
		}
	}
	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("rerank", &cfg.providers.rerank.api_key),
		("judge", &cfg.providers.judge.api_key),
		("generator", &cfg.providers.generator.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for provider_base in [
		&mut cfg.providers.embedding.api_base,
		&mut cfg.providers.rerank.api_base,
		&mut cfg.providers.judge.api_base,
		&mut cfg.providers.generator.api_base,
	] {
		while provider_base.ends_with('/') {
			provider_base.pop();
		}
	}
}
