use regqa_config::{Config, Error, validate};

fn base_toml() -> String {
	r#"
[service]
log_level = "info"

[providers.embedding]
provider_id = "openai"
api_base = "http://localhost:9000"
api_key = "key"
path = "/v1/embeddings"
model = "embed-1"
dimensions = 1024
timeout_ms = 3000

[providers.rerank]
provider_id = "cohere"
api_base = "http://localhost:9001"
api_key = "key"
path = "/v1/rerank"
model = "rerank-1"
timeout_ms = 3000

[providers.judge]
provider_id = "openai"
api_base = "http://localhost:9002"
api_key = "key"
path = "/v1/chat/completions"
model = "judge-1"
temperature = 0.0
timeout_ms = 8000

[providers.generator]
provider_id = "openai"
api_base = "http://localhost:9002"
api_key = "key"
path = "/v1/chat/completions"
model = "gen-1"
temperature = 0.2
timeout_ms = 15000
"#
	.to_string()
}

fn parse(raw: &str) -> Config {
	toml::from_str(raw).expect("config parse failed")
}

#[test]
fn accepts_minimal_config_with_defaults() {
	let cfg = parse(&base_toml());

	validate(&cfg).expect("validation failed");

	assert_eq!(cfg.retrieval.vector_weight, 0.7);
	assert_eq!(cfg.retrieval.keyword_weight, 0.3);
	assert_eq!(cfg.retrieval.rrf_k, 60);
	assert_eq!(cfg.retrieval.similarity_threshold, 0.3);
	assert_eq!(cfg.gate.on_judge_failure, "assume_answerable");
	assert!(cfg.cache.enabled);
}

#[test]
fn rejects_top_k_above_candidate_k() {
	let raw = format!("{}\n[retrieval]\ncandidate_k = 10\ntop_k = 20\n", base_toml());
	let cfg = parse(&raw);
	let err = validate(&cfg).expect_err("validation should fail");

	assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn rejects_out_of_range_weight() {
	let raw = format!("{}\n[retrieval]\nvector_weight = 1.5\n", base_toml());
	let cfg = parse(&raw);

	assert!(validate(&cfg).is_err());
}

#[test]
fn rejects_unknown_gate_policy() {
	let raw = format!("{}\n[gate]\non_judge_failure = \"panic\"\n", base_toml());
	let cfg = parse(&raw);

	assert!(validate(&cfg).is_err());
}

#[test]
fn rejects_empty_api_key() {
	let raw = base_toml().replace("api_key = \"key\"", "api_key = \" \"");
	let cfg = parse(&raw);

	assert!(validate(&cfg).is_err());
}

#[test]
fn rejects_zero_cache_ttl_when_enabled() {
	let raw = format!("{}\n[cache]\nttl_seconds = 0\n", base_toml());
	let cfg = parse(&raw);

	assert!(validate(&cfg).is_err());
}
