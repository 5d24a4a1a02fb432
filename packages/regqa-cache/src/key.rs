use serde_json::{Map, Value};

const ANSWER_CACHE_SCHEMA_VERSION: i32 = 1;

pub fn build_answer_cache_key(
	query: &str,
	filters: &Map<String, Value>,
	key_version: u32,
) -> Result<String, serde_json::Error> {
	let payload = serde_json::json!({
		"kind": "answer",
		"schema_version": ANSWER_CACHE_SCHEMA_VERSION,
		"query": query.trim(),
		"filters": filters,
	});
	let raw = serde_json::to_vec(&payload)?;

	Ok(format!("answer:v{key_version}:{}", blake3::hash(&raw).to_hex()))
}

pub fn cache_key_prefix(key: &str) -> &str {
	let len = key.len().min(24);

	&key[..len]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn key_is_stable_for_trimmed_query() {
		let filters = Map::new();
		let key_a = build_answer_cache_key("  base rate?  ", &filters, 1).expect("key failed");
		let key_b = build_answer_cache_key("base rate?", &filters, 1).expect("key failed");

		assert_eq!(key_a, key_b);
	}

	#[test]
	fn key_changes_with_filters() {
		let empty = Map::new();
		let mut scoped = Map::new();

		scoped.insert("regulator".to_string(), serde_json::json!("fsc"));

		let key_a = build_answer_cache_key("q", &empty, 1).expect("key failed");
		let key_b = build_answer_cache_key("q", &scoped, 1).expect("key failed");

		assert_ne!(key_a, key_b);
	}

	#[test]
	fn key_changes_with_version() {
		let filters = Map::new();
		let key_a = build_answer_cache_key("q", &filters, 1).expect("key failed");
		let key_b = build_answer_cache_key("q", &filters, 2).expect("key failed");

		assert_ne!(key_a, key_b);
		assert!(key_b.starts_with("answer:v2:"));
	}
}
