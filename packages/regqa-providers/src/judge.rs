use std::time::Duration;

use color_eyre::{Result, eyre};
use regqa_domain::types::Judgment;
use serde_json::Value;

const SYSTEM_PROMPT: &str = "You are an answerability judge for regulatory question answering. \
	Decide strictly from the numbered context passages whether the question can be answered. \
	Do not use outside knowledge. Respond with JSON only: \
	{\"can_answer\": bool, \"reason\": string, \"consistency\": number between 0 and 1, \
	\"supporting_indices\": [int]} where supporting_indices names the context numbers that \
	justify the answer.";

pub async fn check_answerability(
	cfg: &regqa_config::LlmProviderConfig,
	query: &str,
	contexts: &[String],
) -> Result<Judgment> {
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let user_prompt = format!(
		"Question:\n{query}\n\nContext passages:\n{}",
		crate::numbered_contexts(contexts)
	);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": [
			{ "role": "system", "content": SYSTEM_PROMPT },
			{ "role": "user", "content": user_prompt },
		],
	});
	let res = crate::http_client()
		.post(url)
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_judgment(&json)
}

/// Best-effort parse of the judge's JSON verdict. Failure is a typed error
/// so the gate's fallback policy stays visible at the call site.
fn parse_judgment(json: &Value) -> Result<Judgment> {
	let content = crate::chat_content(json)?;
	let verdict: Value = serde_json::from_str(content.trim())
		.map_err(|_| eyre::eyre!("Judge content is not valid JSON."))?;
	let can_answer = verdict
		.get("can_answer")
		.and_then(|v| v.as_bool())
		.ok_or_else(|| eyre::eyre!("Judge verdict missing can_answer."))?;
	let reason = verdict
		.get("reason")
		.and_then(|v| v.as_str())
		.unwrap_or_default()
		.to_string();
	let consistency = verdict
		.get("consistency")
		.and_then(|v| v.as_f64())
		.map(|v| v as f32)
		.unwrap_or(0.5)
		.clamp(0.0, 1.0);

	Ok(Judgment { can_answer, reason, consistency })
}

#[cfg(test)]
mod tests {
	use super::*;

	fn chat_response(content: &str) -> Value {
		serde_json::json!({
			"choices": [
				{ "message": { "content": content } }
			]
		})
	}

	#[test]
	fn parses_verdict_and_clamps_consistency() {
		let json = chat_response(
			r#"{"can_answer": true, "reason": "Context 1 states the rate.", "consistency": 1.7, "supporting_indices": [1]}"#,
		);
		let judgment = parse_judgment(&json).expect("parse failed");

		assert!(judgment.can_answer);
		assert_eq!(judgment.consistency, 1.0);
	}

	#[test]
	fn non_json_content_is_a_typed_error() {
		let json = chat_response("I think the answer is yes.");

		assert!(parse_judgment(&json).is_err());
	}

	#[test]
	fn missing_can_answer_is_an_error() {
		let json = chat_response(r#"{"reason": "no verdict"}"#);

		assert!(parse_judgment(&json).is_err());
	}
}
