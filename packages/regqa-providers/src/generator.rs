use std::time::Duration;

use color_eyre::{Result, eyre};
use serde_json::Value;

const SYSTEM_PROMPT: &str = "You answer questions about regulatory documents using only the \
	numbered context passages provided. Cite every factual claim with a marker like [1] or [2] \
	referencing the context number it came from. If a claim is not supported by the passages, \
	do not make it. Answer in the language of the question.";

pub async fn answer(
	cfg: &regqa_config::LlmProviderConfig,
	query: &str,
	contexts: &[String],
) -> Result<String> {
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
	let text = crate::chat_content(&json)?;
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return Err(eyre::eyre!("Generator returned an empty answer."));
	}

	Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_generated_answer_is_an_error() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "   " } }
			]
		});
		let text = crate::chat_content(&json).expect("parse failed");

		assert!(text.trim().is_empty());
	}
}
