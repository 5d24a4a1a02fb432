pub mod embedding;
pub mod generator;
pub mod judge;
pub mod rerank;

use std::sync::OnceLock;

use color_eyre::{Result, eyre};
use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

/// Process-wide HTTP client, initialized on first use and shared across all
/// in-flight requests. Per-provider timeouts are applied on each request.
pub fn http_client() -> &'static Client {
	HTTP_CLIENT.get_or_init(Client::new)
}

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(eyre::eyre!("Default header values must be strings."));
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// Numbered context block shared by the judge and generator prompts. Indices
/// are 1-based to match the `[n]` citation markers.
pub(crate) fn numbered_contexts(contexts: &[String]) -> String {
	contexts
		.iter()
		.enumerate()
		.map(|(idx, context)| format!("[{}] {context}", idx + 1))
		.collect::<Vec<_>>()
		.join("\n\n")
}

/// Pull the first choice's message content out of a chat-completions
/// response.
pub(crate) fn chat_content(json: &Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|content| content.as_str())
		.map(str::to_string)
		.ok_or_else(|| eyre::eyre!("Chat response is missing message content."))
}
