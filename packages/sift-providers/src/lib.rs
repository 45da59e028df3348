pub mod chat;
pub mod collections;
pub mod rerank;

mod error;

pub use error::{Error, Result};

use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

const MAX_ERROR_BODY_CHARS: usize = 500;

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: format!("Default header {key} must be a string."),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// Sends a JSON POST and decodes a JSON reply. Non-2xx replies become [`Error::Status`] carrying
/// a truncated body.
pub(crate) async fn post_json(
	client: &Client,
	url: &str,
	headers: HeaderMap,
	body: &Value,
) -> Result<Value> {
	let res = client
		.post(url)
		.headers(headers)
		.json(body)
		.send()
		.await
		.map_err(|err| Error::transport(url, err))?;
	let status = res.status();

	if !status.is_success() {
		let text = res.text().await.unwrap_or_default();

		return Err(Error::Status {
			url: url.to_string(),
			status: status.as_u16(),
			body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
		});
	}

	res.json().await.map_err(|err| Error::transport(url, err))
}
