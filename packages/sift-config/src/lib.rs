mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	COLLECTION_ID_PLACEHOLDER, CollectionProviderConfig, Config, LlmProviderConfig, MAX_TOP_K,
	ProviderConfig, Providers, RERANK_MODE_MULTI_QUERY, RERANK_MODE_SINGLE, Rerank, Retrieval,
	Security, Service,
};

use std::{fs, path::Path};

use serde_json::{Map, Value};

use crate::types::{
	MAX_CONNECT_TIMEOUT_MS, MAX_POOL_TIMEOUT_MS, MAX_READ_TIMEOUT_MS, MAX_WRITE_TIMEOUT_MS,
};

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
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::invalid("service.http_bind", "must be non-empty."));
	}

	for (label, key) in [
		("providers.reasoning.api_key", &cfg.providers.reasoning.api_key),
		("providers.rerank.api_key", &cfg.providers.rerank.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::invalid(label, "must be non-empty."));
		}
	}
	for (label, base) in [
		("providers.reasoning.api_base", &cfg.providers.reasoning.api_base),
		("providers.collections.api_base", &cfg.providers.collections.api_base),
		("providers.rerank.api_base", &cfg.providers.rerank.api_base),
	] {
		if base.trim().is_empty() {
			return Err(Error::invalid(label, "must be non-empty."));
		}
	}

	let reasoning = &cfg.providers.reasoning;

	if !reasoning.temperature.is_finite() || reasoning.temperature < 0.0 {
		return Err(Error::invalid(
			"providers.reasoning.temperature",
			"must be a finite number, zero or greater.",
		));
	}
	if reasoning.timeout_ms == 0 {
		return Err(Error::invalid("providers.reasoning.timeout_ms", "must be greater than zero."));
	}
	if cfg.providers.rerank.timeout_ms == 0 {
		return Err(Error::invalid("providers.rerank.timeout_ms", "must be greater than zero."));
	}

	let collections = &cfg.providers.collections;

	if !collections.path.contains(COLLECTION_ID_PLACEHOLDER) {
		return Err(Error::invalid(
			"providers.collections.path",
			format!("must contain the {COLLECTION_ID_PLACEHOLDER} placeholder."),
		));
	}

	for (label, value, max) in [
		(
			"providers.collections.connect_timeout_ms",
			collections.connect_timeout_ms,
			MAX_CONNECT_TIMEOUT_MS,
		),
		("providers.collections.read_timeout_ms", collections.read_timeout_ms, MAX_READ_TIMEOUT_MS),
		(
			"providers.collections.write_timeout_ms",
			collections.write_timeout_ms,
			MAX_WRITE_TIMEOUT_MS,
		),
		("providers.collections.pool_timeout_ms", collections.pool_timeout_ms, MAX_POOL_TIMEOUT_MS),
	] {
		if value == 0 || value > max {
			return Err(Error::invalid(label, format!("must be in the range 1-{max}.")));
		}
	}

	let retrieval = &cfg.retrieval;

	for (label, value) in [
		("retrieval.default_top_k", retrieval.default_top_k),
		("retrieval.default_rerank_top_k", retrieval.default_rerank_top_k),
	] {
		if value == 0 || value > MAX_TOP_K {
			return Err(Error::invalid(label, format!("must be in the range 1-{MAX_TOP_K}.")));
		}
	}
	for (label, value) in [
		("retrieval.default_score_threshold", retrieval.default_score_threshold),
		("retrieval.default_semantic_weight", retrieval.default_semantic_weight),
	] {
		if !value.is_finite() || !(0.0..=1.0).contains(&value) {
			return Err(Error::invalid(label, "must be in the range 0.0-1.0."));
		}
	}

	if ![RERANK_MODE_SINGLE, RERANK_MODE_MULTI_QUERY].contains(&cfg.rerank.mode.as_str()) {
		return Err(Error::invalid("rerank.mode", "must be one of single or multi_query."));
	}

	for (label, headers) in [
		("providers.reasoning.default_headers", &reasoning.default_headers),
		("providers.collections.default_headers", &collections.default_headers),
		("providers.rerank.default_headers", &cfg.providers.rerank.default_headers),
	] {
		validate_headers(label, headers)?;
	}

	Ok(())
}

fn validate_headers(label: &str, headers: &Map<String, Value>) -> Result<()> {
	if let Some((name, _)) = headers.iter().find(|(_, value)| !value.is_string()) {
		return Err(Error::invalid(format!("{label}.{name}"), "must be a string."));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for base in [
		&mut cfg.providers.reasoning.api_base,
		&mut cfg.providers.collections.api_base,
		&mut cfg.providers.rerank.api_base,
	] {
		let trimmed = base.trim().trim_end_matches('/').to_string();

		*base = trimmed;
	}

	let collections = &mut cfg.providers.collections;

	if collections.api_key.as_deref().is_some_and(|key| key.trim().is_empty()) {
		collections.api_key = None;
	}
}
