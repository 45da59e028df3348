use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	#[serde(default)]
	pub security: Security,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub rerank: Rerank,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
}
impl Default for Security {
	fn default() -> Self {
		Self { bind_localhost_only: true }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub reasoning: LlmProviderConfig,
	pub collections: CollectionProviderConfig,
	pub rerank: ProviderConfig,
}

/// Chat-completion backend used by the relevance decision step.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	/// Ask the backend for `response_format: {"type": "json_object"}`.
	#[serde(default = "default_true")]
	pub json_mode: bool,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Collection search backend. Credentials normally arrive with each request; `api_key` is only
/// the fallback when a request carries none.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: Option<String>,
	/// Must contain the `{collection_id}` placeholder.
	#[serde(default = "default_collection_path")]
	pub path: String,
	#[serde(default = "default_connect_timeout_ms")]
	pub connect_timeout_ms: u64,
	#[serde(default = "default_read_timeout_ms")]
	pub read_timeout_ms: u64,
	#[serde(default = "default_write_timeout_ms")]
	pub write_timeout_ms: u64,
	#[serde(default = "default_pool_timeout_ms")]
	pub pool_timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}
impl CollectionProviderConfig {
	pub fn url_for(&self, collection_id: &str) -> String {
		format!("{}{}", self.api_base, self.path.replace(COLLECTION_ID_PLACEHOLDER, collection_id))
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Request defaults applied when a caller omits a parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct Retrieval {
	#[serde(default = "default_top_k")]
	pub default_top_k: u32,
	#[serde(default = "default_rerank_top_k")]
	pub default_rerank_top_k: u32,
	#[serde(default = "default_score_threshold")]
	pub default_score_threshold: f32,
	#[serde(default = "default_semantic_weight")]
	pub default_semantic_weight: f32,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			default_top_k: default_top_k(),
			default_rerank_top_k: default_rerank_top_k(),
			default_score_threshold: default_score_threshold(),
			default_semantic_weight: default_semantic_weight(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rerank {
	/// `single` or `multi_query`.
	#[serde(default = "default_rerank_mode")]
	pub mode: String,
}
impl Default for Rerank {
	fn default() -> Self {
		Self { mode: default_rerank_mode() }
	}
}
impl Rerank {
	/// Average scores over every executed query instead of ranking against the question alone.
	pub fn is_multi_query(&self) -> bool {
		self.mode == RERANK_MODE_MULTI_QUERY
	}
}

pub const COLLECTION_ID_PLACEHOLDER: &str = "{collection_id}";
pub const MAX_TOP_K: u32 = 20;
pub const RERANK_MODE_SINGLE: &str = "single";
pub const RERANK_MODE_MULTI_QUERY: &str = "multi_query";
pub const MAX_CONNECT_TIMEOUT_MS: u64 = 10_000;
pub const MAX_READ_TIMEOUT_MS: u64 = 30_000;
pub const MAX_WRITE_TIMEOUT_MS: u64 = 10_000;
pub const MAX_POOL_TIMEOUT_MS: u64 = 10_000;

fn default_log_level() -> String {
	"info".to_string()
}

fn default_true() -> bool {
	true
}

fn default_collection_path() -> String {
	format!("/datasets/{COLLECTION_ID_PLACEHOLDER}/retrieve")
}

fn default_connect_timeout_ms() -> u64 {
	MAX_CONNECT_TIMEOUT_MS
}

fn default_read_timeout_ms() -> u64 {
	MAX_READ_TIMEOUT_MS
}

fn default_write_timeout_ms() -> u64 {
	MAX_WRITE_TIMEOUT_MS
}

fn default_pool_timeout_ms() -> u64 {
	MAX_POOL_TIMEOUT_MS
}

fn default_top_k() -> u32 {
	10
}

fn default_rerank_top_k() -> u32 {
	5
}

fn default_score_threshold() -> f32 {
	0.4
}

fn default_semantic_weight() -> f32 {
	0.7
}

fn default_rerank_mode() -> String {
	RERANK_MODE_SINGLE.to_string()
}
