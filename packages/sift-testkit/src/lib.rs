mod error;

pub use error::{Error, Result};

use std::sync::{Arc, Mutex};

use axum::Router;
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::oneshot};

use sift_config::{
	CollectionProviderConfig, Config, LlmProviderConfig, ProviderConfig, Providers, Rerank,
	Retrieval, Security, Service,
};

/// Base URL that refuses connections.
pub const UNREACHABLE_BASE: &str = "http://127.0.0.1:1";

/// An axum router served on an ephemeral loopback port for the lifetime of the value.
pub struct FakeBackend {
	base_url: String,
	shutdown: Option<oneshot::Sender<()>>,
}
impl FakeBackend {
	pub async fn start(router: Router) -> Result<Self> {
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let (tx, rx) = oneshot::channel();
		let server = axum::serve(listener, router).with_graceful_shutdown(async move {
			let _ = rx.await;
		});

		tokio::spawn(async move {
			if let Err(err) = server.await {
				eprintln!("Fake backend on {addr} stopped with error: {err}.");
			}
		});

		Ok(Self { base_url: format!("http://{addr}"), shutdown: Some(tx) })
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}
}
impl Drop for FakeBackend {
	fn drop(&mut self) {
		if let Some(tx) = self.shutdown.take() {
			let _ = tx.send(());
		}
	}
}

/// Shared log of request bodies seen by a fake backend handler.
#[derive(Clone, Default)]
pub struct Recorder {
	bodies: Arc<Mutex<Vec<Value>>>,
}
impl Recorder {
	pub fn record(&self, body: Value) {
		self.bodies.lock().unwrap_or_else(|err| err.into_inner()).push(body);
	}

	pub fn bodies(&self) -> Vec<Value> {
		self.bodies.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn count(&self) -> usize {
		self.bodies.lock().unwrap_or_else(|err| err.into_inner()).len()
	}
}

pub fn test_config(reasoning_base: &str, collections_base: &str, rerank_base: &str) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		security: Security { bind_localhost_only: true },
		providers: Providers {
			reasoning: reasoning_provider(reasoning_base),
			collections: collection_provider(collections_base),
			rerank: rerank_provider(rerank_base),
		},
		retrieval: Retrieval::default(),
		rerank: Rerank::default(),
	}
}

pub fn reasoning_provider(api_base: &str) -> LlmProviderConfig {
	LlmProviderConfig {
		provider_id: "test".to_string(),
		api_base: api_base.to_string(),
		api_key: "llm-key".to_string(),
		path: "/chat/completions".to_string(),
		model: "test-llm".to_string(),
		temperature: 0.3,
		timeout_ms: 2_000,
		json_mode: true,
		default_headers: Map::new(),
	}
}

pub fn collection_provider(api_base: &str) -> CollectionProviderConfig {
	CollectionProviderConfig {
		provider_id: "test".to_string(),
		api_base: api_base.to_string(),
		api_key: None,
		path: "/datasets/{collection_id}/retrieve".to_string(),
		connect_timeout_ms: 1_000,
		read_timeout_ms: 2_000,
		write_timeout_ms: 1_000,
		pool_timeout_ms: 1_000,
		default_headers: Map::new(),
	}
}

pub fn rerank_provider(api_base: &str) -> ProviderConfig {
	ProviderConfig {
		provider_id: "test".to_string(),
		api_base: api_base.to_string(),
		api_key: "rerank-key".to_string(),
		path: "/rerank".to_string(),
		model: "test-reranker".to_string(),
		timeout_ms: 2_000,
		default_headers: Map::new(),
	}
}
