pub mod decide;
pub mod pipeline;
pub mod rerank;
pub mod retrieve;

mod error;

pub use decide::DecisionOutcome;
pub use error::{Error, Result};
pub use pipeline::{RetrieveRequest, RetrieveResponse};
pub use rerank::RerankOutcome;
pub use retrieve::{BatchStats, CollectionOutcome, RetrievalParams};

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use sift_config::{CollectionProviderConfig, Config, LlmProviderConfig, ProviderConfig};
use sift_providers::{
	chat,
	collections::{self, SearchPage, SearchParams},
	rerank::{self as rerank_api, RerankHit},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Chat-completion backend that answers the relevance question with a JSON document.
pub trait ReasoningProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, sift_providers::Result<Value>>;
}

/// Hybrid-search backend holding the knowledge collections.
pub trait CollectionProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a CollectionProviderConfig,
		params: SearchParams<'a>,
	) -> BoxFuture<'a, sift_providers::Result<SearchPage>>;
}

/// Cross-encoder backend that scores documents against a query.
pub trait RerankProvider
where
	Self: Send + Sync,
{
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
		top_n: usize,
	) -> BoxFuture<'a, sift_providers::Result<Vec<RerankHit>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub reasoning: Arc<dyn ReasoningProvider>,
	pub collections: Arc<dyn CollectionProvider>,
	pub rerank: Arc<dyn RerankProvider>,
}
impl Providers {
	pub fn new(
		reasoning: Arc<dyn ReasoningProvider>,
		collections: Arc<dyn CollectionProvider>,
		rerank: Arc<dyn RerankProvider>,
	) -> Self {
		Self { reasoning, collections, rerank }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { reasoning: provider.clone(), collections: provider.clone(), rerank: provider }
	}
}

/// The retrieval pipeline and the backends it talks to. Holds no per-request state, so one
/// instance serves every request.
pub struct SiftService {
	pub cfg: Config,
	pub providers: Providers,
}
impl SiftService {
	pub fn new(cfg: Config) -> Self {
		Self { cfg, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		Self { cfg, providers }
	}
}

struct DefaultProviders;
impl ReasoningProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, sift_providers::Result<Value>> {
		Box::pin(chat::complete_json(cfg, messages))
	}
}
impl CollectionProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a CollectionProviderConfig,
		params: SearchParams<'a>,
	) -> BoxFuture<'a, sift_providers::Result<SearchPage>> {
		Box::pin(collections::search(cfg, params))
	}
}
impl RerankProvider for DefaultProviders {
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
		top_n: usize,
	) -> BoxFuture<'a, sift_providers::Result<Vec<RerankHit>>> {
		Box::pin(rerank_api::rerank(cfg, query, docs, top_n))
	}
}
