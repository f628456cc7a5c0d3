use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub search: Search,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub rerank: ProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
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

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	/// Per-source candidate cap (K). Must be at least `max_limit`.
	pub candidate_k: u32,
	/// Limit applied when a request does not carry one.
	pub default_limit: u32,
	/// Largest limit a request may ask for.
	pub max_limit: u32,
	/// Number of fused candidates sent to the reranker.
	pub rerank_top_n: u32,
	/// RRF smoothing constant.
	#[serde(default = "default_rrf_k")]
	pub rrf_k: u32,
	pub timeouts: SearchTimeouts,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchTimeouts {
	pub candidate_fetch_ms: u64,
	pub rerank_ms: u64,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_rrf_k() -> u32 {
	60
}
