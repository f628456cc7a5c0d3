pub mod backends;
pub mod search;
pub mod types;

mod error;

pub use error::{Error, Result};
pub use search::{
	fusion::{DEFAULT_RRF_K, FusionError, fuse, rrf_contribution},
	rerank::{RerankOutcome, rerank},
};
pub use types::{
	Candidate, Chunk, ChunkMetadata, Degradation, FusionScore, IndexHit, Origin, OriginHit,
	OriginScore, Query, RankedCandidate, RerankFailure, RerankScore, ResultSet, ScoredResult,
	SearchDiagnostics, SearchRequest, SourceType, StageLatencies,
};

use std::{future::Future, pin::Pin, sync::Arc};

use sift_config::Config;
use sift_providers::{embedding::HttpEmbedder, rerank::HttpReranker};
use sift_storage::qdrant::QdrantStore;

use crate::backends::{QdrantDenseIndex, QdrantSparseIndex};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Top-k retrieval by vector similarity. Query embedding happens behind this boundary.
pub trait DenseIndex
where
	Self: Send + Sync,
{
	fn query<'a>(&'a self, text: &'a str, k: usize) -> BoxFuture<'a, Result<Vec<IndexHit>>>;
}

/// Top-k retrieval by lexical relevance.
pub trait SparseIndex
where
	Self: Send + Sync,
{
	fn query<'a>(&'a self, text: &'a str, k: usize) -> BoxFuture<'a, Result<Vec<IndexHit>>>;
}

/// Pairwise relevance scorer. Must be a pure function of its inputs.
pub trait RerankScorer
where
	Self: Send + Sync,
{
	fn score<'a>(&'a self, query: &'a str, text: &'a str) -> BoxFuture<'a, Result<f32>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

/// Process-wide handles shared by every search. Cloning only bumps reference counts.
#[derive(Clone)]
pub struct Collaborators {
	pub dense: Arc<dyn DenseIndex>,
	pub sparse: Arc<dyn SparseIndex>,
	pub rerank: Arc<dyn RerankScorer>,
}
impl Collaborators {
	pub fn new(
		dense: Arc<dyn DenseIndex>,
		sparse: Arc<dyn SparseIndex>,
		rerank: Arc<dyn RerankScorer>,
	) -> Self {
		Self { dense, sparse, rerank }
	}

	/// Qdrant for both indices, HTTP providers for embeddings and reranking.
	pub fn from_config(cfg: &Config) -> Result<Self> {
		let store = Arc::new(QdrantStore::new(&cfg.storage.qdrant)?);
		let embedder: Arc<dyn EmbeddingProvider> =
			Arc::new(HttpEmbedder::new(&cfg.providers.embedding)?);
		let reranker = Arc::new(HttpReranker::new(&cfg.providers.rerank)?);

		Ok(Self {
			dense: Arc::new(QdrantDenseIndex::new(store.clone(), embedder)),
			sparse: Arc::new(QdrantSparseIndex::new(store)),
			rerank: reranker,
		})
	}
}

pub struct SearchService {
	pub cfg: sift_config::Search,
	pub collaborators: Collaborators,
}
impl SearchService {
	pub fn new(cfg: sift_config::Search, collaborators: Collaborators) -> Result<Self> {
		sift_config::validate_search(&cfg)?;

		Ok(Self { cfg, collaborators })
	}

	pub fn from_config(cfg: &Config) -> Result<Self> {
		Self::new(cfg.search.clone(), Collaborators::from_config(cfg)?)
	}
}

impl EmbeddingProvider for HttpEmbedder {
	fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(HttpEmbedder::embed(self, texts).await?) })
	}
}

impl RerankScorer for HttpReranker {
	fn score<'a>(&'a self, query: &'a str, text: &'a str) -> BoxFuture<'a, Result<f32>> {
		Box::pin(async move { Ok(HttpReranker::score(self, query, text).await?) })
	}
}
