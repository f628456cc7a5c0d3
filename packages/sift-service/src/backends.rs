//! Qdrant-backed candidate stores.

mod payload;

use std::sync::Arc;

use sift_storage::qdrant::QdrantStore;

use crate::{BoxFuture, DenseIndex, EmbeddingProvider, Error, IndexHit, Result, SparseIndex};

pub struct QdrantDenseIndex {
	store: Arc<QdrantStore>,
	embedder: Arc<dyn EmbeddingProvider>,
}
impl QdrantDenseIndex {
	pub fn new(store: Arc<QdrantStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
		Self { store, embedder }
	}

	/// Dimension checks happen in [`QdrantStore::dense_query`].
	async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
		let embeddings = self.embedder.embed(std::slice::from_ref(&text.to_string())).await?;

		embeddings.into_iter().next().ok_or_else(|| Error::Provider {
			message: "Embedding provider returned no vectors.".to_string(),
		})
	}
}

impl DenseIndex for QdrantDenseIndex {
	fn query<'a>(&'a self, text: &'a str, k: usize) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		Box::pin(async move {
			let vector = self.embed_query(text).await?;
			let points = self.store.dense_query(vector, k as u64).await?;

			Ok(payload::decode_points(&points))
		})
	}
}

pub struct QdrantSparseIndex {
	store: Arc<QdrantStore>,
}
impl QdrantSparseIndex {
	pub fn new(store: Arc<QdrantStore>) -> Self {
		Self { store }
	}
}

impl SparseIndex for QdrantSparseIndex {
	fn query<'a>(&'a self, text: &'a str, k: usize) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		Box::pin(async move {
			let points = self.store.bm25_query(text, k as u64).await?;

			Ok(payload::decode_points(&points))
		})
	}
}
