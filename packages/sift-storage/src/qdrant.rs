pub const DENSE_VECTOR_NAME: &str = "dense";
pub const BM25_VECTOR_NAME: &str = "bm25";
pub const BM25_MODEL: &str = "qdrant/bm25";

use qdrant_client::qdrant::{Document, Query, QueryPointsBuilder, ScoredPoint};

use crate::{Error, Result};

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &sift_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Nearest neighbours on the dense named vector, best first.
	pub async fn dense_query(&self, vector: Vec<f32>, limit: u64) -> Result<Vec<ScoredPoint>> {
		if vector.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Query vector has {} dimensions; collection expects {}.",
				vector.len(),
				self.vector_dim
			)));
		}

		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.using(DENSE_VECTOR_NAME)
			.with_payload(true)
			.limit(limit);
		let response = self.client.query(search).await?;

		Ok(response.result)
	}

	/// BM25 ranking on the sparse named vector, best first. Qdrant tokenizes the text server side.
	pub async fn bm25_query(&self, text: &str, limit: u64) -> Result<Vec<ScoredPoint>> {
		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(Document::new(text.to_string(), BM25_MODEL)))
			.using(BM25_VECTOR_NAME)
			.with_payload(true)
			.limit(limit);
		let response = self.client.query(search).await?;

		Ok(response.result)
	}
}
