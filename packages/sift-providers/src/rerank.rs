use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use sift_config::ProviderConfig;

use crate::{Error, Result};

/// Cross-encoder rerank endpoint client (Cohere/Jina/TEI compatible response shapes).
pub struct HttpReranker {
	cfg: ProviderConfig,
	client: Client,
}
impl HttpReranker {
	pub fn new(cfg: &ProviderConfig) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self { cfg: cfg.clone(), client })
	}

	/// Scores one (query, document) pair with a single-document request.
	///
	/// The search pipeline calls this once per reranked candidate, so a search issues up to
	/// `rerank_top_n` HTTP requests here. [`HttpReranker::rerank`] sends a whole slice in one call.
	pub async fn score(&self, query: &str, doc: &str) -> Result<f32> {
		let scores = self.rerank(query, std::slice::from_ref(&doc.to_string())).await?;

		scores.into_iter().next().ok_or(Error::MissingScore { index: 0 })
	}

	pub async fn rerank(&self, query: &str, docs: &[String]) -> Result<Vec<f32>> {
		let url = crate::endpoint(&self.cfg.api_base, &self.cfg.path);
		let body = serde_json::json!({ "model": self.cfg.model, "query": query, "documents": docs });
		let res = self
			.client
			.post(url)
			.headers(crate::auth_headers(&self.cfg.api_key, &self.cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_rerank_response(json, docs.len())
	}
}

fn parse_rerank_response(json: Value, doc_count: usize) -> Result<Vec<f32>> {
	let results = json
		.get("results")
		.or_else(|| json.get("data"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| Error::MalformedResponse {
			message: "Rerank response is missing results array.".to_string(),
		})?;
	let mut scores: Vec<Option<f32>> = vec![None; doc_count];

	for item in results {
		let index = item.get("index").and_then(|v| v.as_u64()).ok_or_else(|| {
			Error::MalformedResponse { message: "Rerank result missing index.".to_string() }
		})? as usize;
		let score = item
			.get("relevance_score")
			.or_else(|| item.get("score"))
			.and_then(|v| v.as_f64())
			.ok_or_else(|| Error::MalformedResponse {
				message: "Rerank result missing score.".to_string(),
			})? as f32;

		if let Some(slot) = scores.get_mut(index) {
			*slot = Some(score);
		}
	}

	// A document the provider skipped has no score; treat that as a failed response.
	scores
		.into_iter()
		.enumerate()
		.map(|(index, score)| score.ok_or(Error::MissingScore { index }))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn aligns_scores_by_index() {
		let json = serde_json::json!({
			"results": [
				{ "index": 1, "relevance_score": 0.2 },
				{ "index": 0, "relevance_score": 0.9 }
			]
		});
		let scores = parse_rerank_response(json, 2).expect("parse failed");

		assert_eq!(scores, vec![0.9, 0.2]);
	}

	#[test]
	fn accepts_data_and_score_aliases() {
		let json = serde_json::json!({ "data": [{ "index": 0, "score": -1.5 }] });
		let scores = parse_rerank_response(json, 1).expect("parse failed");

		assert_eq!(scores, vec![-1.5]);
	}

	#[test]
	fn rejects_missing_document_scores() {
		let json = serde_json::json!({ "results": [{ "index": 0, "relevance_score": 0.4 }] });

		assert!(matches!(
			parse_rerank_response(json, 2),
			Err(Error::MissingScore { index: 1 })
		));
	}
}
