use crate::{
	Error, Result,
	types::{Query, SearchRequest},
};

pub fn validate_request(req: SearchRequest, cfg: &sift_config::Search) -> Result<Query> {
	let text = req.query.trim();

	if text.is_empty() {
		return Err(Error::InvalidQuery { message: "query must be non-empty.".to_string() });
	}

	let limit = req.limit.unwrap_or(cfg.default_limit);

	if limit == 0 || limit > cfg.max_limit {
		return Err(Error::InvalidQuery {
			message: format!("limit must be between 1 and {}.", cfg.max_limit),
		});
	}

	Ok(Query::new(text.to_string(), req.source_type, limit))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::SourceType;

	fn cfg() -> sift_config::Search {
		sift_config::Search {
			candidate_k: 40,
			default_limit: 10,
			max_limit: 20,
			rerank_top_n: 20,
			rrf_k: 60,
			timeouts: sift_config::SearchTimeouts { candidate_fetch_ms: 1_000, rerank_ms: 1_000 },
		}
	}

	fn request(query: &str, limit: Option<u32>) -> SearchRequest {
		SearchRequest { query: query.to_string(), limit, source_type: None }
	}

	#[test]
	fn rejects_blank_text() {
		let err = validate_request(request(" \t\n", None), &cfg()).expect_err("expected error");

		assert!(matches!(err, Error::InvalidQuery { .. }));
	}

	#[test]
	fn rejects_out_of_range_limits() {
		assert!(validate_request(request("q", Some(0)), &cfg()).is_err());
		assert!(validate_request(request("q", Some(21)), &cfg()).is_err());
		assert!(validate_request(request("q", Some(20)), &cfg()).is_ok());
	}

	#[test]
	fn applies_default_limit_and_trims_text() {
		let mut req = request("  parse config  ", None);

		req.source_type = Some(SourceType::Markdown);

		let query = validate_request(req, &cfg()).expect("expected valid query");

		assert_eq!(query.text(), "parse config");
		assert_eq!(query.limit(), 10);
		assert_eq!(query.source_type(), Some(SourceType::Markdown));
	}
}
