use reqwest::header::AUTHORIZATION;
use serde_json::Map;

use sift_config::ProviderConfig;
use sift_providers::{Error, rerank::HttpReranker};

#[test]
fn builds_bearer_auth_header() {
	let headers =
		sift_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut default_headers = Map::new();

	default_headers.insert("x-retries".to_string(), serde_json::json!(3));

	let err = sift_providers::auth_headers("secret", &default_headers)
		.expect_err("Expected header validation error.");

	assert!(matches!(err, Error::NonStringHeader { ref name } if name == "x-retries"));
}

#[tokio::test]
async fn unreachable_rerank_endpoint_reports_transport_error() {
	let cfg = ProviderConfig {
		provider_id: "p".to_string(),
		api_base: "http://127.0.0.1:9".to_string(),
		api_key: "key".to_string(),
		path: "/rerank".to_string(),
		model: "m".to_string(),
		timeout_ms: 500,
		default_headers: Map::new(),
	};
	let reranker = HttpReranker::new(&cfg).expect("Failed to build reranker.");
	let err = reranker.score("query", "doc").await.expect_err("Expected transport error.");

	assert!(matches!(err, Error::Http(_)));
}
