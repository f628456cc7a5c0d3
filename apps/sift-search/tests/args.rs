use clap::Parser;

use sift_search::{Args, render};
use sift_service::{ResultSet, SearchDiagnostics, SourceType};

#[test]
fn parses_search_arguments() {
	let args = Args::try_parse_from([
		"sift-search",
		"--config",
		"sift.toml",
		"--query",
		"  how are chunks fused  ",
		"--limit",
		"5",
		"--source-type",
		"code",
	])
	.expect("Failed to parse arguments.");
	let request = args.request();

	assert_eq!(request.query, "how are chunks fused");
	assert_eq!(request.limit, Some(5));
	assert_eq!(request.source_type, Some(SourceType::Code));
	assert!(!args.pretty);
}

#[test]
fn limit_and_source_type_are_optional() {
	let args = Args::try_parse_from(["sift-search", "-c", "sift.toml", "-q", "fusion"])
		.expect("Failed to parse arguments.");

	assert_eq!(args.limit, None);
	assert_eq!(args.source_type, None);
}

#[test]
fn rejects_blank_query_and_unknown_source_type() {
	assert!(Args::try_parse_from(["sift-search", "-c", "sift.toml", "-q", "   "]).is_err());
	assert!(
		Args::try_parse_from(["sift-search", "-c", "sift.toml", "-q", "x", "-t", "spreadsheet"])
			.is_err()
	);
}

#[test]
fn renders_empty_result_as_json() {
	let result = ResultSet { results: Vec::new(), diagnostics: SearchDiagnostics::default() };
	let rendered = render(&result, false).expect("Failed to render result.");
	let value: serde_json::Value = serde_json::from_str(&rendered).expect("Invalid JSON.");

	assert_eq!(value["results"], serde_json::json!([]));
	assert_eq!(value["diagnostics"]["degradations"], serde_json::json!([]));
}
