use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
	Code,
	Doc,
	Markdown,
	Pdf,
}
impl SourceType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Code => "code",
			Self::Doc => "doc",
			Self::Markdown => "markdown",
			Self::Pdf => "pdf",
		}
	}
}

impl fmt::Display for SourceType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SourceType {
	type Err = Error;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.trim().to_ascii_lowercase().as_str() {
			"code" => Ok(Self::Code),
			"doc" => Ok(Self::Doc),
			"markdown" => Ok(Self::Markdown),
			"pdf" => Ok(Self::Pdf),
			other => Err(Error::InvalidQuery { message: format!("Unknown source type {other:?}.") }),
		}
	}
}

/// Which candidate store produced a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
	Dense,
	Sparse,
}
impl Origin {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Dense => "dense",
			Self::Sparse => "sparse",
		}
	}
}

impl fmt::Display for Origin {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Similarity or lexical score as reported by one candidate store. Only meaningful against other
/// scores from the same store and the same query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OriginScore(f32);
impl OriginScore {
	pub fn new(value: f32) -> Self {
		Self(value)
	}

	pub fn value(self) -> f32 {
		self.0
	}
}

/// Accumulated reciprocal rank contribution. Comparable only within one fusion run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FusionScore(f64);
impl FusionScore {
	pub(crate) fn zero() -> Self {
		Self(0.0)
	}

	pub(crate) fn accumulate(self, contribution: f64) -> Self {
		Self(self.0 + contribution)
	}

	pub(crate) fn cmp_desc(self, other: Self) -> Ordering {
		other.0.total_cmp(&self.0)
	}

	pub fn value(self) -> f64 {
		self.0
	}
}

/// Cross-encoder relevance for one (query, chunk) pair. Comparable only within one rerank run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RerankScore(f32);
impl RerankScore {
	pub(crate) fn new(value: f32) -> Self {
		Self(value)
	}

	pub(crate) fn cmp_desc(self, other: Self) -> Ordering {
		other.0.total_cmp(&self.0)
	}

	pub fn value(self) -> f32 {
		self.0
	}
}

/// Optional location details recorded at ingestion time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub chunk_index: Option<i32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub page_number: Option<i32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub function_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub class_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub section_title: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub start_line: Option<i32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub end_line: Option<i32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub header_level: Option<i32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub element_type: Option<String>,
}

/// One row of a candidate store response, in the store's best-first order.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
	pub chunk_id: String,
	pub source_id: String,
	pub text: String,
	pub source_type: SourceType,
	pub score: f32,
	pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
	pub chunk_id: String,
	pub source_id: String,
	pub text: String,
	pub source_type: SourceType,
	pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
	pub chunk: Chunk,
	pub origin: Origin,
	pub origin_score: OriginScore,
	/// 1-based position in the origin list.
	pub origin_rank: u32,
}
impl Candidate {
	/// Tags every hit with `origin` and assigns 1-based origin ranks in list order.
	pub fn from_hits(origin: Origin, hits: Vec<IndexHit>) -> Vec<Self> {
		hits.into_iter()
			.enumerate()
			.map(|(idx, hit)| Self {
				chunk: Chunk {
					chunk_id: hit.chunk_id,
					source_id: hit.source_id,
					text: hit.text,
					source_type: hit.source_type,
					metadata: hit.metadata,
				},
				origin,
				origin_score: OriginScore::new(hit.score),
				origin_rank: idx as u32 + 1,
			})
			.collect()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OriginHit {
	pub score: OriginScore,
	pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
	pub chunk: Chunk,
	pub dense: Option<OriginHit>,
	pub sparse: Option<OriginHit>,
	pub fusion_score: FusionScore,
	pub fusion_rank: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
	#[serde(flatten)]
	pub ranked: RankedCandidate,
	/// Absent only when the response is degraded to fused order.
	pub rerank_score: Option<RerankScore>,
}
impl ScoredResult {
	pub(crate) fn reranked(ranked: RankedCandidate, score: RerankScore) -> Self {
		Self { ranked, rerank_score: Some(score) }
	}

	pub(crate) fn unreranked(ranked: RankedCandidate) -> Self {
		Self { ranked, rerank_score: None }
	}

	pub fn chunk(&self) -> &Chunk {
		&self.ranked.chunk
	}

	pub fn chunk_id(&self) -> &str {
		self.ranked.chunk.chunk_id.as_str()
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	pub limit: Option<u32>,
	pub source_type: Option<SourceType>,
}

/// A validated search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
	text: String,
	source_type: Option<SourceType>,
	limit: u32,
}
impl Query {
	pub(crate) fn new(text: String, source_type: Option<SourceType>, limit: u32) -> Self {
		Self { text, source_type, limit }
	}

	pub fn text(&self) -> &str {
		self.text.as_str()
	}

	pub fn source_type(&self) -> Option<SourceType> {
		self.source_type
	}

	pub fn limit(&self) -> u32 {
		self.limit
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
	DenseUnavailable { reason: String },
	SparseUnavailable { reason: String },
	RerankUnavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RerankFailure {
	pub chunk_id: String,
	pub message: String,
}

/// Wall-clock time per stage, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageLatencies {
	pub dense_ms: f64,
	pub sparse_ms: f64,
	pub fusion_ms: f64,
	pub rerank_ms: f64,
	pub total_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchDiagnostics {
	pub dense_candidates: usize,
	pub sparse_candidates: usize,
	/// Distinct chunks after fusion.
	pub candidates_considered: usize,
	pub reranked: usize,
	pub rerank_failures: Vec<RerankFailure>,
	pub degradations: Vec<Degradation>,
	pub latency: StageLatencies,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultSet {
	pub results: Vec<ScoredResult>,
	pub diagnostics: SearchDiagnostics,
}
impl ResultSet {
	pub fn is_degraded(&self) -> bool {
		!self.diagnostics.degradations.is_empty()
	}

	pub fn chunk_ids(&self) -> Vec<&str> {
		self.results.iter().map(ScoredResult::chunk_id).collect()
	}
}
