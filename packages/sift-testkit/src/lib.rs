//! In-memory collaborators for exercising the search pipeline without Qdrant or model servers.

use std::{
	collections::HashMap,
	sync::{
		Arc, Mutex,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
	time::Duration,
};

use sift_service::{
	BoxFuture, ChunkMetadata, Collaborators, DenseIndex, Error, IndexHit, RerankScorer, Result,
	SearchService, SourceType, SparseIndex,
};

/// A hit whose text equals its chunk id, so scorers can be keyed by id.
pub fn hit(chunk_id: &str, source_type: SourceType) -> IndexHit {
	IndexHit {
		chunk_id: chunk_id.to_string(),
		source_id: format!("source-{chunk_id}"),
		text: chunk_id.to_string(),
		source_type,
		score: 0.0,
		metadata: ChunkMetadata::default(),
	}
}

/// Hits in the given order with strictly decreasing origin scores.
pub fn hits(entries: &[(&str, SourceType)]) -> Vec<IndexHit> {
	entries
		.iter()
		.enumerate()
		.map(|(idx, (chunk_id, source_type))| IndexHit {
			score: 1.0 / (idx as f32 + 1.0),
			..hit(chunk_id, *source_type)
		})
		.collect()
}

pub fn doc_hits(ids: &[&str]) -> Vec<IndexHit> {
	let entries: Vec<(&str, SourceType)> = ids.iter().map(|id| (*id, SourceType::Doc)).collect();

	hits(&entries)
}

pub fn search_config() -> sift_config::Search {
	sift_config::Search {
		candidate_k: 40,
		default_limit: 10,
		max_limit: 20,
		rerank_top_n: 20,
		rrf_k: 60,
		timeouts: sift_config::SearchTimeouts { candidate_fetch_ms: 1_000, rerank_ms: 1_000 },
	}
}

pub fn service(
	cfg: sift_config::Search,
	dense: Arc<dyn DenseIndex>,
	sparse: Arc<dyn SparseIndex>,
	rerank: Arc<dyn RerankScorer>,
) -> SearchService {
	SearchService::new(cfg, Collaborators::new(dense, sparse, rerank))
		.expect("Test search config must be valid.")
}

/// Returns a fixed hit list, truncated to `k`.
pub struct StaticIndex {
	hits: Vec<IndexHit>,
	calls: AtomicUsize,
}
impl StaticIndex {
	pub fn new(hits: Vec<IndexHit>) -> Arc<Self> {
		Arc::new(Self { hits, calls: AtomicUsize::new(0) })
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn respond<'a>(&'a self, k: usize) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let hits = self.hits.iter().take(k).cloned().collect();

		Box::pin(async move { Ok(hits) })
	}
}

impl DenseIndex for StaticIndex {
	fn query<'a>(&'a self, _text: &'a str, k: usize) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		self.respond(k)
	}
}

impl SparseIndex for StaticIndex {
	fn query<'a>(&'a self, _text: &'a str, k: usize) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		self.respond(k)
	}
}

pub struct FailingIndex {
	message: String,
	calls: AtomicUsize,
}
impl FailingIndex {
	pub fn new(message: &str) -> Arc<Self> {
		Arc::new(Self { message: message.to_string(), calls: AtomicUsize::new(0) })
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn respond<'a>(&'a self) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let message = self.message.clone();

		Box::pin(async move { Err(Error::Provider { message }) })
	}
}

impl DenseIndex for FailingIndex {
	fn query<'a>(&'a self, _text: &'a str, _k: usize) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		self.respond()
	}
}

impl SparseIndex for FailingIndex {
	fn query<'a>(&'a self, _text: &'a str, _k: usize) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		self.respond()
	}
}

/// Sets a flag if its future is dropped before completing.
struct DropProbe {
	flag: Arc<AtomicBool>,
	armed: bool,
}
impl DropProbe {
	fn new(flag: Arc<AtomicBool>) -> Self {
		Self { flag, armed: true }
	}

	fn disarm(mut self) {
		self.armed = false;
	}
}

impl Drop for DropProbe {
	fn drop(&mut self) {
		if self.armed {
			self.flag.store(true, Ordering::SeqCst);
		}
	}
}

/// Sleeps for `delay` before answering with `hits`. Records whether it was abandoned.
pub struct SlowIndex {
	hits: Vec<IndexHit>,
	delay: Duration,
	abandoned: Arc<AtomicBool>,
}
impl SlowIndex {
	pub fn new(hits: Vec<IndexHit>, delay: Duration) -> Arc<Self> {
		Arc::new(Self { hits, delay, abandoned: Arc::new(AtomicBool::new(false)) })
	}

	pub fn was_abandoned(&self) -> bool {
		self.abandoned.load(Ordering::SeqCst)
	}

	fn respond<'a>(&'a self, k: usize) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		let probe = DropProbe::new(self.abandoned.clone());

		Box::pin(async move {
			tokio::time::sleep(self.delay).await;
			probe.disarm();

			Ok(self.hits.iter().take(k).cloned().collect())
		})
	}
}

impl DenseIndex for SlowIndex {
	fn query<'a>(&'a self, _text: &'a str, k: usize) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		self.respond(k)
	}
}

impl SparseIndex for SlowIndex {
	fn query<'a>(&'a self, _text: &'a str, k: usize) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		self.respond(k)
	}
}

/// Scores by exact candidate text. Unknown texts fail, which models per-pair scorer errors.
pub struct TableScorer {
	scores: HashMap<String, f32>,
	delay: Option<Duration>,
	scored: Mutex<Vec<String>>,
}
impl TableScorer {
	pub fn new(scores: &[(&str, f32)]) -> Arc<Self> {
		Arc::new(Self::build(scores, None))
	}

	/// Every call sleeps for `delay` first.
	pub fn slow(scores: &[(&str, f32)], delay: Duration) -> Arc<Self> {
		Arc::new(Self::build(scores, Some(delay)))
	}

	fn build(scores: &[(&str, f32)], delay: Option<Duration>) -> Self {
		Self {
			scores: scores.iter().map(|(text, score)| (text.to_string(), *score)).collect(),
			delay,
			scored: Mutex::new(Vec::new()),
		}
	}

	/// Texts passed to the scorer so far, sorted.
	pub fn scored_texts(&self) -> Vec<String> {
		let mut texts = self.scored.lock().unwrap_or_else(|err| err.into_inner()).clone();

		texts.sort();

		texts
	}

	pub fn calls(&self) -> usize {
		self.scored.lock().unwrap_or_else(|err| err.into_inner()).len()
	}
}

impl RerankScorer for TableScorer {
	fn score<'a>(&'a self, _query: &'a str, text: &'a str) -> BoxFuture<'a, Result<f32>> {
		self.scored.lock().unwrap_or_else(|err| err.into_inner()).push(text.to_string());

		let score = self
			.scores
			.get(text)
			.copied()
			.ok_or_else(|| Error::Provider { message: format!("No rerank score for {text}.") });
		let delay = self.delay;

		Box::pin(async move {
			if let Some(delay) = delay {
				tokio::time::sleep(delay).await;
			}

			score
		})
	}
}
