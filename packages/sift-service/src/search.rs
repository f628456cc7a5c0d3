pub mod fusion;
pub mod query;
pub mod rerank;

use std::{
	future::Future,
	time::{Duration, Instant},
};

use tokio::time;

use crate::{
	Error, Result, SearchService,
	search::{fusion::fuse, query::validate_request, rerank::RerankOutcome},
	types::{
		Candidate, Degradation, IndexHit, Origin, Query, ResultSet, ScoredResult, SearchDiagnostics,
		SearchRequest, StageLatencies,
	},
};

struct SourceFetch {
	origin: Origin,
	outcome: Result<Vec<Candidate>, String>,
	elapsed: Duration,
}

/// Joined outcome of the dense and sparse fan-out.
enum Retrieval {
	Both { dense: Vec<Candidate>, sparse: Vec<Candidate> },
	DenseOnly { dense: Vec<Candidate>, sparse_error: String },
	SparseOnly { sparse: Vec<Candidate>, dense_error: String },
	Neither { dense_error: String, sparse_error: String },
}
impl Retrieval {
	fn join(dense: SourceFetch, sparse: SourceFetch) -> Self {
		match (dense.outcome, sparse.outcome) {
			(Ok(dense), Ok(sparse)) => Self::Both { dense, sparse },
			(Ok(dense), Err(sparse_error)) => Self::DenseOnly { dense, sparse_error },
			(Err(dense_error), Ok(sparse)) => Self::SparseOnly { sparse, dense_error },
			(Err(dense_error), Err(sparse_error)) => Self::Neither { dense_error, sparse_error },
		}
	}
}

impl SearchService {
	/// Runs one hybrid search: concurrent dense and sparse retrieval, reciprocal rank fusion,
	/// reranking of the fused head, source-type filtering and truncation to the requested limit.
	///
	/// Losing one candidate store or the reranker degrades the response (see
	/// [`SearchDiagnostics::degradations`]); losing both stores fails with
	/// [`Error::SearchUnavailable`]. Dropping the future cancels all in-flight collaborator calls.
	pub async fn search(&self, req: SearchRequest) -> Result<ResultSet> {
		let started = Instant::now();
		let query = validate_request(req, &self.cfg)?;
		let candidate_k = self.cfg.candidate_k as usize;
		let fetch_timeout = Duration::from_millis(self.cfg.timeouts.candidate_fetch_ms);
		let (dense, sparse) = tokio::join!(
			fetch_candidates(
				Origin::Dense,
				self.collaborators.dense.query(query.text(), candidate_k),
				candidate_k,
				fetch_timeout,
			),
			fetch_candidates(
				Origin::Sparse,
				self.collaborators.sparse.query(query.text(), candidate_k),
				candidate_k,
				fetch_timeout,
			),
		);
		let mut diagnostics = SearchDiagnostics {
			latency: StageLatencies {
				dense_ms: millis(dense.elapsed),
				sparse_ms: millis(sparse.elapsed),
				..Default::default()
			},
			..Default::default()
		};

		for fetch in [&dense, &sparse] {
			tracing::debug!(
				origin = %fetch.origin,
				ok = fetch.outcome.is_ok(),
				elapsed_ms = millis(fetch.elapsed),
				"Candidate fetch finished."
			);
		}

		let (dense, sparse) = match Retrieval::join(dense, sparse) {
			Retrieval::Both { dense, sparse } => (dense, sparse),
			Retrieval::DenseOnly { dense, sparse_error } => {
				tracing::warn!(error = %sparse_error, "Sparse index unavailable; using dense only.");

				diagnostics.degradations.push(Degradation::SparseUnavailable { reason: sparse_error });

				(dense, Vec::new())
			},
			Retrieval::SparseOnly { sparse, dense_error } => {
				tracing::warn!(error = %dense_error, "Dense index unavailable; using sparse only.");

				diagnostics.degradations.push(Degradation::DenseUnavailable { reason: dense_error });

				(Vec::new(), sparse)
			},
			Retrieval::Neither { dense_error, sparse_error } => {
				tracing::error!(
					dense_error = %dense_error,
					sparse_error = %sparse_error,
					"Both candidate indices unavailable."
				);

				return Err(Error::SearchUnavailable { dense: dense_error, sparse: sparse_error });
			},
		};

		diagnostics.dense_candidates = dense.len();
		diagnostics.sparse_candidates = sparse.len();

		let fusion_started = Instant::now();
		let fused = fuse(dense, sparse, self.cfg.rrf_k)?;

		diagnostics.latency.fusion_ms = millis(fusion_started.elapsed());
		diagnostics.candidates_considered = fused.len();

		let rerank_started = Instant::now();
		let outcome = rerank::rerank(
			&self.collaborators.rerank,
			query.text(),
			fused,
			self.cfg.rerank_top_n as usize,
			Duration::from_millis(self.cfg.timeouts.rerank_ms),
		)
		.await;

		diagnostics.latency.rerank_ms = millis(rerank_started.elapsed());

		let ranked = match outcome {
			RerankOutcome::Reranked { results, failures } => {
				diagnostics.reranked = results.len();
				diagnostics.rerank_failures = failures;

				results
			},
			RerankOutcome::TotalFailure { candidates, failures } => {
				let reason = format!("All {} rerank requests failed.", failures.len());

				tracing::warn!(
					failed = failures.len(),
					"Reranker unavailable; falling back to fused order."
				);

				diagnostics.rerank_failures = failures;
				diagnostics.degradations.push(Degradation::RerankUnavailable { reason });

				candidates.into_iter().map(ScoredResult::unreranked).collect()
			},
		};
		let results = filter_and_truncate(ranked, &query);

		diagnostics.latency.total_ms = millis(started.elapsed());

		tracing::info!(
			results = results.len(),
			candidates = diagnostics.candidates_considered,
			degraded = !diagnostics.degradations.is_empty(),
			total_ms = diagnostics.latency.total_ms,
			"Search finished."
		);

		Ok(ResultSet { results, diagnostics })
	}
}

async fn fetch_candidates<F>(
	origin: Origin,
	request: F,
	candidate_k: usize,
	timeout: Duration,
) -> SourceFetch
where
	F: Future<Output = Result<Vec<IndexHit>>>,
{
	let started = Instant::now();
	let outcome = match time::timeout(timeout, request).await {
		Ok(Ok(mut hits)) => {
			hits.truncate(candidate_k);

			Ok(Candidate::from_hits(origin, hits))
		},
		Ok(Err(err)) => Err(err.to_string()),
		Err(_) => Err(format!("{origin} index timed out after {} ms.", timeout.as_millis())),
	};

	SourceFetch { origin, outcome, elapsed: started.elapsed() }
}

/// Source-type filtering runs after reranking so rerank scores come from the full candidate
/// pool. Filtered-out slots are not backfilled.
fn filter_and_truncate(ranked: Vec<ScoredResult>, query: &Query) -> Vec<ScoredResult> {
	ranked
		.into_iter()
		.filter(|result| query.source_type().is_none_or(|wanted| result.chunk().source_type == wanted))
		.take(query.limit() as usize)
		.collect()
}

fn millis(elapsed: Duration) -> f64 {
	elapsed.as_secs_f64() * 1_000.0
}
