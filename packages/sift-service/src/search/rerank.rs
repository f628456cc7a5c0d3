//! Second-pass precision scoring over the head of the fused list.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinSet, time};

use crate::{
	RerankScorer,
	types::{RankedCandidate, RerankFailure, RerankScore, ScoredResult},
};

#[derive(Debug)]
pub enum RerankOutcome {
	Reranked { results: Vec<ScoredResult>, failures: Vec<RerankFailure> },
	/// Every attempted pair failed. Carries the `top_n` slice in fused order for fallback.
	TotalFailure { candidates: Vec<RankedCandidate>, failures: Vec<RerankFailure> },
}

/// Scores the first `top_n` fused candidates against `query` and sorts them by rerank score
/// descending, then fusion rank, then chunk id. Candidates past `top_n` are dropped.
///
/// Pairs are scored concurrently, each bounded by `timeout`. Dropping the returned future aborts
/// any scoring still in flight.
pub async fn rerank(
	scorer: &Arc<dyn RerankScorer>,
	query: &str,
	mut candidates: Vec<RankedCandidate>,
	top_n: usize,
	timeout: Duration,
) -> RerankOutcome {
	candidates.truncate(top_n);

	if candidates.is_empty() {
		return RerankOutcome::Reranked { results: Vec::new(), failures: Vec::new() };
	}

	let mut tasks = JoinSet::new();

	for (slot, candidate) in candidates.iter().enumerate() {
		let scorer = Arc::clone(scorer);
		let query = query.to_string();
		let text = candidate.chunk.text.clone();

		tasks.spawn(async move {
			let scored = time::timeout(timeout, scorer.score(&query, &text)).await;

			(slot, scored)
		});
	}

	// Slots stay `None` only if a scoring task panicked.
	let mut outcomes: Vec<Option<Result<f32, String>>> = vec![None; candidates.len()];

	while let Some(joined) = tasks.join_next().await {
		match joined {
			Ok((slot, Ok(Ok(score)))) if score.is_finite() => outcomes[slot] = Some(Ok(score)),
			Ok((slot, Ok(Ok(score)))) =>
				outcomes[slot] =
					Some(Err(format!("Rerank scorer returned non-finite score {score}."))),
			Ok((slot, Ok(Err(err)))) => outcomes[slot] = Some(Err(err.to_string())),
			Ok((slot, Err(_))) =>
				outcomes[slot] = Some(Err(format!(
					"Rerank scoring timed out after {} ms.",
					timeout.as_millis()
				))),
			Err(err) => tracing::warn!(error = %err, "Rerank scoring task failed."),
		}
	}

	let attempted = candidates.len();
	let mut scored = Vec::with_capacity(attempted);
	let mut failures = Vec::new();

	for (candidate, outcome) in candidates.iter().zip(outcomes) {
		let message = match outcome {
			Some(Ok(score)) => {
				scored.push((RerankScore::new(score), candidate.clone()));

				continue;
			},
			Some(Err(message)) => message,
			None => "Rerank scoring task produced no result.".to_string(),
		};

		tracing::warn!(
			chunk_id = %candidate.chunk.chunk_id,
			fusion_rank = candidate.fusion_rank,
			error = %message,
			"Rerank scoring failed for candidate."
		);

		failures.push(RerankFailure { chunk_id: candidate.chunk.chunk_id.clone(), message });
	}

	if failures.len() == attempted {
		return RerankOutcome::TotalFailure { candidates, failures };
	}

	scored.sort_by(|(lhs_score, lhs), (rhs_score, rhs)| {
		lhs_score
			.cmp_desc(*rhs_score)
			.then_with(|| lhs.fusion_rank.cmp(&rhs.fusion_rank))
			.then_with(|| lhs.chunk.chunk_id.cmp(&rhs.chunk.chunk_id))
	});

	let results =
		scored.into_iter().map(|(score, ranked)| ScoredResult::reranked(ranked, score)).collect();

	RerankOutcome::Reranked { results, failures }
}
