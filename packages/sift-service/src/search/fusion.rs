//! Reciprocal Rank Fusion over the dense and sparse candidate lists.
//!
//! A candidate at 1-based rank `r` in a list contributes `1 / (k + r)`; a chunk found by both
//! stores sums both contributions. Only ranks are used, so the two stores' raw scores never meet.

use std::collections::{HashMap, HashSet, hash_map::Entry};

use crate::types::{Candidate, Chunk, FusionScore, Origin, OriginHit, RankedCandidate};

pub const DEFAULT_RRF_K: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FusionError {
	#[error("RRF k must be at least 1.")]
	InvalidK,
	#[error("The {origin} index returned chunk {chunk_id} more than once.")]
	DuplicateChunk { origin: Origin, chunk_id: String },
}

struct Accumulator {
	chunk: Chunk,
	dense: Option<OriginHit>,
	sparse: Option<OriginHit>,
	score: FusionScore,
}

pub fn rrf_contribution(k: u32, rank: u32) -> f64 {
	1.0 / (f64::from(k) + f64::from(rank))
}

/// Merges both lists into one ranking ordered by fusion score descending, then chunk id
/// ascending. Either list may be empty. A candidate's own `origin` decides which side of the
/// [`RankedCandidate`] its hit lands on; dense candidates are visited first.
pub fn fuse(
	dense: Vec<Candidate>,
	sparse: Vec<Candidate>,
	k: u32,
) -> Result<Vec<RankedCandidate>, FusionError> {
	if k == 0 {
		return Err(FusionError::InvalidK);
	}

	let mut by_chunk: HashMap<String, Accumulator> = HashMap::new();

	let mut seen = HashSet::new();

	for candidate in dense.into_iter().chain(sparse) {
		let origin = candidate.origin;

		if !seen.insert((origin, candidate.chunk.chunk_id.clone())) {
			return Err(FusionError::DuplicateChunk { origin, chunk_id: candidate.chunk.chunk_id });
		}

		let hit = OriginHit { score: candidate.origin_score, rank: candidate.origin_rank };
		let contribution = rrf_contribution(k, candidate.origin_rank);

		match by_chunk.entry(candidate.chunk.chunk_id.clone()) {
			Entry::Occupied(mut entry) => {
				let acc = entry.get_mut();

				acc.score = acc.score.accumulate(contribution);

				match origin {
					Origin::Dense => acc.dense = Some(hit),
					Origin::Sparse => acc.sparse = Some(hit),
				}
			},
			Entry::Vacant(entry) => {
				let (dense, sparse) = match origin {
					Origin::Dense => (Some(hit), None),
					Origin::Sparse => (None, Some(hit)),
				};

				entry.insert(Accumulator {
					chunk: candidate.chunk,
					dense,
					sparse,
					score: FusionScore::zero().accumulate(contribution),
				});
			},
		}
	}

	let mut merged: Vec<Accumulator> = by_chunk.into_values().collect();

	merged.sort_by(|left, right| {
		left.score.cmp_desc(right.score).then_with(|| left.chunk.chunk_id.cmp(&right.chunk.chunk_id))
	});

	Ok(merged
		.into_iter()
		.enumerate()
		.map(|(idx, acc)| RankedCandidate {
			chunk: acc.chunk,
			dense: acc.dense,
			sparse: acc.sparse,
			fusion_score: acc.score,
			fusion_rank: idx as u32 + 1,
		})
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::{ChunkMetadata, IndexHit, SourceType};

	fn dense(ids: &[&str]) -> Vec<Candidate> {
		hits(Origin::Dense, ids)
	}

	fn sparse(ids: &[&str]) -> Vec<Candidate> {
		hits(Origin::Sparse, ids)
	}

	fn hits(origin: Origin, ids: &[&str]) -> Vec<Candidate> {
		Candidate::from_hits(
			origin,
			ids.iter()
				.enumerate()
				.map(|(idx, id)| IndexHit {
					chunk_id: id.to_string(),
					source_id: format!("doc-{id}"),
					text: format!("text {id}"),
					source_type: SourceType::Doc,
					score: 1.0 - idx as f32 * 0.1,
					metadata: ChunkMetadata::default(),
				})
				.collect(),
		)
	}

	fn ids(ranked: &[RankedCandidate]) -> Vec<&str> {
		ranked.iter().map(|candidate| candidate.chunk.chunk_id.as_str()).collect()
	}

	#[test]
	fn fuses_overlapping_lists_by_reciprocal_rank() {
		let fused =
			fuse(dense(&["A", "B", "C"]), sparse(&["B", "C", "D"]), 60).expect("fuse failed");

		assert_eq!(ids(&fused), vec!["B", "C", "A", "D"]);

		let score = |id: &str| {
			fused
				.iter()
				.find(|candidate| candidate.chunk.chunk_id == id)
				.map(|candidate| candidate.fusion_score.value())
				.expect("missing candidate")
		};

		assert_eq!(score("A"), 1.0 / 61.0);
		assert_eq!(score("B"), 1.0 / 62.0 + 1.0 / 61.0);
		assert_eq!(score("C"), 1.0 / 63.0 + 1.0 / 62.0);
		assert_eq!(score("D"), 1.0 / 63.0);
		assert!((score("B") - 0.03253).abs() < 1e-5);
		assert!((score("C") - 0.03199).abs() < 1e-5);
	}

	#[test]
	fn records_ranks_from_each_origin() {
		let fused = fuse(dense(&["A", "B"]), sparse(&["B"]), 60).expect("fuse failed");
		let b = &fused[0];

		assert_eq!(b.chunk.chunk_id, "B");
		assert_eq!(b.dense.map(|hit| hit.rank), Some(2));
		assert_eq!(b.sparse.map(|hit| hit.rank), Some(1));
		assert_eq!(b.fusion_rank, 1);
		assert_eq!(fused[1].sparse, None);
		assert_eq!(fused[1].fusion_rank, 2);
	}

	#[test]
	fn ties_break_by_chunk_id_ascending() {
		// "z" and "a" both sit at rank 1 of one list each, so their scores are equal.
		let fused = fuse(dense(&["z"]), sparse(&["a"]), 60).expect("fuse failed");

		assert_eq!(ids(&fused), vec!["a", "z"]);
		assert_eq!(fused[0].fusion_score, fused[1].fusion_score);
	}

	#[test]
	fn repeated_fusion_is_identical() {
		let first = fuse(dense(&["m", "q", "b", "x"]), sparse(&["x", "c", "m", "y"]), 60)
			.expect("fuse failed");

		for _ in 0..16 {
			let again = fuse(dense(&["m", "q", "b", "x"]), sparse(&["x", "c", "m", "y"]), 60)
				.expect("fuse failed");

			assert_eq!(again, first);
		}
	}

	#[test]
	fn single_list_passes_through_in_rank_order() {
		let fused = fuse(Vec::new(), sparse(&["c", "a", "b"]), 60).expect("fuse failed");

		assert_eq!(ids(&fused), vec!["c", "a", "b"]);
		assert_eq!(fused[2].fusion_score.value(), 1.0 / 63.0);
	}

	#[test]
	fn empty_inputs_produce_empty_output() {
		assert!(fuse(Vec::new(), Vec::new(), 60).expect("fuse failed").is_empty());
	}

	#[test]
	fn larger_k_flattens_rank_differences() {
		let sharp = fuse(dense(&["a", "b"]), Vec::new(), 1).expect("fuse failed");
		let flat = fuse(dense(&["a", "b"]), Vec::new(), 1_000).expect("fuse failed");
		let ratio = |fused: &[RankedCandidate]| {
			fused[0].fusion_score.value() / fused[1].fusion_score.value()
		};

		assert!(ratio(&sharp) > ratio(&flat));
	}

	#[test]
	fn duplicate_within_one_origin_fails() {
		let err = fuse(dense(&["a", "b", "a"]), Vec::new(), 60).expect_err("expected duplicate");

		assert_eq!(
			err,
			FusionError::DuplicateChunk { origin: Origin::Dense, chunk_id: "a".to_string() }
		);
	}

	#[test]
	fn same_chunk_in_both_origins_is_not_a_duplicate() {
		let fused = fuse(dense(&["a"]), sparse(&["a"]), 60).expect("fuse failed");

		assert_eq!(fused.len(), 1);
		assert!(fused[0].dense.is_some() && fused[0].sparse.is_some());
	}

	#[test]
	fn duplicate_within_sparse_names_the_sparse_origin() {
		let err = fuse(dense(&["a"]), sparse(&["b", "b"]), 60).expect_err("expected duplicate");

		assert_eq!(
			err,
			FusionError::DuplicateChunk { origin: Origin::Sparse, chunk_id: "b".to_string() }
		);
	}

	#[test]
	fn zero_k_is_rejected() {
		assert_eq!(fuse(dense(&["a"]), Vec::new(), 0), Err(FusionError::InvalidK));
	}
}
