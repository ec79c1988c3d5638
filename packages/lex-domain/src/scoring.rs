use std::cmp::Ordering;

use unicode_segmentation::UnicodeSegmentation;

use crate::{Candidate, ScoredResult, SourceTier, field};

pub const TITLE_WEIGHT: f32 = 3.0;
pub const SUMMARY_WEIGHT: f32 = 2.0;
pub const CONTENT_WEIGHT: f32 = 1.0;

const ELLIPSIS: &str = "…";

#[derive(Debug, Clone, Copy)]
pub struct ScoringParams {
	pub limit: usize,
	pub content_chars: Option<usize>,
	pub preview_chars: usize,
}

pub fn keyword_overlap_score(candidate: &Candidate, keywords: &[String]) -> f32 {
	let title = candidate.title.to_lowercase();
	let summary = candidate.field_str(field::SUMMARY).map(str::to_lowercase).unwrap_or_default();
	let content = candidate.content_text.to_lowercase();
	let mut score = 0.0;

	for keyword in keywords {
		let needle = keyword.trim().to_lowercase();

		if needle.is_empty() {
			continue;
		}

		score += TITLE_WEIGHT * title.matches(needle.as_str()).count() as f32;
		score += SUMMARY_WEIGHT * summary.matches(needle.as_str()).count() as f32;
		score += CONTENT_WEIGHT * content.matches(needle.as_str()).count() as f32;
	}

	score
}

pub fn normalized_score(candidate: &Candidate, keywords: &[String]) -> f32 {
	match candidate.source_tier {
		SourceTier::Rerank => candidate.raw_score,
		SourceTier::Keyword | SourceTier::FtsFallback => keyword_overlap_score(candidate, keywords),
	}
}

/// Scores, sorts and truncates one index's merged candidates.
///
/// Order: score descending, then full-text rank descending, then title, then id.
pub fn score_candidates(
	candidates: Vec<Candidate>,
	keywords: &[String],
	params: &ScoringParams,
) -> Vec<ScoredResult> {
	let mut scored: Vec<(f32, Candidate)> = candidates
		.into_iter()
		.map(|candidate| (normalized_score(&candidate, keywords), candidate))
		.collect();

	scored.sort_by(|(left_score, left), (right_score, right)| {
		cmp_f32_desc(*left_score, *right_score)
			.then_with(|| cmp_rank_desc(left.rank, right.rank))
			.then_with(|| left.title.cmp(&right.title))
			.then_with(|| left.id.cmp(&right.id))
	});
	scored.truncate(params.limit);

	scored
		.into_iter()
		.map(|(normalized_score, mut candidate)| {
			let preview = truncate_graphemes(&candidate.content_text, params.preview_chars);

			if let Some(max) = params.content_chars {
				candidate.content_text = truncate_graphemes(&candidate.content_text, max);
			}

			ScoredResult { candidate, normalized_score, preview }
		})
		.collect()
}

pub fn truncate_graphemes(text: &str, max: usize) -> String {
	let trimmed = text.trim();

	match trimmed.grapheme_indices(true).nth(max) {
		Some((cut, _)) => format!("{}{ELLIPSIS}", trimmed[..cut].trim_end()),
		None => trimmed.to_string(),
	}
}

pub fn cmp_f32_desc(left: f32, right: f32) -> Ordering {
	right.total_cmp(&left)
}

fn cmp_rank_desc(left: Option<f32>, right: Option<f32>) -> Ordering {
	match (left, right) {
		(Some(left), Some(right)) => cmp_f32_desc(left, right),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::IndexKind;

	fn params(limit: usize) -> ScoringParams {
		ScoringParams { limit, content_chars: Some(40), preview_chars: 10 }
	}

	fn keywords(values: &[&str]) -> Vec<String> {
		values.iter().map(|value| value.to_string()).collect()
	}

	#[test]
	fn overlap_weights_title_summary_and_content() {
		let candidate = Candidate::new(
			"1",
			"Penalty clause",
			"A penalty is due. PENALTY again.",
			IndexKind::Practice,
			SourceTier::Keyword,
		)
		.with_field(field::SUMMARY, "Penalty may be reduced");

		let score = keyword_overlap_score(&candidate, &keywords(&["penalty"]));

		assert!((score - (3.0 + 2.0 + 2.0)).abs() < f32::EPSILON);
	}

	#[test]
	fn keywords_are_counted_independently() {
		let candidate = Candidate::new(
			"1",
			"Labor contract",
			"",
			IndexKind::Normative,
			SourceTier::Keyword,
		);
		let score = keyword_overlap_score(&candidate, &keywords(&["labor", "contract", "missing"]));

		assert!((score - 6.0).abs() < f32::EPSILON);
	}

	#[test]
	fn rerank_scores_pass_through() {
		let candidate = Candidate::new("1", "t", "c", IndexKind::Normative, SourceTier::Rerank)
			.with_raw_score(9.0);

		assert!((normalized_score(&candidate, &keywords(&["t"])) - 9.0).abs() < f32::EPSILON);
	}

	#[test]
	fn sorts_by_score_then_rank_then_title() {
		let candidates = vec![
			Candidate::new("a", "Beta", "", IndexKind::Normative, SourceTier::FtsFallback)
				.with_rank(0.2),
			Candidate::new("b", "Alpha", "", IndexKind::Normative, SourceTier::FtsFallback)
				.with_rank(0.5),
			Candidate::new("c", "Gamma", "", IndexKind::Normative, SourceTier::FtsFallback),
			Candidate::new("d", "Alpha", "", IndexKind::Normative, SourceTier::Keyword),
			Candidate::new("e", "top", "", IndexKind::Normative, SourceTier::Rerank)
				.with_raw_score(4.0),
		];
		let ranked = score_candidates(candidates, &[], &params(10));
		let ids: Vec<&str> = ranked.iter().map(|r| r.candidate.id.as_str()).collect();

		assert_eq!(ids, vec!["e", "b", "a", "d", "c"]);
	}

	#[test]
	fn truncates_to_limit_and_snippet_length() {
		let long = "word ".repeat(40);
		let candidates = (0..5)
			.map(|idx| {
				Candidate::new(
					format!("{idx}"),
					format!("Doc {idx}"),
					long.clone(),
					IndexKind::Normative,
					SourceTier::Rerank,
				)
				.with_raw_score(idx as f32)
			})
			.collect();
		let ranked = score_candidates(candidates, &[], &params(2));

		assert_eq!(ranked.len(), 2);
		assert_eq!(ranked[0].candidate.id, "4");
		assert!(ranked[0].candidate.content_text.chars().count() <= 41);
		assert!(ranked[0].candidate.content_text.ends_with(ELLIPSIS));
		assert!(ranked[0].preview.chars().count() <= 11);
	}

	#[test]
	fn full_content_is_kept_without_snippet_limit() {
		let long = "word ".repeat(40);
		let candidate =
			Candidate::new("1", "Doc", long.clone(), IndexKind::Practice, SourceTier::Rerank);
		let params = ScoringParams { limit: 1, content_chars: None, preview_chars: 10 };
		let ranked = score_candidates(vec![candidate], &[], &params);

		assert_eq!(ranked[0].candidate.content_text, long);
	}

	#[test]
	fn truncation_respects_grapheme_boundaries() {
		assert_eq!(truncate_graphemes("Стаття 104", 6), "Стаття…");
		assert_eq!(truncate_graphemes("short", 10), "short");
	}
}
