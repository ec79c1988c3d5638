use serde::Serialize;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use lex_domain::{
	IndexKind, Query, RetrievalMode, ScoredResult, SourceRef, SourceTier, merge,
	scoring::{self, ScoringParams},
};

use crate::{
	LexService,
	tiers::{self, TierInput},
};

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalOutcome {
	pub index: IndexKind,
	pub results: Vec<ScoredResult>,
	pub sources: Vec<SourceRef>,
	pub retrieval_mode: RetrievalMode,
	pub rerank_ok: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rerank_error: Option<String>,
	pub fallback_used: bool,
	pub candidate_count: usize,
	pub cancelled: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineParams<'a> {
	pub index: IndexKind,
	pub query: &'a Query,
	pub keywords: &'a [String],
	pub limit: u32,
	pub content_chars: Option<usize>,
}

/// Runs one index end to end: rerank and keyword tiers concurrently, merge, optional full-text
/// fallback, then scoring.
pub async fn run(
	service: &LexService,
	params: PipelineParams<'_>,
	request_deadline: Instant,
	cancel: &CancellationToken,
) -> RetrievalOutcome {
	let input = TierInput {
		index: params.index,
		query: params.query,
		keywords: params.keywords,
		limit: params.limit,
	};
	let tier_timeout = Duration::from_millis(service.cfg.retrieval.tier_timeout_ms);
	let deadline = tier_deadline(tier_timeout, request_deadline);
	let (rerank, keyword) = tokio::join!(
		tiers::rerank_tier(service, input, deadline, cancel),
		tiers::keyword_tier(service, input, deadline, cancel),
	);
	let rerank_ok = !rerank.failed;
	let rerank_error = rerank.error.clone();
	let mut cancelled = rerank.cancelled || keyword.cancelled;
	let merged = merge::merge_candidates([rerank.candidates, keyword.candidates]);
	let rerank_contributed =
		rerank_ok && merged.iter().any(|candidate| candidate.source_tier == SourceTier::Rerank);
	let retrieval_mode = RetrievalMode::resolve(rerank_contributed, merged.len());
	let mut fallback_used = false;
	let merged = if merged.is_empty() && !cancelled && !cancel.is_cancelled() {
		tracing::info!(
			index = params.index.as_str(),
			"Rerank and keyword tiers returned nothing. Calling full-text fallback."
		);

		fallback_used = true;

		let deadline = tier_deadline(tier_timeout, request_deadline);
		let fallback = tiers::full_text_tier(service, input, deadline, cancel).await;

		cancelled |= fallback.cancelled;

		merge::merge_candidates([fallback.candidates])
	} else {
		merged
	};

	cancelled |= cancel.is_cancelled();

	let candidate_count = merged.len();
	let scoring = ScoringParams {
		limit: params.limit as usize,
		content_chars: params.content_chars,
		preview_chars: service.cfg.retrieval.preview_chars as usize,
	};
	let results = scoring::score_candidates(merged, params.keywords, &scoring);
	let sources = results.iter().map(|result| result.candidate.source_ref()).collect();

	tracing::debug!(
		index = params.index.as_str(),
		retrieval_mode = retrieval_mode.as_str(),
		candidate_count,
		result_count = results.len(),
		fallback_used,
		"Index pipeline finished."
	);

	RetrievalOutcome {
		index: params.index,
		results,
		sources,
		retrieval_mode,
		rerank_ok,
		rerank_error,
		fallback_used,
		candidate_count,
		cancelled,
	}
}

/// The earlier of the tier's own timeout and the request deadline.
fn tier_deadline(tier_timeout: Duration, request_deadline: Instant) -> Instant {
	(Instant::now() + tier_timeout).min(request_deadline)
}
