use std::future::Future;

use serde_json::{Map, Value};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use lex_domain::{Candidate, IndexKind, PracticeCategory, Query, SourceTier, date_serde};
use lex_providers::rerank::RerankRequest;
use lex_storage::{
	models::DocumentTable,
	queries::{FullTextSearch, KeywordSearch},
};

use crate::{Error, LexService, Result};

/// Rerank similarities are in `0..=1`; scaling puts them on the keyword-overlap scale.
pub const RERANK_SCORE_SCALE: f32 = 10.0;

#[derive(Debug, Clone)]
pub struct TierOutcome {
	pub tier: SourceTier,
	pub candidates: Vec<Candidate>,
	pub failed: bool,
	pub error: Option<String>,
	pub cancelled: bool,
}
impl TierOutcome {
	fn succeeded(tier: SourceTier, candidates: Vec<Candidate>) -> Self {
		Self { tier, candidates, failed: false, error: None, cancelled: false }
	}

	fn failed(tier: SourceTier, error: String) -> Self {
		Self { tier, candidates: Vec::new(), failed: true, error: Some(error), cancelled: false }
	}

	fn cancelled(tier: SourceTier) -> Self {
		Self {
			tier,
			candidates: Vec::new(),
			failed: true,
			error: Some("cancelled".to_string()),
			cancelled: true,
		}
	}
}

#[derive(Debug, Clone, Copy)]
pub struct TierInput<'a> {
	pub index: IndexKind,
	pub query: &'a Query,
	pub keywords: &'a [String],
	pub limit: u32,
}
impl TierInput<'_> {
	fn table(&self) -> DocumentTable {
		match self.index {
			IndexKind::Normative => DocumentTable::KnowledgeBase,
			IndexKind::Practice => DocumentTable::LegalPractice,
		}
	}

	fn category(&self) -> Option<PracticeCategory> {
		match self.index {
			IndexKind::Normative => None,
			IndexKind::Practice => self.query.category,
		}
	}

	fn reference_date(&self) -> Option<time::Date> {
		match self.index {
			IndexKind::Normative => self.query.reference_date,
			IndexKind::Practice => None,
		}
	}
}

pub async fn rerank_tier(
	service: &LexService,
	input: TierInput<'_>,
	deadline: Instant,
	cancel: &CancellationToken,
) -> TierOutcome {
	guard(SourceTier::Rerank, input.index, deadline, cancel, fetch_rerank(service, input)).await
}

pub async fn keyword_tier(
	service: &LexService,
	input: TierInput<'_>,
	deadline: Instant,
	cancel: &CancellationToken,
) -> TierOutcome {
	guard(SourceTier::Keyword, input.index, deadline, cancel, fetch_keyword(service, input)).await
}

pub async fn full_text_tier(
	service: &LexService,
	input: TierInput<'_>,
	deadline: Instant,
	cancel: &CancellationToken,
) -> TierOutcome {
	guard(SourceTier::FtsFallback, input.index, deadline, cancel, fetch_full_text(service, input))
		.await
}

async fn guard<F>(
	tier: SourceTier,
	index: IndexKind,
	deadline: Instant,
	cancel: &CancellationToken,
	fut: F,
) -> TierOutcome
where
	F: Future<Output = Result<Vec<Candidate>>>,
{
	tokio::select! {
		biased;
		_ = cancel.cancelled() => {
			tracing::debug!(index = index.as_str(), tier = tier.as_str(), "Tier cancelled.");

			TierOutcome::cancelled(tier)
		},
		result = tokio::time::timeout_at(deadline, fut) => match result {
			Ok(Ok(candidates)) => TierOutcome::succeeded(tier, candidates),
			Ok(Err(err)) => {
				tracing::warn!(
					error = %err,
					index = index.as_str(),
					tier = tier.as_str(),
					"Retrieval tier failed."
				);

				TierOutcome::failed(tier, err.to_string())
			},
			Err(_) => {
				tracing::warn!(index = index.as_str(), tier = tier.as_str(), "Retrieval tier timed out.");

				TierOutcome::failed(tier, format!("{} tier timed out", tier.as_str()))
			},
		},
	}
}

async fn fetch_rerank(service: &LexService, input: TierInput<'_>) -> Result<Vec<Candidate>> {
	let retrieval = &service.cfg.retrieval;
	let req = RerankRequest {
		query: input.query.text.clone(),
		tables: input.index.rerank_table().to_string(),
		category: input.category().map(|category| category.as_str().to_string()),
		limit: input.limit.saturating_mul(retrieval.rerank_candidate_multiplier),
		threshold: retrieval.rerank_threshold,
		reference_date: input.reference_date().map(date_serde::format_date),
	};
	let provider = &service.cfg.providers.rerank;
	let res = service.backends.rerank.search(provider, &req).await.map_err(|err| {
		let message = match err {
			Error::Provider { message } => message,
			other => other.to_string(),
		};

		Error::Provider { message: format!("{}: {message}", provider.provider_id) }
	})?;

	if res.rerank_ok == Some(false) {
		let reason = res
			.rerank_error
			.unwrap_or_else(|| "rerank service reported a degraded result".to_string());

		return Err(Error::Provider { message: format!("{}: {reason}", provider.provider_id) });
	}

	let hits = match input.index {
		IndexKind::Normative => res.kb,
		IndexKind::Practice => res.practice,
	};

	Ok(hits
		.into_iter()
		.map(|hit| {
			Candidate::new(hit.id, hit.title, hit.content_text, input.index, SourceTier::Rerank)
				.with_raw_score(hit.similarity * RERANK_SCORE_SCALE)
				.with_fields(hit.fields)
		})
		.collect())
}

async fn fetch_keyword(service: &LexService, input: TierInput<'_>) -> Result<Vec<Candidate>> {
	let category = input.category();
	let search = KeywordSearch {
		table: input.table(),
		keywords: input.keywords,
		reference_date: input.reference_date(),
		category: category.map(PracticeCategory::as_str),
		limit: service.cfg.retrieval.keyword_row_cap,
	};
	let rows = service.backends.store.query_by_keyword(&search).await?;

	Ok(rows
		.into_iter()
		.map(|row| {
			Candidate::new(row.id, row.title, row.content_text, input.index, SourceTier::Keyword)
				.with_fields(into_fields(row.extra))
		})
		.collect())
}

async fn fetch_full_text(service: &LexService, input: TierInput<'_>) -> Result<Vec<Candidate>> {
	let retrieval = &service.cfg.retrieval;
	let category = input.category();
	let search = FullTextSearch {
		table: input.table(),
		query: input.query.text.trim(),
		limit: retrieval.keyword_row_cap,
		reference_date: input.reference_date(),
		category: category.map(PracticeCategory::as_str),
	};
	let rows = service.backends.store.call_full_text_search(&search).await?;

	Ok(rows
		.into_iter()
		.filter(|row| row.rank.is_finite() && row.rank >= retrieval.fts_min_rank)
		.map(|row| {
			Candidate::new(row.id, row.title, row.content_text, input.index, SourceTier::FtsFallback)
				.with_raw_score(row.rank)
				.with_rank(row.rank)
				.with_fields(into_fields(row.extra))
		})
		.collect())
}

fn into_fields(extra: Value) -> Map<String, Value> {
	match extra {
		Value::Object(fields) => fields,
		_ => Map::new(),
	}
}
