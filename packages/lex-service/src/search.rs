use serde::{Deserialize, Serialize};
use time::Date;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use lex_domain::{
	IndexKind, PracticeCategory, Query, RetrievalMode, SourceRef,
	context::{self, PracticeFormat},
	keywords,
};

use crate::{
	Error, LexService, Result, TelemetryEvent,
	pipeline::{self, PipelineParams, RetrievalOutcome},
};

const CONTEXT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Deserialize)]
pub struct DualSearchRequest {
	pub query: String,
	#[serde(default, alias = "referenceDate", with = "lex_domain::date_serde::option")]
	pub reference_date: Option<Date>,
	#[serde(default)]
	pub category: Option<PracticeCategory>,
	#[serde(default)]
	pub options: DualSearchOptions,
}
impl DualSearchRequest {
	pub fn new(query: impl Into<String>) -> Self {
		Self {
			query: query.into(),
			reference_date: None,
			category: None,
			options: DualSearchOptions::default(),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DualSearchOptions {
	#[serde(alias = "kbLimit")]
	pub kb_limit: Option<u32>,
	#[serde(alias = "practiceLimit")]
	pub practice_limit: Option<u32>,
	#[serde(alias = "kbSnippetLength")]
	pub kb_snippet_length: Option<u32>,
	#[serde(default, alias = "fullPracticeText")]
	pub full_practice_text: bool,
	#[serde(alias = "requestId")]
	pub request_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DualOutcome {
	pub request_id: String,
	pub kb: RetrievalOutcome,
	pub practice: RetrievalOutcome,
	pub kb_context: String,
	pub practice_context: String,
	pub context: String,
	pub sources: Vec<SourceRef>,
	pub retrieval_mode: RetrievalMode,
	pub rerank_ok: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rerank_error: Option<String>,
	pub cancelled: bool,
}

impl LexService {
	pub async fn dual_search(&self, req: DualSearchRequest) -> Result<DualOutcome> {
		self.dual_search_with_cancel(req, CancellationToken::new()).await
	}

	/// Same as [`Self::dual_search`], returning whatever completed once `cancel` fires.
	pub async fn dual_search_with_cancel(
		&self,
		req: DualSearchRequest,
		cancel: CancellationToken,
	) -> Result<DualOutcome> {
		let started = Instant::now();
		let retrieval = &self.cfg.retrieval;
		let query = self.build_query(&req)?;
		let request_deadline = started + Duration::from_millis(retrieval.request_budget_ms);
		let terms = keywords::search_terms(
			&query.text,
			retrieval.max_keywords as usize,
			retrieval.max_keyword_chars as usize,
		);
		let kb_params = PipelineParams {
			index: IndexKind::Normative,
			query: &query,
			keywords: &terms,
			limit: self.clamp_limit(req.options.kb_limit, retrieval.kb_limit),
			content_chars: Some(
				req.options.kb_snippet_length.unwrap_or(retrieval.kb_snippet_chars).max(1) as usize,
			),
		};
		let practice_params = PipelineParams {
			index: IndexKind::Practice,
			query: &query,
			keywords: &terms,
			limit: self.clamp_limit(req.options.practice_limit, retrieval.practice_limit),
			content_chars: if req.options.full_practice_text {
				None
			} else {
				Some(retrieval.practice_snippet_chars as usize)
			},
		};
		let (kb, practice) = tokio::join!(
			pipeline::run(self, kb_params, request_deadline, &cancel),
			pipeline::run(self, practice_params, request_deadline, &cancel),
		);
		let request_id = query.request_id.clone().unwrap_or_default();
		let rerank_errors: Vec<String> =
			[&kb.rerank_error, &practice.rerank_error].into_iter().flatten().cloned().collect();
		let rerank_ok = kb.rerank_ok && practice.rerank_ok;
		let retrieval_mode = kb.retrieval_mode.best(practice.retrieval_mode);
		let cancelled = kb.cancelled || practice.cancelled;

		self.telemetry.record(TelemetryEvent {
			request_id: request_id.clone(),
			kb_mode: kb.retrieval_mode,
			practice_mode: practice.retrieval_mode,
			retrieval_mode,
			rerank_ok,
			rerank_errors: rerank_errors.clone(),
			kb_count: kb.results.len(),
			practice_count: practice.results.len(),
			kb_fallback_used: kb.fallback_used,
			practice_fallback_used: practice.fallback_used,
			cancelled,
			elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
		});

		let kb_context = if kb.results.is_empty() {
			String::new()
		} else {
			format!(
				"{}{CONTEXT_SEPARATOR}{}",
				context::format_normative(&kb.results),
				context::temporal_disclaimer(query.reference_date)
			)
		};
		let practice_context = context::format_practice(
			&practice.results,
			&PracticeFormat {
				max_units: retrieval.max_precedent_units as usize,
				quote_max_words: retrieval.precedent_quote_max_words as usize,
			},
		);
		let context = [kb_context.as_str(), practice_context.as_str()]
			.into_iter()
			.filter(|block| !block.is_empty())
			.collect::<Vec<_>>()
			.join(CONTEXT_SEPARATOR);
		let sources = kb.sources.iter().chain(practice.sources.iter()).cloned().collect();

		tracing::debug!(
			request_id = %request_id,
			retrieval_mode = retrieval_mode.as_str(),
			rerank_ok,
			kb_count = kb.results.len(),
			practice_count = practice.results.len(),
			cancelled,
			"Dual search finished."
		);

		Ok(DualOutcome {
			request_id,
			kb,
			practice,
			kb_context,
			practice_context,
			context,
			sources,
			retrieval_mode,
			rerank_ok,
			rerank_error: if rerank_errors.is_empty() { None } else { Some(rerank_errors.join("; ")) },
			cancelled,
		})
	}

	fn build_query(&self, req: &DualSearchRequest) -> Result<Query> {
		let text = req.query.trim();

		if text.is_empty() {
			return Err(Error::InvalidRequest { message: "query must not be empty.".to_string() });
		}

		let max_chars = self.cfg.retrieval.max_query_chars as usize;

		if text.chars().count() > max_chars {
			return Err(Error::InvalidRequest {
				message: format!("query must be at most {max_chars} characters."),
			});
		}

		let request_id = req
			.options
			.request_id
			.as_deref()
			.map(str::trim)
			.filter(|id| !id.is_empty())
			.map(str::to_string)
			.unwrap_or_else(|| Uuid::new_v4().to_string());
		let mut query = Query::new(text).with_request_id(request_id);

		query.reference_date = req.reference_date;
		query.category = req.category;

		Ok(query)
	}

	fn clamp_limit(&self, requested: Option<u32>, default: u32) -> u32 {
		requested.unwrap_or(default).clamp(1, self.cfg.retrieval.max_limit.max(1))
	}
}
