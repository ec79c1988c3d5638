mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Postgres, Providers, RerankProviderConfig, Retrieval, Service, Storage, Telemetry,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	validate_rerank(&cfg.providers.rerank)?;
	validate_retrieval(&cfg.retrieval)?;

	if cfg.telemetry.enabled {
		if cfg.telemetry.queue_capacity == 0 {
			return Err(Error::Validation {
				message: "telemetry.queue_capacity must be greater than zero when enabled."
					.to_string(),
			});
		}
		if cfg.telemetry.send_timeout_ms == 0 {
			return Err(Error::Validation {
				message: "telemetry.send_timeout_ms must be greater than zero when enabled."
					.to_string(),
			});
		}
		if cfg.telemetry.service_type.trim().is_empty() {
			return Err(Error::Validation {
				message: "telemetry.service_type must be non-empty when enabled.".to_string(),
			});
		}
	}

	Ok(())
}

fn validate_rerank(rerank: &RerankProviderConfig) -> Result<()> {
	for (label, value) in [
		("providers.rerank.provider_id", &rerank.provider_id),
		("providers.rerank.api_base", &rerank.api_base),
		("providers.rerank.api_key", &rerank.api_key),
		("providers.rerank.path", &rerank.path),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if rerank.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.rerank.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if rerank.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: "providers.rerank.default_headers values must be strings.".to_string(),
		});
	}

	Ok(())
}

fn validate_retrieval(retrieval: &Retrieval) -> Result<()> {
	for (label, value) in [
		("retrieval.kb_limit", retrieval.kb_limit),
		("retrieval.practice_limit", retrieval.practice_limit),
		("retrieval.max_limit", retrieval.max_limit),
		("retrieval.rerank_candidate_multiplier", retrieval.rerank_candidate_multiplier),
		("retrieval.keyword_row_cap", retrieval.keyword_row_cap),
		("retrieval.max_keywords", retrieval.max_keywords),
		("retrieval.max_keyword_chars", retrieval.max_keyword_chars),
		("retrieval.kb_snippet_chars", retrieval.kb_snippet_chars),
		("retrieval.practice_snippet_chars", retrieval.practice_snippet_chars),
		("retrieval.preview_chars", retrieval.preview_chars),
		("retrieval.precedent_quote_max_words", retrieval.precedent_quote_max_words),
		("retrieval.max_query_chars", retrieval.max_query_chars),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if retrieval.kb_limit > retrieval.max_limit || retrieval.practice_limit > retrieval.max_limit
	{
		return Err(Error::Validation {
			message: "retrieval.kb_limit and retrieval.practice_limit must not exceed retrieval.max_limit."
				.to_string(),
		});
	}
	if !retrieval.rerank_threshold.is_finite() {
		return Err(Error::Validation {
			message: "retrieval.rerank_threshold must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&retrieval.rerank_threshold) {
		return Err(Error::Validation {
			message: "retrieval.rerank_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !retrieval.fts_min_rank.is_finite() || retrieval.fts_min_rank < 0.0 {
		return Err(Error::Validation {
			message: "retrieval.fts_min_rank must be a finite number, zero or greater.".to_string(),
		});
	}
	if retrieval.request_budget_ms == 0 {
		return Err(Error::Validation {
			message: "retrieval.request_budget_ms must be greater than zero.".to_string(),
		});
	}
	if retrieval.tier_timeout_ms == 0 || retrieval.tier_timeout_ms > retrieval.request_budget_ms {
		return Err(Error::Validation {
			message: "retrieval.tier_timeout_ms must be greater than zero and at most retrieval.request_budget_ms."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let rerank = &mut cfg.providers.rerank;

	rerank.provider_id = rerank.provider_id.trim().to_string();
	rerank.api_base = rerank.api_base.trim().trim_end_matches('/').to_string();
	rerank.api_key = rerank.api_key.trim().to_string();
	cfg.storage.postgres.dsn = cfg.storage.postgres.dsn.trim().to_string();
	cfg.telemetry.service_type = cfg.telemetry.service_type.trim().to_string();
	cfg.telemetry.model_name = cfg.telemetry.model_name.trim().to_string();
}
