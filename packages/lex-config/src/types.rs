use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub telemetry: Telemetry,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub rerank: RerankProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct RerankProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub kb_limit: u32,
	pub practice_limit: u32,
	pub max_limit: u32,
	pub rerank_threshold: f32,
	pub rerank_candidate_multiplier: u32,
	pub keyword_row_cap: u32,
	pub max_keywords: u32,
	pub max_keyword_chars: u32,
	/// Full-text rows ranked below this floor are treated as noise.
	pub fts_min_rank: f32,
	pub kb_snippet_chars: u32,
	pub practice_snippet_chars: u32,
	pub preview_chars: u32,
	pub max_precedent_units: u32,
	pub precedent_quote_max_words: u32,
	pub tier_timeout_ms: u64,
	pub request_budget_ms: u64,
	pub max_query_chars: u32,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			kb_limit: 5,
			practice_limit: 5,
			max_limit: 20,
			rerank_threshold: 0.3,
			rerank_candidate_multiplier: 3,
			keyword_row_cap: 50,
			max_keywords: 10,
			max_keyword_chars: 200,
			fts_min_rank: 0.001,
			kb_snippet_chars: 1_500,
			practice_snippet_chars: 2_000,
			preview_chars: 280,
			max_precedent_units: 6,
			precedent_quote_max_words: 25,
			tier_timeout_ms: 10_000,
			request_budget_ms: 20_000,
			max_query_chars: 4_000,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Telemetry {
	pub enabled: bool,
	pub queue_capacity: usize,
	pub send_timeout_ms: u64,
	pub service_type: String,
	pub model_name: String,
}
impl Default for Telemetry {
	fn default() -> Self {
		Self {
			enabled: true,
			queue_capacity: 256,
			send_timeout_ms: 5_000,
			service_type: "legal_search".to_string(),
			model_name: "hybrid-retrieval".to_string(),
		}
	}
}
