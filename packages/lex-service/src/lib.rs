pub mod pipeline;
pub mod search;
pub mod telemetry;
pub mod tiers;

mod error;

pub use error::{Error, Result};
pub use pipeline::RetrievalOutcome;
pub use search::{DualOutcome, DualSearchOptions, DualSearchRequest};
pub use telemetry::{TelemetryEvent, TelemetryRecorder};

use std::{future::Future, pin::Pin, sync::Arc};

use lex_config::{Config, RerankProviderConfig};
use lex_providers::rerank::{self, RerankRequest, RerankResponse};
use lex_storage::{
	db::Db,
	models::{ApiUsage, DocumentRow, RankedRow},
	queries::{self, FullTextSearch, KeywordSearch},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait RerankProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a RerankProviderConfig,
		req: &'a RerankRequest,
	) -> BoxFuture<'a, Result<RerankResponse>>;
}

pub trait CandidateStore
where
	Self: Send + Sync,
{
	fn query_by_keyword<'a>(
		&'a self,
		search: &'a KeywordSearch<'a>,
	) -> BoxFuture<'a, Result<Vec<DocumentRow>>>;

	fn call_full_text_search<'a>(
		&'a self,
		search: &'a FullTextSearch<'a>,
	) -> BoxFuture<'a, Result<Vec<RankedRow>>>;
}

pub trait TelemetrySink
where
	Self: Send + Sync,
{
	fn record<'a>(&'a self, usage: &'a ApiUsage) -> BoxFuture<'a, Result<()>>;
}

#[derive(Clone)]
pub struct Backends {
	pub rerank: Arc<dyn RerankProvider>,
	pub store: Arc<dyn CandidateStore>,
	pub telemetry: Arc<dyn TelemetrySink>,
}
impl Backends {
	pub fn new(db: Db) -> Self {
		let postgres = Arc::new(PostgresBackend { db });

		Self { rerank: Arc::new(HttpRerank), store: postgres.clone(), telemetry: postgres }
	}
}

pub struct LexService {
	pub cfg: Config,
	pub backends: Backends,
	pub telemetry: TelemetryRecorder,
}
impl LexService {
	/// Must be called inside a Tokio runtime; the telemetry worker is spawned here.
	pub fn new(cfg: Config, db: Db) -> Self {
		Self::with_backends(cfg, Backends::new(db))
	}

	pub fn with_backends(cfg: Config, backends: Backends) -> Self {
		let telemetry = TelemetryRecorder::spawn(&cfg.telemetry, backends.telemetry.clone());

		Self { cfg, backends, telemetry }
	}
}

struct HttpRerank;
impl RerankProvider for HttpRerank {
	fn search<'a>(
		&'a self,
		cfg: &'a RerankProviderConfig,
		req: &'a RerankRequest,
	) -> BoxFuture<'a, Result<RerankResponse>> {
		Box::pin(async move { Ok(rerank::search(cfg, req).await?) })
	}
}

struct PostgresBackend {
	db: Db,
}
impl CandidateStore for PostgresBackend {
	fn query_by_keyword<'a>(
		&'a self,
		search: &'a KeywordSearch<'a>,
	) -> BoxFuture<'a, Result<Vec<DocumentRow>>> {
		Box::pin(async move { Ok(queries::keyword_search(&self.db, search).await?) })
	}

	fn call_full_text_search<'a>(
		&'a self,
		search: &'a FullTextSearch<'a>,
	) -> BoxFuture<'a, Result<Vec<RankedRow>>> {
		Box::pin(async move { Ok(queries::full_text_search(&self.db, search).await?) })
	}
}

impl TelemetrySink for PostgresBackend {
	fn record<'a>(&'a self, usage: &'a ApiUsage) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(queries::insert_api_usage(&self.db, usage).await?) })
	}
}
