use std::sync::Arc;

use lex_service::LexService;
use lex_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<LexService>,
}
impl AppState {
	pub async fn new(config: lex_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self::from_service(LexService::new(config, db)))
	}

	pub fn from_service(service: LexService) -> Self {
		Self { service: Arc::new(service) }
	}
}
