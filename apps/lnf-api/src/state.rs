use std::sync::Arc;

use lnf_service::LnfService;
use lnf_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<LnfService>,
	pub db: Db,
}
impl AppState {
	pub async fn new(config: lnf_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = LnfService::new(config, db.clone());

		Ok(Self::from_parts(service, db))
	}

	pub fn from_parts(service: LnfService, db: Db) -> Self {
		Self { service: Arc::new(service), db }
	}
}
