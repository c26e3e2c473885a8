pub mod worker;

mod error;

pub use error::{Error, Result};

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lnf_service::LnfService;
use lnf_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = lnf_cli::VERSION,
	rename_all = "kebab",
	styles = lnf_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = lnf_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let worker = config.worker.clone();
	let service = LnfService::new(config, db.clone());
	let state = worker::WorkerState { db, service, worker };

	worker::run_worker(state).await?;

	Ok(())
}
