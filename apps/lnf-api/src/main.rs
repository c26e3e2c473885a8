use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = lnf_api::Args::parse();

	lnf_api::run(args).await
}
