use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = magen_api::Args::parse();

	magen_api::run(args).await
}
