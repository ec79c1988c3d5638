use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = lex_api::Args::parse();

	lex_api::run(args).await
}
