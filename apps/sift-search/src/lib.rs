use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

use sift_service::{ResultSet, SearchRequest, SearchService, SourceType};

#[derive(Debug, Parser)]
#[command(
	version = sift_cli::VERSION,
	rename_all = "kebab",
	styles = sift_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[arg(long, short = 'q', value_parser = sift_cli::non_blank)]
	pub query: String,
	/// Defaults to `search.default_limit`.
	#[arg(long, short = 'l')]
	pub limit: Option<u32>,
	/// One of `code`, `doc`, `markdown` or `pdf`.
	#[arg(long, short = 't', value_name = "TYPE")]
	pub source_type: Option<SourceType>,
	#[arg(long)]
	pub pretty: bool,
}
impl Args {
	pub fn request(&self) -> SearchRequest {
		SearchRequest { query: self.query.clone(), limit: self.limit, source_type: self.source_type }
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = sift_config::load(&args.config)?;

	init_tracing(&config)?;

	let service = SearchService::from_config(&config)?;
	let request = args.request();
	let result = tokio::select! {
		result = service.search(request) => result?,
		_ = tokio::signal::ctrl_c() => {
			tracing::warn!("Interrupted; in-flight search cancelled.");

			return Err(eyre::eyre!("Search cancelled."));
		},
	};

	println!("{}", render(&result, args.pretty)?);

	Ok(())
}

pub fn render(result: &ResultSet, pretty: bool) -> color_eyre::Result<String> {
	let rendered =
		if pretty { serde_json::to_string_pretty(result)? } else { serde_json::to_string(result)? };

	Ok(rendered)
}

fn init_tracing(config: &sift_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}
