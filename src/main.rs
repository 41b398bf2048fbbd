#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cmd;

#[derive(Parser)]
#[command(name = "ttdump", about = "Unity serialized file inspection tools")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Decode every object into a text dump, extracting shaders on the way.
	Dump(cmd::dump::Args),
	/// Print header and metadata summary.
	Info(cmd::info::Args),
	/// List types, or print one type tree.
	Types(cmd::types::Args),
}

fn main() {
	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> ttdump::unity::Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Dump(args) => cmd::dump::run(args),
		Commands::Info(args) => cmd::info::run(args),
		Commands::Types(args) => cmd::types::run(args),
	}
}
