mod commands;
mod config;
mod report;

use clap::Parser;
use colored::Colorize;
use commands::{generate, GenerateArgs};
use tracing_subscriber::EnvFilter;

/// heartgen - reflection code generator for heart serialization
#[derive(Parser, Debug)]
#[command(name = "heartgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    generate: GenerateArgs,
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.generate.verbose);

    match generate(cli.generate) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!();
            eprintln!("{} {}", "Error:".red().bold(), err);
            eprintln!();
            std::process::exit(1);
        }
    }
}
