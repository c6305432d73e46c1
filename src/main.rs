mod bridge;
mod cli;
mod commands;
mod config;
mod error;
mod output;
mod resolver;
mod selector;
mod staging;
mod utils;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{cli::Cli, error::ResolveError};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = commands::run(cli) {
        let tag = e.downcast_ref::<ResolveError>().map(ResolveError::tag).unwrap_or("error");
        output::failure(tag, format!("{:#}", e));
        std::process::exit(1);
    }
}

/// 日志写到 stderr；RUST_LOG 优先，否则默认 warn（--verbose 时 debug）
fn init_logging(verbose: bool) {
    let default = if verbose { "nyaice=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
