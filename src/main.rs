mod auth;
mod cli;
mod config;
mod defaults;
mod error;
mod git;
mod output;
mod poll;
mod providers;
mod report;
mod runner;

use clap::Parser;
use cli::Cli;
use env_logger::Env;
use log::info;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(cli::parse_failure_code(&err));
        }
    };

    output::print_banner();
    info!("Starting pipeline-runner {}", env!("CARGO_PKG_VERSION"));

    match cli.execute().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", output::bright_red("error:"));
            ExitCode::FAILURE
        }
    }
}
