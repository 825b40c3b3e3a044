use clap::Parser;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wideload_cli::{print_reports, workloads, WideloadCli};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wideload=info,wideload_cli=info"));
    FmtSubscriber::builder().with_env_filter(filter).init();

    let cli = WideloadCli::parse();
    let registry = workloads::registry();

    let res = wideload_cli::run(&cli, &registry)
        .await
        .and_then(|reports| print_reports(&mut std::io::stdout().lock(), &reports, cli.json));

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
