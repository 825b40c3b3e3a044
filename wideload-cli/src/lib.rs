//! Runner behind the `wideload` binary.
use anyhow::Context;
use std::io::Write;
#[allow(unused)]
use tracing::{error, info, warn};
use wideload::{Engine, RunReport, WorkloadRegistry};

pub mod args;
pub mod workloads;

pub use args::{RunLength, WideloadCli};

/// Run the workload named on the command line, returning one report per workload of its
/// suite. Ctrl-C stops the run early; the partial reports are still returned.
pub async fn run(
    cli: &WideloadCli,
    registry: &WorkloadRegistry,
) -> anyhow::Result<Vec<RunReport>> {
    let engine = Engine::new(cli.config())?;
    let suite = registry.build(&cli.workload, engine.config())?;

    info!(
        "Executing {} ({} workloads), duration={}",
        suite.name(),
        suite.len(),
        cli.duration
    );

    let interrupt = engine.stop_on_interrupt();
    let res = engine.run_suite(&suite).await;
    interrupt.abort();

    Ok(res?)
}

/// Text (one `Display` line per report) or JSON lines.
pub fn print_reports(
    out: &mut impl Write,
    reports: &[RunReport],
    json: bool,
) -> anyhow::Result<()> {
    for report in reports {
        if json {
            let line = serde_json::to_string(report).context("failed to serialize report")?;
            writeln!(out, "{line}")?;
        } else {
            writeln!(out, "{report}")?;
        }
    }
    Ok(())
}
