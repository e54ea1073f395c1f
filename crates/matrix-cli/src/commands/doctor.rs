//! `matrix doctor`: run the read-only health check and report it.

use anyhow::Result;
use clap::ArgMatches;

use crate::context::AppContext;
use crate::output;

pub async fn run(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    let report = matrix_core::diagnostics::run_doctor(&ctx.store, &ctx.layout).await?;

    if matches.get_flag("json") {
        output::print_json(&report)?;
    } else {
        println!(
            "schema: {}/{} {}",
            report.schema_version,
            report.expected_schema_version,
            if report.is_healthy() { "ok" } else { "NEEDS ATTENTION" }
        );
        println!("wal checkpoint busy: {}", report.wal_checkpoint_busy);
        println!(
            "rows: repos={} solutions={} failures={} repo_files={} symbols={} tasks={} executions={}",
            report.counts.repos,
            report.counts.solutions,
            report.counts.failures,
            report.counts.repo_files,
            report.counts.symbols,
            report.counts.tasks,
            report.counts.executions,
        );
        let cached = report.grammars.iter().filter(|g| g.cached).count();
        println!("grammars cached: {cached}/{}", report.grammars.len());
    }

    if !report.is_healthy() {
        return Err(crate::exit::InvariantViolation("store is unhealthy".to_string()).into());
    }
    Ok(())
}
