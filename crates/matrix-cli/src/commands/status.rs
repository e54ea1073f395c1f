//! `matrix status`: store health plus the current directory's fingerprint,
//! if one has been recorded.

use anyhow::Result;
use clap::ArgMatches;
use serde::Serialize;

use crate::context::AppContext;
use crate::output;

#[derive(Serialize)]
struct StatusReport {
    doctor: matrix_core::diagnostics::DoctorReport,
    repo_id: Option<String>,
}

pub async fn run(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    let doctor = matrix_core::diagnostics::run_doctor(&ctx.store, &ctx.layout).await?;
    let cwd = std::env::current_dir()?;
    let repo_id = matrix_core::fingerprint::lookup_context(&ctx.store, &cwd)
        .await?
        .map(|c| c.id);

    if matches.get_flag("json") {
        return output::print_json(&StatusReport { doctor, repo_id });
    }

    println!(
        "schema: {}/{} {}",
        doctor.schema_version,
        doctor.expected_schema_version,
        if doctor.is_healthy() { "(healthy)" } else { "(NEEDS ATTENTION)" }
    );
    println!(
        "solutions: {}  failures: {}  repos: {}  tasks: {}",
        doctor.counts.solutions, doctor.counts.failures, doctor.counts.repos, doctor.counts.tasks
    );
    match repo_id {
        Some(id) => println!("current repo: {id}"),
        None => println!("current repo: not fingerprinted yet"),
    }
    Ok(())
}
