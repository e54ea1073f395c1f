//! `matrix warn add|remove|list`.

use anyhow::Result;
use clap::ArgMatches;
use matrix_core::domain::warning::{NewWarning, Severity, WarningType};

use crate::context::AppContext;
use crate::output;

pub async fn run(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    match matches.subcommand() {
        Some(("add", sub)) => add(sub, ctx).await,
        Some(("remove", sub)) => remove(sub, ctx).await,
        Some(("list", sub)) => list(sub, ctx).await,
        _ => anyhow::bail!("warn requires a subcommand"),
    }
}

async fn add(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    let target = matches.get_one::<String>("target").expect("required").clone();
    let reason = matches.get_one::<String>("reason").expect("required").clone();
    let warning_type = matches
        .get_one::<String>("type")
        .map(|v| v.parse::<WarningType>())
        .transpose()?
        .unwrap_or_default();
    let severity = matches
        .get_one::<String>("severity")
        .map(|v| v.parse::<Severity>())
        .transpose()?;
    let ecosystem = matches.get_one::<String>("ecosystem").cloned();
    let repo_id = matches.get_one::<String>("repo-id").cloned();

    let warning = matrix_core::memory::add_warning(
        &ctx.store,
        NewWarning {
            warning_type,
            target,
            ecosystem,
            reason,
            severity,
            repo_id,
        },
    )
    .await?;

    println!("added {}", warning.id);
    Ok(())
}

async fn remove(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    let id = matches.get_one::<String>("id").expect("required");
    matrix_core::memory::remove_warning(&ctx.store, id).await?;
    println!("removed {id}");
    Ok(())
}

async fn list(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    let repo_id = matches.get_one::<String>("repo-id").map(String::as_str);
    let warnings = matrix_core::memory::list_warnings(&ctx.store, repo_id).await?;

    if matches.get_flag("json") {
        return output::print_json(&warnings);
    }
    if warnings.is_empty() {
        println!("No warnings found.");
        return Ok(());
    }
    output::print_table(
        &["ID", "TYPE", "SEVERITY", "TARGET", "REASON"],
        &warnings
            .iter()
            .map(|w| {
                vec![
                    w.id.clone(),
                    w.warning_type.to_string(),
                    w.severity.to_string(),
                    w.target.clone(),
                    w.reason.clone(),
                ]
            })
            .collect::<Vec<_>>(),
    );
    Ok(())
}
