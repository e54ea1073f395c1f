//! `matrix dreamer add|list|run|remove|history|logs`: the scheduler CLI
//! surface. Log files live under [`matrix_core::paths::Layout::dreamer_logs_dir`].

use anyhow::Result;
use clap::ArgMatches;
use matrix_core::domain::task::NewTask;

use crate::context::AppContext;
use crate::output;

pub async fn run(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    match matches.subcommand() {
        Some(("add", sub)) => add(sub, ctx).await,
        Some(("list", sub)) => list(sub, ctx).await,
        Some(("run", sub)) => run_task(sub, ctx).await,
        Some(("remove", sub)) => remove(sub, ctx).await,
        Some(("history", sub)) => history(sub, ctx).await,
        Some(("logs", sub)) => logs(sub, ctx).await,
        _ => anyhow::bail!("dreamer requires a subcommand"),
    }
}

async fn add(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    let name = matches.get_one::<String>("name").expect("required").clone();
    let schedule = matches.get_one::<String>("schedule").expect("required").clone();
    let command = matches.get_one::<String>("command").expect("required").clone();
    let working_directory = matches
        .get_one::<String>("working-directory")
        .cloned()
        .unwrap_or_else(|| ".".to_string());
    let timeout = matches.get_one::<String>("timeout").map(|v| v.parse()).transpose()?;
    let repo_id = matches.get_one::<String>("repo-id").cloned();

    let task = matrix_core::scheduler::add(
        &ctx.store,
        NewTask {
            name,
            schedule,
            command,
            working_directory,
            timeout,
            env: Default::default(),
            worktree: None,
            tags: Vec::new(),
            repo_id,
            timezone: None,
        },
        &ctx.layout.dreamer_logs_dir(),
    )
    .await?;

    println!("scheduled {} ({})", task.id, task.cron_expression);
    Ok(())
}

async fn list(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    let repo_id = matches.get_one::<String>("repo-id").map(String::as_str);
    let tasks = matrix_core::scheduler::list(&ctx.store, repo_id).await?;

    if matches.get_flag("json") {
        return output::print_json(&tasks);
    }
    if tasks.is_empty() {
        println!("No scheduled tasks found.");
        return Ok(());
    }
    output::print_table(
        &["ID", "NAME", "SCHEDULE", "ENABLED", "COMMAND"],
        &tasks
            .iter()
            .map(|t| {
                vec![
                    t.id.clone(),
                    t.name.clone(),
                    t.cron_expression.clone(),
                    t.enabled.to_string(),
                    t.command.clone(),
                ]
            })
            .collect::<Vec<_>>(),
    );
    Ok(())
}

async fn run_task(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    let id = matches.get_one::<String>("id").expect("required");
    let execution = matrix_core::scheduler::run(&ctx.store, id).await?;
    println!(
        "{} status={} exit_code={:?} duration_ms={:?}",
        execution.id, execution.status, execution.exit_code, execution.duration_ms
    );
    Ok(())
}

async fn remove(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    let id = matches.get_one::<String>("id").expect("required");
    matrix_core::scheduler::remove(&ctx.store, id).await?;
    println!("removed {id}");
    Ok(())
}

async fn history(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    let id = matches.get_one::<String>("id").expect("required");
    let limit: i64 = matches.get_one::<String>("limit").unwrap().parse()?;
    let executions = matrix_core::scheduler::history(&ctx.store, id, limit).await?;

    if matches.get_flag("json") {
        return output::print_json(&executions);
    }
    if executions.is_empty() {
        println!("No executions recorded.");
        return Ok(());
    }
    for e in &executions {
        println!(
            "{}  {}  status={}  exit_code={:?}",
            e.started_at.to_rfc3339(),
            e.id,
            e.status,
            e.exit_code
        );
    }
    Ok(())
}

async fn logs(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    let id = matches.get_one::<String>("id").expect("required");
    let (stdout, stderr) = matrix_core::scheduler::logs(&ctx.layout.dreamer_logs_dir(), id).await?;
    println!("--- stdout ---\n{stdout}");
    println!("--- stderr ---\n{stderr}");
    Ok(())
}
