//! `matrix search <query>`: recall the best-matching stored solutions.

use anyhow::Result;
use clap::ArgMatches;
use matrix_core::domain::solution::{Category, Scope};
use matrix_core::memory::RecallQuery;

use crate::context::AppContext;
use crate::output;

pub async fn run(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    let query = matches.get_one::<String>("query").expect("required").clone();
    let limit = matches
        .get_one::<String>("limit")
        .map(|v| v.parse())
        .transpose()?;
    let min_score = matches
        .get_one::<String>("min-score")
        .map(|v| v.parse())
        .transpose()?;
    let scope_filter = matches
        .get_one::<String>("scope")
        .map(|v| v.parse::<Scope>())
        .transpose()?;
    let category_filter = matches
        .get_one::<String>("category")
        .map(|v| v.parse::<Category>())
        .transpose()?;

    let cwd = std::env::current_dir()?;
    let results = matrix_core::memory::recall(
        &ctx.store,
        &cwd,
        RecallQuery {
            query,
            limit,
            min_score,
            scope_filter,
            category_filter,
            max_complexity: None,
        },
    )
    .await?;

    if matches.get_flag("json") {
        return output::print_json(&results);
    }

    if results.is_empty() {
        println!("No matching solutions found.");
        return Ok(());
    }

    for r in &results {
        println!(
            "{}  sim={:.2} score={:.2}  {}",
            r.id, r.similarity, r.score, r.problem
        );
        println!("  -> {}", r.solution);
    }
    Ok(())
}
