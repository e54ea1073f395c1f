//! `matrix store <problem> <solution>`.

use anyhow::Result;
use clap::ArgMatches;
use matrix_core::domain::solution::{Category, NewSolution, Scope};

use crate::context::AppContext;
use crate::output;

pub async fn run(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    let problem = matches.get_one::<String>("problem").expect("required").clone();
    let solution = matches.get_one::<String>("solution").expect("required").clone();
    let scope = matches
        .get_one::<String>("scope")
        .map(|v| v.parse::<Scope>())
        .transpose()?;
    let category = matches
        .get_one::<String>("category")
        .map(|v| v.parse::<Category>())
        .transpose()?;
    let tags = matches
        .get_one::<String>("tags")
        .map(|v| v.split(',').map(str::trim).map(String::from).collect())
        .unwrap_or_default();

    let saved = matrix_core::memory::store_solution(
        &ctx.store,
        NewSolution {
            problem,
            solution,
            scope,
            tags,
            category,
            ..Default::default()
        },
    )
    .await?;

    if matches.get_flag("json") {
        return output::print_json(&saved);
    }
    println!("stored {}", saved.id);
    Ok(())
}
