//! `matrix reward <id> <outcome>`.

use anyhow::Result;
use clap::ArgMatches;
use matrix_core::domain::usage_log::Outcome;

use crate::context::AppContext;

pub async fn run(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    let id = matches.get_one::<String>("id").expect("required");
    let outcome: Outcome = matches.get_one::<String>("outcome").expect("required").parse()?;
    let notes = matches.get_one::<String>("notes").cloned();

    let result = matrix_core::memory::reward(&ctx.store, id, outcome, notes).await?;
    println!("score: {:.2} -> {:.2}", result.previous_score, result.new_score);
    Ok(())
}
