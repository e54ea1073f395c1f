//! `matrix failure <message>`: record a failure, deduplicated by signature.

use anyhow::Result;
use clap::ArgMatches;
use matrix_core::domain::failure::{ErrorType, NewFailure};

use crate::context::AppContext;
use crate::output;

pub async fn run(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    let error_message = matches.get_one::<String>("message").expect("required").clone();
    let error_type = matches
        .get_one::<String>("error-type")
        .map(|v| v.parse::<ErrorType>())
        .transpose()?;
    let stack_trace = matches.get_one::<String>("stack-trace").cloned();
    let fix_applied = matches.get_one::<String>("fix").cloned();
    let root_cause = matches.get_one::<String>("root-cause").cloned();

    let failure = matrix_core::memory::record_failure(
        &ctx.store,
        NewFailure {
            repo_id: None,
            error_type,
            error_message,
            stack_trace,
            files: Vec::new(),
            root_cause,
            fix_applied,
            prevention: None,
        },
    )
    .await?;

    if matches.get_flag("json") {
        return output::print_json(&failure);
    }
    println!("recorded {} (occurrences: {})", failure.id, failure.occurrences);
    Ok(())
}
