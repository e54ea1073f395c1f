//! `matrix list solutions|failures|repos [--page N] [--limit N]`.

use anyhow::Result;
use clap::ArgMatches;

use crate::context::AppContext;
use crate::output;

pub async fn run(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    let entity = matches.get_one::<String>("entity").expect("required");
    let page: i64 = matches.get_one::<String>("page").unwrap().parse()?;
    let limit: i64 = matches.get_one::<String>("limit").unwrap().parse()?;
    let repo_id = matches.get_one::<String>("repo-id").map(String::as_str);
    let offset = (page.max(1) - 1) * limit;
    let json = matches.get_flag("json");

    match entity.as_str() {
        "solutions" => {
            let rows = matrix_core::memory::list_solutions(&ctx.store, repo_id, limit, offset).await?;
            if json {
                return output::print_json(&rows);
            }
            if rows.is_empty() {
                println!("No solutions found.");
                return Ok(());
            }
            output::print_table(
                &["ID", "SCOPE", "SCORE", "USES", "PROBLEM"],
                &rows
                    .iter()
                    .map(|r| {
                        vec![
                            r.id.clone(),
                            r.scope.clone(),
                            format!("{:.2}", r.score),
                            r.uses.to_string(),
                            truncate(&r.problem, 60),
                        ]
                    })
                    .collect::<Vec<_>>(),
            );
        }
        "failures" => {
            let rows = matrix_core::memory::list_failures(&ctx.store, repo_id, limit, offset).await?;
            if json {
                return output::print_json(&rows);
            }
            if rows.is_empty() {
                println!("No failures found.");
                return Ok(());
            }
            output::print_table(
                &["ID", "TYPE", "OCCURRENCES", "MESSAGE"],
                &rows
                    .iter()
                    .map(|r| {
                        vec![
                            r.id.clone(),
                            r.error_type.clone(),
                            r.occurrences.to_string(),
                            truncate(&r.error_message, 60),
                        ]
                    })
                    .collect::<Vec<_>>(),
            );
        }
        "repos" => {
            let rows = matrix_core::memory::list_repos(&ctx.store, limit, offset).await?;
            if json {
                return output::print_json(&rows);
            }
            if rows.is_empty() {
                println!("No repos found.");
                return Ok(());
            }
            output::print_table(
                &["ID", "NAME", "LANGUAGES", "PATH"],
                &rows
                    .iter()
                    .map(|r| vec![r.id.clone(), r.name.clone(), r.languages.join(","), r.path.clone()])
                    .collect::<Vec<_>>(),
            );
        }
        other => anyhow::bail!("unknown entity '{other}'"),
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    format!("{}...", s.chars().take(max).collect::<String>())
}
