//! `matrix export [--format json|csv] [--type ...] [--output path]`.

use anyhow::Result;
use clap::ArgMatches;
use matrix_core::export::ExportType;

use crate::context::AppContext;

pub async fn run(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    let format = matches.get_one::<String>("format").map(String::as_str).unwrap_or("json");
    let output_path = matches.get_one::<String>("output").cloned();

    let content = match format {
        "json" => serde_json::to_string_pretty(&matrix_core::export::export_json(&ctx.store).await?)?,
        "csv" => {
            let export_type = match matches.get_one::<String>("type").map(String::as_str) {
                Some("solutions") => ExportType::Solutions,
                Some("failures") => ExportType::Failures,
                Some("repos") => ExportType::Repos,
                Some(other) => anyhow::bail!("unknown export type '{other}'"),
                None => anyhow::bail!("--type is required for --format csv"),
            };
            matrix_core::export::export_csv(&ctx.store, export_type).await?
        }
        other => anyhow::bail!("unknown format '{other}'"),
    };

    match output_path {
        Some(path) => {
            tokio::fs::write(&path, content).await?;
            println!("wrote {path}");
        }
        None => println!("{content}"),
    }
    Ok(())
}
