//! `matrix config get|set|list`: inspect the resolved configuration.
//!
//! `set` writes to the global config file (`~/.config/matrix/config.toml`);
//! it does not mutate the running process's already-loaded [`AppContext`].

use anyhow::{bail, Context as _, Result};
use clap::ArgMatches;

use crate::context::AppContext;

pub async fn run(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    match matches.subcommand() {
        Some(("get", sub)) => get(sub, ctx),
        Some(("set", sub)) => set(sub),
        Some(("list", _)) => list(ctx),
        _ => bail!("config requires a subcommand"),
    }
}

fn get(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    let key = matches.get_one::<String>("key").expect("required");
    let value = config_field(&ctx.config, key)?;
    println!("{value}");
    Ok(())
}

fn list(ctx: &AppContext) -> Result<()> {
    println!("{}", toml::to_string_pretty(&ctx.config)?);
    Ok(())
}

fn set(matches: &ArgMatches) -> Result<()> {
    let key = matches.get_one::<String>("key").expect("required");
    let value = matches.get_one::<String>("value").expect("required");

    let path = matrix_core::config::global_config_path()
        .context("could not determine a config directory for this platform")?;

    let mut partial = if path.exists() {
        matrix_core::config::load_toml_file(&path)?
    } else {
        matrix_core::config::PartialConfig::default()
    };

    apply_field(&mut partial, key, value)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, toml::to_string_pretty(&partial)?)?;
    println!("set {key} = {value} in {}", path.display());
    Ok(())
}

fn config_field(config: &matrix_core::Config, key: &str) -> Result<String> {
    Ok(match key {
        "store_path" => config.store_path.as_ref().map_or_else(|| "(default)".to_string(), |p| p.display().to_string()),
        "embedding_dimension" => config.embedding_dimension.to_string(),
        "recall_default_limit" => config.recall_default_limit.to_string(),
        "recall_min_score" => config.recall_min_score.to_string(),
        "indexer_max_file_bytes" => config.indexer_max_file_bytes.to_string(),
        "indexer_include_tests" => config.indexer_include_tests.to_string(),
        "scheduler_default_timeout_secs" => config.scheduler_default_timeout_secs.to_string(),
        "http_cache_ttl_secs" => config.http_cache_ttl_secs.to_string(),
        other => bail!("unknown config key '{other}'"),
    })
}

fn apply_field(partial: &mut matrix_core::config::PartialConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "store_path" => partial.store_path = Some(value.into()),
        "recall_default_limit" => partial.recall_default_limit = Some(value.parse()?),
        "recall_min_score" => partial.recall_min_score = Some(value.parse()?),
        "indexer_max_file_bytes" => partial.indexer_max_file_bytes = Some(value.parse()?),
        "indexer_include_tests" => partial.indexer_include_tests = Some(value == "true" || value == "1"),
        "scheduler_default_timeout_secs" => partial.scheduler_default_timeout_secs = Some(value.parse()?),
        "http_cache_ttl_secs" => partial.http_cache_ttl_secs = Some(value.parse()?),
        other => bail!("unknown config key '{other}'"),
    }
    Ok(())
}
