//! Routes a parsed [`clap::ArgMatches`] to its command handler.

use anyhow::{bail, Result};
use clap::ArgMatches;

use crate::commands::{config, doctor, dreamer, export, failure, list, reward, search, status, store, version, warn};
use crate::context::AppContext;

pub async fn dispatch(matches: &ArgMatches, ctx: &AppContext) -> Result<()> {
    match matches.subcommand() {
        Some(("status", sub)) => status::run(sub, ctx).await,
        Some(("list", sub)) => list::run(sub, ctx).await,
        Some(("search", sub)) => search::run(sub, ctx).await,
        Some(("store", sub)) => store::run(sub, ctx).await,
        Some(("reward", sub)) => reward::run(sub, ctx).await,
        Some(("failure", sub)) => failure::run(sub, ctx).await,
        Some(("warn", sub)) => warn::run(sub, ctx).await,
        Some(("export", sub)) => export::run(sub, ctx).await,
        Some(("config", sub)) => config::run(sub, ctx).await,
        Some(("doctor", sub)) => doctor::run(sub, ctx).await,
        Some(("dreamer", sub)) => dreamer::run(sub, ctx).await,
        Some(("version", _)) => version::run(),
        _ => bail!("no subcommand given"),
    }
}
