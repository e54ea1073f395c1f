//! Matrix CLI - persistent developer-memory engine
//!
//! Binary name: `matrix`

mod cli;
mod commands;
mod context;
mod exit;
mod hook;
mod output;

use context::AppContext;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli::build_cli().get_matches();

    let ctx = match AppContext::open().await {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    };

    if let Some(("hook", _)) = matches.subcommand() {
        std::process::exit(hook::run(&ctx).await.code());
    }

    if let Err(err) = cli::dispatch(&matches, &ctx).await {
        eprintln!("error: {err:#}");
        std::process::exit(exit::exit_code_for(&err));
    }
}
