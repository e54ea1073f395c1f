//! Shared handles every command needs: the store, the on-disk layout, and
//! the resolved configuration.

use anyhow::{Context as _, Result};
use matrix_core::{Config, Store};

/// Resources a command needs to do its work. Built once in `main` and
/// threaded through the dispatch table.
pub struct AppContext {
    pub store: Store,
    pub layout: matrix_core::paths::Layout,
    pub config: Config,
}

impl AppContext {
    /// Resolve the layout, ensure its directories exist, load config, and
    /// open the store (running migrations if necessary).
    pub async fn open() -> Result<Self> {
        let layout = matrix_core::paths::Layout::discover().context("resolving data directory")?;
        layout.ensure().context("creating data directory")?;

        let config = matrix_core::config::load_config().context("loading configuration")?;

        let store_path = config.store_path.clone().unwrap_or_else(|| layout.db_path());
        let store = Store::open(&store_path)
            .await
            .context("opening store")?;

        Ok(Self { store, layout, config })
    }
}
