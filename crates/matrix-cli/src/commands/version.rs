//! `matrix version`.

use anyhow::Result;

pub fn run() -> Result<()> {
    println!("matrix {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
