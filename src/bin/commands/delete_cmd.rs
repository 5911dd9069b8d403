use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::cli_utils::open_store;

pub fn cmd_delete(store_path: PathBuf, name: String) -> Result<()> {
    let mut store = open_store(&store_path)?;
    if !store.contains(name.trim()) {
        anyhow::bail!("No pattern named '{}' in {}", name.trim(), store_path.display());
    }

    store
        .remove(&name)
        .with_context(|| format!("Error saving pattern file {}", store_path.display()))?;

    println!("Pattern '{}' deleted.", name.trim());
    Ok(())
}
