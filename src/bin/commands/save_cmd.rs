use anyhow::{Context, Result};
use regext::PatternExtractor;
use std::path::PathBuf;

use crate::cli_utils::open_store;

pub fn cmd_save(store_path: PathBuf, name: String, pattern: String, check: bool) -> Result<()> {
    // The store accepts any text; --check rejects bad syntax up front
    if check {
        PatternExtractor::compile(pattern.trim())
            .with_context(|| format!("Refusing to save pattern '{}'", name.trim()))?;
    }

    let mut store = open_store(&store_path)?;
    let saved = store
        .save(&name, &pattern)
        .with_context(|| format!("Error saving pattern to {}", store_path.display()))?;

    println!("Pattern '{}' saved successfully.", saved);
    Ok(())
}
