use anyhow::Result;
use std::path::PathBuf;

use crate::cli_utils::open_store;

pub fn cmd_list(store_path: PathBuf, json: bool) -> Result<()> {
    let store = open_store(&store_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(store.patterns())?);
        return Ok(());
    }

    if store.is_empty() {
        eprintln!("No patterns saved in {}", store_path.display());
        return Ok(());
    }

    let width = store.names().map(str::len).max().unwrap_or(0);
    for (name, source) in store.patterns() {
        println!("{:<width$}  {}", name, source, width = width);
    }
    Ok(())
}
