use anyhow::Result;
use std::path::PathBuf;

use crate::cli_utils::open_store;

pub fn cmd_show(store_path: PathBuf, name: String) -> Result<()> {
    let store = open_store(&store_path)?;
    match store.get(name.trim()) {
        Some(source) => {
            println!("{}", source);
            Ok(())
        }
        None => anyhow::bail!("No pattern named '{}' in {}", name.trim(), store_path.display()),
    }
}
