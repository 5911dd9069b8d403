use anyhow::{Context, Result};
use regext::message::{self, HttpMessage};
use regext::PatternStore;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Install the stderr diagnostics subscriber.
/// `RUST_LOG` wins over the verbosity count when set.
pub fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (tests, embedding) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Open the pattern store for a one-shot command.
/// Unlike the interactive shell, an unreadable file is an error here so a
/// following save cannot overwrite it.
pub fn open_store(path: &Path) -> Result<PatternStore> {
    let (store, load_error) = PatternStore::open(path);
    if let Some(err) = load_error {
        return Err(err).with_context(|| format!("Failed to load patterns: {}", path.display()));
    }
    Ok(store)
}

/// Read a message batch from the command line inputs.
/// Raw mode: one file per message. NDJSON mode: one message per line.
pub fn load_messages(inputs: &[PathBuf], ndjson: bool) -> Result<Vec<HttpMessage>> {
    let mut messages = Vec::with_capacity(inputs.len());
    for input in inputs {
        if ndjson {
            let batch = message::read_ndjson(input)
                .with_context(|| format!("Failed to read messages: {}", input.display()))?;
            messages.extend(batch);
        } else {
            let message = message::read_raw(input)
                .with_context(|| format!("Failed to read response: {}", input.display()))?;
            messages.push(message);
        }
    }
    Ok(messages)
}

/// Append lines to the output log
pub fn write_lines<W: Write, S: AsRef<str>>(writer: &mut W, lines: &[S]) -> io::Result<()> {
    for line in lines {
        writeln!(writer, "{}", line.as_ref())?;
    }
    writer.flush()
}
