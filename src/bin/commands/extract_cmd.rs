use anyhow::{Context, Result};
use regext::app::{dispatch, render_completion, AppState, Command, Effect};
use regext::extraction::{Decoding, ExtractionResult};
use regext::worker::{self, ExtractionHandle};
use serde_json::json;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::cli_utils::{load_messages, write_lines};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Invalid format '{}', expected: text or json", s),
        }
    }
}

pub fn cmd_extract(
    store_path: PathBuf,
    pattern: String,
    inputs: Vec<PathBuf>,
    ndjson: bool,
    strict: bool,
    format: String,
) -> Result<()> {
    let output_format = OutputFormat::from_str(&format)?;
    let decoding = if strict {
        Decoding::Strict
    } else {
        Decoding::Lossy
    };

    let messages = load_messages(&inputs, ndjson)?;
    info!(messages = messages.len(), inputs = inputs.len(), "loaded message batch");

    let (mut state, mut status) = AppState::startup(&store_path);

    let selected: Vec<Effect> =
        dispatch(&mut state, Command::SelectPattern(pattern.trim().to_string()));
    if !selected.is_empty() {
        status.extend(log_lines(selected));
        emit_status(output_format, &status)?;
        anyhow::bail!("No pattern named '{}' in {}", pattern.trim(), store_path.display());
    }

    let started = Instant::now();
    let mut handle = None;
    for effect in dispatch(&mut state, Command::Extract { messages, decoding }) {
        match effect {
            Effect::Log(line) => status.push(line),
            Effect::Submit(job) => handle = Some(worker::submit(job)?),
        }
    }
    emit_status(output_format, &status)?;

    match handle {
        Some(handle) => finish(handle, &pattern, output_format, started),
        None => anyhow::bail!("Extraction with pattern '{}' aborted", pattern.trim()),
    }
}

fn log_lines(effects: Vec<Effect>) -> impl Iterator<Item = String> {
    effects.into_iter().filter_map(|effect| match effect {
        Effect::Log(line) => Some(line),
        Effect::Submit(_) => None,
    })
}

/// Status lines go to stdout in text mode, stderr when stdout carries JSON
fn emit_status(output_format: OutputFormat, lines: &[String]) -> io::Result<()> {
    match output_format {
        OutputFormat::Text => write_lines(&mut io::stdout().lock(), lines),
        OutputFormat::Json => write_lines(&mut io::stderr().lock(), lines),
    }
}

fn finish(
    handle: ExtractionHandle,
    pattern: &str,
    output_format: OutputFormat,
    started: Instant,
) -> Result<()> {
    let outcome = handle.wait();
    info!(elapsed_ms = started.elapsed().as_millis() as u64, "extraction finished");

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    write_report(&mut out, outcome, pattern, output_format)
}

/// Print the finished extraction; a failed worker still fails the command
fn write_report<W: Write>(
    out: &mut W,
    outcome: regext::Result<ExtractionResult>,
    pattern: &str,
    output_format: OutputFormat,
) -> Result<()> {
    match output_format {
        OutputFormat::Text => {
            let failed = outcome.is_err();
            write_lines(out, &render_completion(outcome))?;
            if failed {
                anyhow::bail!("Extraction with pattern '{}' failed", pattern.trim());
            }
        }
        OutputFormat::Json => {
            let result = outcome.context("Extraction worker failed")?;
            let errors: Vec<String> = result.skipped.iter().map(ToString::to_string).collect();
            let report = json!({
                "pattern": pattern.trim(),
                "scanned": result.scanned,
                "matches": result.matches,
                "errors": errors,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            out.flush()?;
        }
    }
    Ok(())
}
