use anyhow::Result;
use regext::app::{dispatch, render_completion, AppState, Command, Effect};
use regext::extraction::Decoding;
use regext::worker::{self, ExtractionHandle};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use tracing::debug;

use crate::cli_utils::{load_messages, write_lines};

const HELP: &str = "\
Commands:
  save <name> <pattern>        store or overwrite a pattern
  load                         reload patterns from the pattern file
  select <name>                make a pattern the current one
  delete <name>                remove a pattern
  list                         list saved patterns (* = selected)
  show                         show the last saved or selected pattern
  extract [--ndjson] <file>... extract matches in the background
  wait                         wait for running extractions
  help                         show this help
  quit                         leave the shell";

#[derive(Debug, PartialEq, Eq)]
enum ShellCommand {
    Save { name: String, source: String },
    Load,
    Select(String),
    Delete(String),
    List,
    Show,
    Extract { inputs: Vec<PathBuf>, ndjson: bool },
    Wait,
    Help,
    Quit,
}

impl ShellCommand {
    /// Parse one input line. `Ok(None)` for blank lines.
    fn parse(line: &str) -> std::result::Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "save" => {
                // Everything after the name is the pattern, spaces included
                let (name, source) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                ShellCommand::Save {
                    name: name.to_string(),
                    source: source.trim().to_string(),
                }
            }
            "load" | "reload" => ShellCommand::Load,
            "select" | "use" => ShellCommand::Select(required(word, rest)?),
            "delete" | "rm" => ShellCommand::Delete(required(word, rest)?),
            "list" | "ls" => ShellCommand::List,
            "show" => ShellCommand::Show,
            "extract" | "x" => {
                let mut ndjson = false;
                let mut inputs = Vec::new();
                for arg in rest.split_whitespace() {
                    match arg {
                        "--ndjson" => ndjson = true,
                        _ => inputs.push(PathBuf::from(arg)),
                    }
                }
                ShellCommand::Extract { inputs, ndjson }
            }
            "wait" => ShellCommand::Wait,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            _ => return Err(format!("Unknown command '{}', type 'help'", word)),
        };
        Ok(Some(command))
    }
}

fn required(word: &str, rest: &str) -> std::result::Result<String, String> {
    if rest.is_empty() {
        Err(format!("Usage: {} <name>", word))
    } else {
        Ok(rest.to_string())
    }
}

pub fn cmd_shell(store_path: PathBuf, strict: bool) -> Result<()> {
    let decoding = if strict {
        Decoding::Strict
    } else {
        Decoding::Lossy
    };
    let interactive = io::stdin().is_terminal();

    let (mut state, startup_lines) = AppState::startup(&store_path);
    let mut out = io::stdout();
    write_lines(&mut out, &startup_lines)?;

    let mut pending: Vec<ExtractionHandle> = Vec::new();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();

    loop {
        drain_finished(&mut pending, &mut out)?;

        if interactive {
            write!(out, "regext> ")?;
            out.flush()?;
        }

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let command = match ShellCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(msg) => {
                write_lines(&mut out, &[msg])?;
                continue;
            }
        };

        let effects: Vec<Effect> = match command {
            ShellCommand::Quit => break,
            ShellCommand::Help => {
                write_lines(&mut out, &[HELP])?;
                continue;
            }
            ShellCommand::Wait => {
                wait_all(&mut pending, &mut out)?;
                continue;
            }
            ShellCommand::List => {
                write_lines(&mut out, &list_lines(&state))?;
                continue;
            }
            ShellCommand::Show => {
                let draft = state.draft();
                let lines = if draft.name.is_empty() {
                    vec!["No regex pattern selected.".to_string()]
                } else {
                    vec![format!("{}: {}", draft.name, draft.source)]
                };
                write_lines(&mut out, &lines)?;
                continue;
            }
            ShellCommand::Save { name, source } => {
                dispatch(&mut state, Command::SavePattern { name, source })
            }
            ShellCommand::Load => dispatch(&mut state, Command::ReloadPatterns),
            ShellCommand::Select(name) => dispatch(&mut state, Command::SelectPattern(name)),
            ShellCommand::Delete(name) => dispatch(&mut state, Command::DeletePattern(name)),
            ShellCommand::Extract { inputs, ndjson } => match load_messages(&inputs, ndjson) {
                Ok(messages) => dispatch(&mut state, Command::Extract { messages, decoding }),
                Err(err) => vec![Effect::Log(format!("{:#}", err))],
            },
        };

        for effect in effects {
            match effect {
                Effect::Log(msg) => write_lines(&mut out, &[msg])?,
                Effect::Submit(job) => match worker::submit(job) {
                    Ok(handle) => {
                        debug!(worker = handle.id(), "extraction submitted");
                        pending.push(handle);
                    }
                    Err(err) => write_lines(&mut out, &[err.to_string()])?,
                },
            }
        }
    }

    // Don't lose results of extractions still running at exit
    wait_all(&mut pending, &mut out)
}

fn list_lines(state: &AppState) -> Vec<String> {
    if state.store().is_empty() {
        return vec!["No patterns saved.".to_string()];
    }
    state
        .store()
        .patterns()
        .iter()
        .map(|(name, source)| {
            let marker = if state.selected() == Some(name.as_str()) {
                '*'
            } else {
                ' '
            };
            format!("{} {}  {}", marker, name, source)
        })
        .collect()
}

/// Render every extraction that has finished, keep the rest pending
fn drain_finished<W: Write>(pending: &mut Vec<ExtractionHandle>, out: &mut W) -> io::Result<()> {
    let mut still_running = Vec::with_capacity(pending.len());
    for mut handle in pending.drain(..) {
        match handle.try_result() {
            Some(outcome) => write_lines(out, &render_completion(outcome))?,
            None => still_running.push(handle),
        }
    }
    *pending = still_running;
    Ok(())
}

fn wait_all<W: Write>(pending: &mut Vec<ExtractionHandle>, out: &mut W) -> Result<()> {
    for handle in pending.drain(..) {
        write_lines(out, &render_completion(handle.wait()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_save_keeps_spaces_in_pattern() {
        assert_eq!(
            ShellCommand::parse("save greeting  hello \\w+ world\n"),
            Ok(Some(ShellCommand::Save {
                name: "greeting".to_string(),
                source: "hello \\w+ world".to_string(),
            }))
        );
    }

    #[test]
    fn test_parse_save_without_pattern() {
        assert_eq!(
            ShellCommand::parse("save onlyname"),
            Ok(Some(ShellCommand::Save {
                name: "onlyname".to_string(),
                source: String::new(),
            }))
        );
    }

    #[test]
    fn test_parse_extract() {
        assert_eq!(
            ShellCommand::parse("extract --ndjson a.ndjson b.ndjson"),
            Ok(Some(ShellCommand::Extract {
                inputs: vec![PathBuf::from("a.ndjson"), PathBuf::from("b.ndjson")],
                ndjson: true,
            }))
        );
    }

    #[test]
    fn test_parse_blank_and_unknown() {
        assert_eq!(ShellCommand::parse("   \n"), Ok(None));
        assert!(ShellCommand::parse("frobnicate").is_err());
        assert!(ShellCommand::parse("select").is_err());
    }
}
