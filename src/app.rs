//! Application state and command dispatch
//!
//! All user-facing state lives in [`AppState`]: the pattern store, the
//! currently selected pattern and the name/source editor fields. User
//! actions are [`Command`]s; [`dispatch`] applies one to the state and
//! returns the [`Effect`]s a front end has to carry out: log lines to show
//! and extraction jobs to hand to a worker.
//!
//! ```rust,no_run
//! use regext::app::{dispatch, AppState, Command, Effect};
//! use regext::extraction::Decoding;
//! use regext::message::HttpMessage;
//! use regext::worker;
//!
//! let (mut state, startup_lines) = AppState::startup("saved_regex_patterns.json");
//! for line in startup_lines {
//!     println!("{}", line);
//! }
//!
//! let mut pending = Vec::new();
//! let command = Command::Extract {
//!     messages: vec![HttpMessage::new("id=42")],
//!     decoding: Decoding::Strict,
//! };
//! for effect in dispatch(&mut state, command) {
//!     match effect {
//!         Effect::Log(line) => println!("{}", line),
//!         Effect::Submit(job) => pending.push(worker::submit(job)?),
//!     }
//! }
//! for handle in pending {
//!     for line in regext::app::render_completion(handle.wait()) {
//!         println!("{}", line);
//!     }
//! }
//! # Ok::<(), regext::RegextError>(())
//! ```

use crate::error::{RegextError, Result};
use crate::extraction::{Decoding, ExtractionJob, ExtractionResult};
use crate::message::{HttpMessage, Message};
use crate::pattern_store::PatternStore;
use std::path::Path;

/// Contents of the name and pattern editor fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternDraft {
    /// Pattern name field
    pub name: String,
    /// Pattern source field
    pub source: String,
}

/// Everything the front end displays, owned in one place
#[derive(Debug)]
pub struct AppState {
    store: PatternStore,
    selected: Option<String>,
    draft: PatternDraft,
}

/// A user action
#[derive(Debug)]
pub enum Command<M = HttpMessage> {
    /// Store `name -> source`, overwriting any existing pattern
    SavePattern {
        /// Pattern name
        name: String,
        /// Regex source
        source: String,
    },
    /// Re-read the backing store
    ReloadPatterns,
    /// Make a stored pattern the current one
    SelectPattern(String),
    /// Remove a stored pattern
    DeletePattern(String),
    /// Apply the selected pattern to a batch of messages
    Extract {
        /// Messages chosen in the host
        messages: Vec<M>,
        /// How response bytes become text
        decoding: Decoding,
    },
}

/// Something the front end must do after a dispatch
#[derive(Debug)]
pub enum Effect<M = HttpMessage> {
    /// Append a line to the output log
    Log(String),
    /// Run this job off the foreground thread and render its result
    Submit(ExtractionJob<M>),
}

impl AppState {
    /// Build state around an already loaded store
    ///
    /// The first pattern (by name) starts out selected.
    pub fn with_store(store: PatternStore) -> Self {
        let mut state = Self {
            store,
            selected: None,
            draft: PatternDraft::default(),
        };
        let first = state.store.names().next().map(str::to_string);
        if let Some(first) = first {
            state.select(first);
        }
        state
    }

    /// Load the store at `path` and build initial state
    ///
    /// A failed load yields an empty store plus the log line describing the
    /// failure.
    pub fn startup<P: AsRef<Path>>(path: P) -> (Self, Vec<String>) {
        let (store, error) = PatternStore::open(path);
        let lines = error.iter().map(load_failure_line).collect();
        (Self::with_store(store), lines)
    }

    /// The pattern store
    pub fn store(&self) -> &PatternStore {
        &self.store
    }

    /// Name of the selected pattern
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Source of the selected pattern
    pub fn selected_source(&self) -> Option<&str> {
        self.selected.as_deref().and_then(|name| self.store.get(name))
    }

    /// Editor field contents
    pub fn draft(&self) -> &PatternDraft {
        &self.draft
    }

    fn select(&mut self, name: String) {
        if let Some(source) = self.store.get(&name) {
            self.draft = PatternDraft {
                name: name.clone(),
                source: source.to_string(),
            };
            self.selected = Some(name);
        }
    }

    /// Keep the selection if it still exists, otherwise fall back to the
    /// first pattern or nothing. The draft follows the stored source.
    fn fix_selection(&mut self) {
        let keep = self
            .selected
            .take()
            .filter(|name| self.store.contains(name))
            .or_else(|| self.store.names().next().map(str::to_string));
        match keep {
            Some(name) => self.select(name),
            None => self.draft = PatternDraft::default(),
        }
    }
}

/// Apply one command to `state`
pub fn dispatch<M: Message>(state: &mut AppState, command: Command<M>) -> Vec<Effect<M>> {
    match command {
        Command::SavePattern { name, source } => save_pattern(state, &name, &source),
        Command::ReloadPatterns => reload_patterns(state),
        Command::SelectPattern(name) => {
            if state.store.contains(&name) {
                state.select(name);
                Vec::new()
            } else {
                vec![Effect::Log(RegextError::NoPattern.to_string())]
            }
        }
        Command::DeletePattern(name) => match state.store.remove(&name) {
            Ok(_) => {
                state.fix_selection();
                vec![Effect::Log(format!("Pattern '{}' deleted.", name.trim()))]
            }
            Err(err @ RegextError::StoreIo { .. }) => {
                state.fix_selection();
                vec![Effect::Log(format!("Error saving pattern: {}", err))]
            }
            Err(err) => vec![Effect::Log(err.to_string())],
        },
        Command::Extract { messages, decoding } => {
            let prepared = ExtractionJob::prepare(
                state.selected(),
                state.selected_source(),
                messages,
                decoding,
            );
            match prepared {
                Ok(job) => vec![
                    Effect::Log(format!("Processing {} responses...", job.message_count())),
                    Effect::Submit(job),
                ],
                Err(err) => vec![Effect::Log(err.to_string())],
            }
        }
    }
}

fn save_pattern<M>(state: &mut AppState, name: &str, source: &str) -> Vec<Effect<M>> {
    match state.store.save(name, source) {
        Ok(saved) => {
            if state.selected.is_none() || state.selected() == Some(saved.as_str()) {
                state.select(saved.clone());
            } else {
                state.draft = PatternDraft {
                    name: saved.clone(),
                    source: state.store.get(&saved).unwrap_or_default().to_string(),
                };
            }
            vec![Effect::Log(format!("Pattern '{}' saved successfully.", saved))]
        }
        Err(err @ RegextError::StoreIo { .. }) => {
            vec![Effect::Log(format!("Error saving pattern: {}", err))]
        }
        Err(err) => vec![Effect::Log(err.to_string())],
    }
}

fn reload_patterns<M>(state: &mut AppState) -> Vec<Effect<M>> {
    match state.store.reload() {
        Ok(true) => {
            state.fix_selection();
            let file = state
                .store
                .path()
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| state.store.path().display().to_string());
            vec![Effect::Log(format!("Patterns reloaded from {}.", file))]
        }
        Ok(false) => Vec::new(),
        Err(err) => vec![Effect::Log(load_failure_line(&err))],
    }
}

fn load_failure_line(err: &RegextError) -> String {
    match err {
        RegextError::StoreFormat(_) => err.to_string(),
        _ => format!("Failed to load regex patterns: {}", err),
    }
}

/// Log lines for a finished (or failed) background extraction
pub fn render_completion(outcome: Result<ExtractionResult>) -> Vec<String> {
    match outcome {
        Ok(result) => result.report_lines(),
        Err(err) => vec![err.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern_store::DEFAULT_STORE_FILE;
    use std::fs;
    use tempfile::TempDir;

    fn logs<M>(effects: &[Effect<M>]) -> Vec<&str> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Log(line) => Some(line.as_str()),
                Effect::Submit(_) => None,
            })
            .collect()
    }

    fn fresh_state(dir: &TempDir) -> AppState {
        let (state, lines) = AppState::startup(dir.path().join(DEFAULT_STORE_FILE));
        assert!(lines.is_empty());
        state
    }

    fn save(state: &mut AppState, name: &str, source: &str) -> Vec<Effect> {
        dispatch(
            state,
            Command::SavePattern {
                name: name.to_string(),
                source: source.to_string(),
            },
        )
    }

    #[test]
    fn test_startup_selects_first_pattern() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_STORE_FILE);
        fs::write(&path, r#"{"zulu": "z", "alpha": "a"}"#).unwrap();

        let (state, lines) = AppState::startup(&path);
        assert!(lines.is_empty());
        assert_eq!(state.selected(), Some("alpha"));
        assert_eq!(state.draft().source, "a");
    }

    #[test]
    fn test_startup_reports_bad_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_STORE_FILE);
        fs::write(&path, "[1]").unwrap();

        let (state, lines) = AppState::startup(&path);
        assert!(state.store().is_empty());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Pattern file format is invalid"));
    }

    #[test]
    fn test_save_logs_and_selects_first() {
        let dir = TempDir::new().unwrap();
        let mut state = fresh_state(&dir);

        let effects = save(&mut state, "ids", r"\d+");
        assert_eq!(logs(&effects), vec!["Pattern 'ids' saved successfully."]);
        assert_eq!(state.selected(), Some("ids"));

        save(&mut state, "other", "x");
        assert_eq!(state.selected(), Some("ids"));
    }

    #[test]
    fn test_overwrite_selected_refreshes_draft() {
        let dir = TempDir::new().unwrap();
        let mut state = fresh_state(&dir);
        save(&mut state, "a", "1");
        save(&mut state, "a", "2");

        assert_eq!(state.selected_source(), Some("2"));
        assert_eq!(
            state.draft(),
            &PatternDraft {
                name: "a".into(),
                source: "2".into()
            }
        );
    }

    #[test]
    fn test_save_other_pattern_fills_draft_with_saved_text() {
        let dir = TempDir::new().unwrap();
        let mut state = fresh_state(&dir);
        save(&mut state, "a", "1");
        save(&mut state, "b", "  2 ");

        assert_eq!(state.selected(), Some("a"));
        assert_eq!(
            state.draft(),
            &PatternDraft {
                name: "b".into(),
                source: "2".into()
            }
        );
    }

    #[test]
    fn test_reload_refreshes_draft_of_kept_selection() {
        let dir = TempDir::new().unwrap();
        let mut state = fresh_state(&dir);
        save(&mut state, "keep", "old");
        fs::write(state.store().path(), r#"{"keep": "new", "other": "o"}"#).unwrap();

        let effects: Vec<Effect> = dispatch(&mut state, Command::ReloadPatterns);
        assert_eq!(effects.len(), 1);
        assert_eq!(state.selected(), Some("keep"));
        assert_eq!(state.draft().source, "new");
    }

    #[test]
    fn test_delete_last_pattern_clears_draft() {
        let dir = TempDir::new().unwrap();
        let mut state = fresh_state(&dir);
        save(&mut state, "only", "o");

        dispatch::<HttpMessage>(&mut state, Command::DeletePattern("only".into()));
        assert_eq!(state.selected(), None);
        assert_eq!(state.draft(), &PatternDraft::default());
    }

    #[test]
    fn test_save_validation() {
        let dir = TempDir::new().unwrap();
        let mut state = fresh_state(&dir);

        let effects = save(&mut state, "  ", "x");
        assert_eq!(logs(&effects), vec!["Please enter both name and regex pattern."]);
        assert!(state.store().is_empty());
    }

    #[test]
    fn test_select_fills_draft() {
        let dir = TempDir::new().unwrap();
        let mut state = fresh_state(&dir);
        save(&mut state, "a", "1");
        save(&mut state, "b", "2");

        let effects: Vec<Effect> = dispatch(&mut state, Command::SelectPattern("b".into()));
        assert!(effects.is_empty());
        assert_eq!(
            state.draft(),
            &PatternDraft {
                name: "b".into(),
                source: "2".into()
            }
        );

        let effects: Vec<Effect> = dispatch(&mut state, Command::SelectPattern("zz".into()));
        assert_eq!(logs(&effects), vec!["No regex pattern selected."]);
        assert_eq!(state.selected(), Some("b"));
    }

    #[test]
    fn test_reload_empty_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut state = fresh_state(&dir);
        save(&mut state, "keep", "k");
        fs::write(state.store().path(), "{}").unwrap();

        let effects: Vec<Effect> = dispatch(&mut state, Command::ReloadPatterns);
        assert!(effects.is_empty());
        assert_eq!(state.selected(), Some("keep"));
        assert_eq!(state.store().len(), 1);
    }

    #[test]
    fn test_reload_moves_selection_when_gone() {
        let dir = TempDir::new().unwrap();
        let mut state = fresh_state(&dir);
        save(&mut state, "gone", "g");
        fs::write(state.store().path(), r#"{"new": "n"}"#).unwrap();

        let effects: Vec<Effect> = dispatch(&mut state, Command::ReloadPatterns);
        assert_eq!(
            logs(&effects),
            vec!["Patterns reloaded from saved_regex_patterns.json."]
        );
        assert_eq!(state.selected(), Some("new"));
    }

    #[test]
    fn test_delete_selected_pattern() {
        let dir = TempDir::new().unwrap();
        let mut state = fresh_state(&dir);
        save(&mut state, "a", "1");
        save(&mut state, "b", "2");

        let effects: Vec<Effect> = dispatch(&mut state, Command::DeletePattern("a".into()));
        assert_eq!(logs(&effects), vec!["Pattern 'a' deleted."]);
        assert_eq!(state.selected(), Some("b"));

        let effects: Vec<Effect> = dispatch(&mut state, Command::DeletePattern("a".into()));
        assert_eq!(logs(&effects), vec!["No regex pattern selected."]);
    }

    #[test]
    fn test_extract_without_messages() {
        let dir = TempDir::new().unwrap();
        let mut state = fresh_state(&dir);
        save(&mut state, "ids", r"\d+");

        let effects = dispatch(
            &mut state,
            Command::Extract {
                messages: Vec::<HttpMessage>::new(),
                decoding: Decoding::Strict,
            },
        );
        assert_eq!(logs(&effects), vec!["No requests selected."]);
    }

    #[test]
    fn test_extract_without_pattern() {
        let dir = TempDir::new().unwrap();
        let mut state = fresh_state(&dir);

        let effects = dispatch(
            &mut state,
            Command::Extract {
                messages: vec![HttpMessage::new("1")],
                decoding: Decoding::Strict,
            },
        );
        assert_eq!(logs(&effects), vec!["No regex pattern selected."]);
    }

    #[test]
    fn test_extract_bad_pattern() {
        let dir = TempDir::new().unwrap();
        let mut state = fresh_state(&dir);
        save(&mut state, "broken", "(");

        let effects = dispatch(
            &mut state,
            Command::Extract {
                messages: vec![HttpMessage::new("1")],
                decoding: Decoding::Strict,
            },
        );
        assert_eq!(effects.len(), 1);
        assert!(logs(&effects)[0].starts_with("Regex compile error:"));
    }

    #[test]
    fn test_extract_submits_job() {
        let dir = TempDir::new().unwrap();
        let mut state = fresh_state(&dir);
        save(&mut state, "ids", r"\d+");

        let effects = dispatch(
            &mut state,
            Command::Extract {
                messages: vec![HttpMessage::new("id=1"), HttpMessage::new("id=2")],
                decoding: Decoding::Strict,
            },
        );
        assert_eq!(logs(&effects), vec!["Processing 2 responses..."]);

        let job = effects
            .into_iter()
            .find_map(|effect| match effect {
                Effect::Submit(job) => Some(job),
                Effect::Log(_) => None,
            })
            .unwrap();
        assert_eq!(job.pattern_name(), "ids");
        assert_eq!(
            render_completion(Ok(job.run())),
            vec![
                "Unique responses processed: 1",
                "--- Matches from Responses ---",
                "1"
            ]
        );
    }

    #[test]
    fn test_render_worker_failure() {
        let lines = render_completion(Err(RegextError::Worker("worker panicked".into())));
        assert_eq!(lines, vec!["Error retrieving matches: worker panicked"]);
    }
}
