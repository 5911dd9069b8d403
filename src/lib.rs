//! Regext - Named Regex Extraction for HTTP Responses
//!
//! Regext keeps a small library of named regular expressions and applies a
//! chosen one to a batch of HTTP response bodies, returning the unique
//! matches. It is the engine behind an interactive "extract matches from
//! selected responses" action: the host supplies the messages, regext does
//! the rest.
//!
//! # Quick Start
//!
//! ```rust
//! use regext::{Decoding, ExtractionJob, HttpMessage, PatternStore};
//! # let dir = std::env::temp_dir().join("regext_doctest_quickstart");
//! # std::fs::create_dir_all(&dir)?;
//! # let store_path = dir.join("saved_regex_patterns.json");
//!
//! // Store a pattern
//! let mut store = PatternStore::new(&store_path);
//! store.save("ids", r"\d+")?;
//!
//! // Apply it to some responses
//! let batch = vec![
//!     HttpMessage::new("id=42 id=42 id=7"),
//!     HttpMessage::without_response(),
//! ];
//! let job = ExtractionJob::prepare(Some("ids"), store.get("ids"), batch, Decoding::Strict)?;
//! let result = regext::worker::submit(job)?.wait()?;
//!
//! assert_eq!(result.scanned, 2);
//! assert_eq!(result.matches.iter().collect::<Vec<_>>(), vec!["42", "7"]);
//! # std::fs::remove_dir_all(&dir)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  Command   ┌──────────┐  ExtractionJob  ┌──────────────┐
//! │ front end  │ ─────────► │ app      │ ──────────────► │ worker       │
//! │ (CLI/host) │ ◄───────── │ dispatch │                 │ thread       │
//! └────────────┘  Effects   └────┬─────┘                 └──────┬───────┘
//!       ▲                        │ save / reload                │ run()
//!       │                   ┌────▼─────────┐          ┌─────────▼────────┐
//!       │                   │ PatternStore │          │ dedup by length  │
//!       │                   │ (JSON file)  │          │ scan, collect    │
//!       │                   └──────────────┘          └─────────┬────────┘
//!       └──────────────── render_completion() ◄─────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Application state and command dispatch
pub mod app;
/// Error types for regext operations
pub mod error;
pub mod extraction;
pub mod message;
pub mod pattern_store;
pub mod worker;

// Re-exports for Rust consumers

pub use crate::app::{dispatch, AppState, Command, Effect};
pub use crate::error::{RegextError, Result};
pub use crate::extraction::{
    dedup_by_length, Decoding, ExtractionJob, ExtractionPhase, ExtractionResult,
    PatternExtractor,
};
pub use crate::message::{HttpMessage, Message};
pub use crate::pattern_store::{PatternMap, PatternStore, DEFAULT_STORE_FILE};
pub use crate::worker::ExtractionHandle;

/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
