//! Apply one regex to a batch of HTTP responses
//!
//! Extraction runs in two halves so the expensive part can move off the
//! caller's thread:
//!
//! 1. [`ExtractionJob::prepare`] validates the request and compiles the
//!    pattern. Empty batches, missing patterns and bad syntax are rejected
//!    here, before anything is scanned.
//! 2. [`ExtractionJob::run`] deduplicates the batch by response length,
//!    scans every survivor and collects the unique matches.
//!
//! ```text
//! Validating → Compiling → Deduplicating → Scanning → Reporting
//!     └────────────┴── early abort ──────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use regext::extraction::{Decoding, ExtractionJob};
//!
//! let batch = vec!["id=42 id=42 id=7"];
//! let job = ExtractionJob::prepare(Some("ids"), Some(r"\d+"), batch, Decoding::Strict)?;
//! let result = job.run();
//!
//! assert_eq!(result.scanned, 1);
//! assert_eq!(result.matches.into_iter().collect::<Vec<_>>(), vec!["42", "7"]);
//! # Ok::<(), regext::RegextError>(())
//! ```
//!
//! # Deduplication
//!
//! Two messages whose responses have the same byte length are treated as the
//! same message and only the first is scanned. This is an approximation:
//! distinct bodies of equal length collapse into one and their matches are
//! lost.

use crate::error::{RegextError, Result};
use crate::message::Message;
use regex::Regex;
use rustc_hash::FxHashSet;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::str::Utf8Error;
use std::sync::Arc;
use tracing::{debug, warn};

/// Stages of a single extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionPhase {
    /// Checking that messages and a pattern were supplied
    Validating,
    /// Compiling the pattern source
    Compiling,
    /// Dropping messages whose response length was already seen
    Deduplicating,
    /// Running the pattern over each surviving response
    Scanning,
    /// Handing back a result or an error
    Reporting,
}

impl fmt::Display for ExtractionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractionPhase::Validating => "validating",
            ExtractionPhase::Compiling => "compiling",
            ExtractionPhase::Deduplicating => "deduplicating",
            ExtractionPhase::Scanning => "scanning",
            ExtractionPhase::Reporting => "reporting",
        };
        f.write_str(name)
    }
}

/// How response bytes become text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decoding {
    /// Replace invalid sequences with U+FFFD; never fails
    #[default]
    Lossy,
    /// Require valid UTF-8; other responses are skipped and reported
    Strict,
}

/// A compiled pattern plus the decoding policy used to feed it
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    regex: Regex,
    decoding: Decoding,
}

impl PatternExtractor {
    /// Compile `source`, rejecting invalid syntax
    pub fn compile(source: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(source)?,
            decoding: Decoding::default(),
        })
    }

    /// Use a different decoding policy
    pub fn with_decoding(mut self, decoding: Decoding) -> Self {
        self.decoding = decoding;
        self
    }

    /// The compiled pattern
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// The decoding policy
    pub fn decoding(&self) -> Decoding {
        self.decoding
    }

    /// Decode one response to text
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> std::result::Result<Cow<'a, str>, Utf8Error> {
        match self.decoding {
            Decoding::Lossy => Ok(String::from_utf8_lossy(bytes)),
            Decoding::Strict => std::str::from_utf8(bytes).map(Cow::Borrowed),
        }
    }

    /// Add every non-overlapping match in `text` to `out`
    ///
    /// What counts as "the match" depends on the number of capture groups:
    /// none collects the whole match, one collects that group (empty when it
    /// did not participate), several collect the groups joined by tabs.
    pub fn collect_matches(&self, text: &str, out: &mut BTreeSet<String>) {
        match self.regex.captures_len() - 1 {
            0 => {
                for m in self.regex.find_iter(text) {
                    out.insert(m.as_str().to_owned());
                }
            }
            1 => {
                for caps in self.regex.captures_iter(text) {
                    out.insert(caps.get(1).map_or("", |m| m.as_str()).to_owned());
                }
            }
            groups => {
                for caps in self.regex.captures_iter(text) {
                    let joined = (1..=groups)
                        .map(|i| caps.get(i).map_or("", |m| m.as_str()))
                        .collect::<Vec<_>>()
                        .join("\t");
                    out.insert(joined);
                }
            }
        }
    }

    /// Deduplicate `messages` and scan the survivors
    ///
    /// Fails only when the batch is empty.
    pub fn extract<M: Message>(&self, messages: &[M]) -> Result<ExtractionResult> {
        if messages.is_empty() {
            return Err(RegextError::NoSelection);
        }
        Ok(self.scan(messages))
    }

    /// Deduplicate `messages` and scan the survivors, empty batch included
    pub fn scan<M: Message>(&self, messages: &[M]) -> ExtractionResult {
        debug!(phase = %ExtractionPhase::Deduplicating, messages = messages.len());
        let unique = dedup_by_length(messages);

        debug!(phase = %ExtractionPhase::Scanning, unique = unique.len());
        let mut result = ExtractionResult::default();
        for &index in &unique {
            result.scanned += 1;
            let message = &messages[index];
            match self.decode(message.response().unwrap_or_default()) {
                Ok(text) => self.collect_matches(&text, &mut result.matches),
                Err(err) => {
                    let err = RegextError::MessageDecode {
                        index,
                        origin: message.origin().map(str::to_owned),
                        reason: err.to_string(),
                    };
                    warn!(index, error = %err, "skipping response");
                    result.skipped.push(err);
                }
            }
        }

        debug!(
            phase = %ExtractionPhase::Reporting,
            scanned = result.scanned,
            matches = result.matches.len()
        );
        result
    }
}

/// Indices of the first message seen for each distinct response length
///
/// Input order is preserved. Absent responses count as length 0.
pub fn dedup_by_length<M: Message>(messages: &[M]) -> Vec<usize> {
    let mut seen_lengths = FxHashSet::default();
    messages
        .iter()
        .enumerate()
        .filter(|(_, message)| seen_lengths.insert(message.response_len()))
        .map(|(index, _)| index)
        .collect()
}

/// Outcome of one extraction
#[derive(Debug, Default)]
pub struct ExtractionResult {
    /// Unique match texts, sorted
    pub matches: BTreeSet<String>,
    /// Messages that survived deduplication and were attempted
    pub scanned: usize,
    /// Per-message decode failures; those messages matched nothing
    pub skipped: Vec<RegextError>,
}

impl ExtractionResult {
    /// Human-readable report, one log line per entry
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.skipped.iter().map(ToString::to_string).collect();
        lines.push(format!("Unique responses processed: {}", self.scanned));
        if self.matches.is_empty() {
            lines.push("No matches found in the responses.".to_string());
        } else {
            lines.push("--- Matches from Responses ---".to_string());
            lines.extend(self.matches.iter().cloned());
        }
        lines
    }
}

/// A validated, compiled extraction ready to run
///
/// Holds the pattern and batch behind `Arc`s so it can be moved to a worker
/// thread while other jobs share the same data read-only.
#[derive(Debug)]
pub struct ExtractionJob<M> {
    pattern_name: String,
    extractor: Arc<PatternExtractor>,
    messages: Arc<[M]>,
}

impl<M> Clone for ExtractionJob<M> {
    fn clone(&self) -> Self {
        Self {
            pattern_name: self.pattern_name.clone(),
            extractor: Arc::clone(&self.extractor),
            messages: Arc::clone(&self.messages),
        }
    }
}

impl<M: Message> ExtractionJob<M> {
    /// Validate and compile an extraction request
    ///
    /// Checks run in order and stop at the first failure: an empty batch is
    /// [`RegextError::NoSelection`], a missing or empty source is
    /// [`RegextError::NoPattern`], bad syntax is
    /// [`RegextError::PatternCompile`].
    pub fn prepare(
        pattern_name: Option<&str>,
        source: Option<&str>,
        messages: impl Into<Arc<[M]>>,
        decoding: Decoding,
    ) -> Result<Self> {
        debug!(phase = %ExtractionPhase::Validating);
        let messages = messages.into();
        if messages.is_empty() {
            return Err(RegextError::NoSelection);
        }
        let source = source
            .filter(|source| !source.is_empty())
            .ok_or(RegextError::NoPattern)?;

        debug!(phase = %ExtractionPhase::Compiling, pattern = pattern_name.unwrap_or_default());
        let extractor = PatternExtractor::compile(source)?.with_decoding(decoding);

        Ok(Self {
            pattern_name: pattern_name.unwrap_or_default().to_string(),
            extractor: Arc::new(extractor),
            messages,
        })
    }

    /// Name of the stored pattern this job uses (may be empty)
    pub fn pattern_name(&self) -> &str {
        &self.pattern_name
    }

    /// Size of the batch before deduplication
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Deduplicate and scan the batch
    pub fn run(&self) -> ExtractionResult {
        self.extractor.scan(&self.messages)
    }
}
