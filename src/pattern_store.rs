//! Durable mapping from pattern name to regex source
//!
//! Patterns live in a single JSON object on disk, `{"name": "source", ...}`,
//! rewritten in full (pretty-printed, 4-space indent) on every save.
//!
//! # Example
//!
//! ```rust,no_run
//! use regext::PatternStore;
//!
//! let (mut store, load_error) = PatternStore::open("saved_regex_patterns.json");
//! if let Some(err) = load_error {
//!     eprintln!("{}", err);
//! }
//!
//! store.save("numbers", r"\d+")?;
//! assert_eq!(store.get("numbers"), Some(r"\d+"));
//! # Ok::<(), regext::RegextError>(())
//! ```
//!
//! Load failures are never fatal: the store simply starts out empty. The
//! store does not check that a source compiles; that happens when the
//! pattern is used for extraction.

use crate::error::{RegextError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name used when no store path is configured
pub const DEFAULT_STORE_FILE: &str = "saved_regex_patterns.json";

/// Pattern name to regex source, ordered by name
pub type PatternMap = BTreeMap<String, String>;

/// Named regex patterns backed by a JSON file
#[derive(Debug, Clone)]
pub struct PatternStore {
    path: PathBuf,
    patterns: PatternMap,
}

impl PatternStore {
    /// Create an empty store bound to `path` without touching the file
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            patterns: PatternMap::new(),
        }
    }

    /// Create a store and load whatever is at `path`
    ///
    /// A load failure leaves the store empty and is returned alongside it so
    /// the caller can report it.
    pub fn open<P: AsRef<Path>>(path: P) -> (Self, Option<RegextError>) {
        let mut store = Self::new(path);
        match store.load() {
            Ok(patterns) => {
                store.patterns = patterns;
                (store, None)
            }
            Err(err) => {
                warn!(path = %store.path.display(), error = %err, "failed to load patterns");
                (store, Some(err))
            }
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the backing file without modifying the in-memory mapping
    pub fn load(&self) -> Result<PatternMap> {
        read_patterns(&self.path)
    }

    /// Insert or overwrite `name -> source` and rewrite the backing file
    ///
    /// Both values are trimmed first; if either ends up empty nothing is
    /// changed and [`RegextError::Validation`] is returned. If the write
    /// fails the in-memory mapping keeps the new entry.
    ///
    /// Returns the trimmed name that was stored.
    pub fn save(&mut self, name: &str, source: &str) -> Result<String> {
        let name = name.trim();
        let source = source.trim();
        if name.is_empty() || source.is_empty() {
            return Err(RegextError::Validation);
        }

        self.patterns.insert(name.to_string(), source.to_string());
        self.persist()?;
        debug!(name, "pattern saved");
        Ok(name.to_string())
    }

    /// Replace the mapping with a fresh load of the backing file
    ///
    /// Returns `Ok(false)` and leaves the mapping untouched when the file
    /// holds no patterns. On error the mapping is also left untouched.
    pub fn reload(&mut self) -> Result<bool> {
        let fresh = self.load()?;
        if fresh.is_empty() {
            return Ok(false);
        }
        self.patterns = fresh;
        Ok(true)
    }

    /// Remove a pattern and rewrite the backing file
    pub fn remove(&mut self, name: &str) -> Result<String> {
        let source = self
            .patterns
            .remove(name.trim())
            .ok_or(RegextError::NoPattern)?;
        self.persist()?;
        Ok(source)
    }

    /// Look up a pattern source by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.patterns.get(name).map(String::as_str)
    }

    /// Check whether a pattern with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.patterns.contains_key(name)
    }

    /// Pattern names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(String::as_str)
    }

    /// The whole mapping
    pub fn patterns(&self) -> &PatternMap {
        &self.patterns
    }

    /// Number of stored patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True if no patterns are stored
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    fn persist(&self) -> Result<()> {
        write_patterns(&self.path, &self.patterns)
    }
}

/// Read a pattern file
///
/// A missing file is an empty mapping. Anything other than a JSON object
/// whose values are all strings is a [`RegextError::StoreFormat`].
pub fn read_patterns(path: &Path) -> Result<PatternMap> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(PatternMap::new()),
        Err(err) => return Err(RegextError::store_io(path, err)),
    };

    let object = match serde_json::from_slice::<Value>(&bytes)? {
        Value::Object(object) => object,
        other => {
            return Err(RegextError::StoreFormat(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            )))
        }
    };

    object
        .into_iter()
        .map(|(name, value)| match value {
            Value::String(source) => Ok((name, source)),
            other => Err(RegextError::StoreFormat(format!(
                "pattern '{}' is {}, expected a string",
                name,
                json_kind(&other)
            ))),
        })
        .collect()
}

/// Write a pattern file as a 4-space indented JSON object
pub fn write_patterns(path: &Path, patterns: &PatternMap) -> Result<()> {
    let mut buf = Vec::with_capacity(64 * patterns.len() + 2);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    patterns.serialize(&mut serializer)?;
    buf.push(b'\n');

    fs::write(path, buf).map_err(|err| RegextError::store_io(path, err))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
