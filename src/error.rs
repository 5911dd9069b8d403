/// Error types for the regext library
use std::io;
use std::path::PathBuf;

/// Result type alias for regext operations
pub type Result<T> = std::result::Result<T, RegextError>;

/// Main error type for regext operations
///
/// Every variant renders as a single human-readable line suitable for the
/// output log. None of them is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum RegextError {
    /// Backing store is present but is not a JSON object of strings
    #[error("Pattern file format is invalid: {0}")]
    StoreFormat(String),

    /// Backing store could not be read or written
    #[error("Pattern file I/O error ({}): {source}", path.display())]
    StoreIo {
        /// Path of the backing store
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// Empty name or pattern on save
    #[error("Please enter both name and regex pattern.")]
    Validation,

    /// Selected pattern source does not compile
    #[error("Regex compile error: {0}")]
    PatternCompile(#[from] regex::Error),

    /// A single response could not be decoded to text
    #[error("Error processing a response: message {index}{}: {reason}", origin_suffix(.origin))]
    MessageDecode {
        /// Position of the message in the submitted batch
        index: usize,
        /// Where the message came from, when known
        origin: Option<String>,
        /// Why decoding failed
        reason: String,
    },

    /// Extraction requested with no messages
    #[error("No requests selected.")]
    NoSelection,

    /// No pattern is selected, or the named pattern does not exist
    #[error("No regex pattern selected.")]
    NoPattern,

    /// Background extraction worker exited without a result
    #[error("Error retrieving matches: {0}")]
    Worker(String),
}

impl RegextError {
    pub(crate) fn store_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        RegextError::StoreIo {
            path: path.into(),
            source,
        }
    }
}

fn origin_suffix(origin: &Option<String>) -> String {
    origin
        .as_deref()
        .map(|origin| format!(" ({})", origin))
        .unwrap_or_default()
}

impl From<serde_json::Error> for RegextError {
    fn from(err: serde_json::Error) -> Self {
        RegextError::StoreFormat(err.to_string())
    }
}
