//! Messages and message batch readers
//!
//! The engine only needs one capability from a message: its response bytes,
//! which may be absent. [`Message`] captures that, and [`HttpMessage`] is the
//! owned implementation the CLI builds from files.
//!
//! Two on-disk batch shapes are supported:
//!
//! - **raw**: one file is one response body. Files ending in `.gz` are
//!   decompressed, `-` reads stdin, and an empty file is an empty response.
//! - **ndjson**: one JSON object per line, `{"response": "..."}`; a `null` or
//!   missing `response` is an absent response.
//!
//! ```rust,no_run
//! use regext::message;
//!
//! let mut batch = message::read_raw_batch(["resp1.bin", "resp2.bin.gz"])?;
//! batch.extend(message::read_ndjson("captured.ndjson")?);
//! # Ok::<(), std::io::Error>(())
//! ```

use flate2::read::GzDecoder;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, stdin, BufRead, BufReader, Read};
use std::path::Path;

/// Buffer size for file reading
const BUFFER_SIZE: usize = 128 * 1024;

/// Anything that carries an HTTP response body
pub trait Message {
    /// Raw response bytes, or `None` if the message has no response
    fn response(&self) -> Option<&[u8]>;

    /// Response length in bytes; absent responses count as 0
    fn response_len(&self) -> usize {
        self.response().map_or(0, <[u8]>::len)
    }

    /// Where the message came from, used to label decode errors
    fn origin(&self) -> Option<&str> {
        None
    }
}

/// Owned request/response pair as far as extraction is concerned
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpMessage {
    origin: String,
    response: Option<Vec<u8>>,
}

impl HttpMessage {
    /// Message with the given response body
    pub fn new(response: impl Into<Vec<u8>>) -> Self {
        Self {
            origin: String::new(),
            response: Some(response.into()),
        }
    }

    /// Message with no response at all
    pub fn without_response() -> Self {
        Self::default()
    }

    /// Attach a description of where the message came from
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }
}

impl Message for HttpMessage {
    fn response(&self) -> Option<&[u8]> {
        self.response.as_deref()
    }

    fn origin(&self) -> Option<&str> {
        (!self.origin.is_empty()).then_some(self.origin.as_str())
    }
}

impl Message for Vec<u8> {
    fn response(&self) -> Option<&[u8]> {
        Some(self)
    }
}

impl Message for &[u8] {
    fn response(&self) -> Option<&[u8]> {
        Some(self)
    }
}

impl Message for &str {
    fn response(&self) -> Option<&[u8]> {
        Some(self.as_bytes())
    }
}

impl<M: Message> Message for Option<M> {
    fn response(&self) -> Option<&[u8]> {
        self.as_ref().and_then(Message::response)
    }

    fn origin(&self) -> Option<&str> {
        self.as_ref().and_then(Message::origin)
    }
}

/// Open a file with automatic gzip detection based on file extension
///
/// Files ending in `.gz` (case-insensitive) are decompressed. The path `-`
/// reads from stdin.
pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();

    if path.to_str() == Some("-") {
        return Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, stdin())));
    }

    let file = File::open(path)?;

    let is_gzip = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    if is_gzip {
        let decoder = GzDecoder::new(file);
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, decoder)))
    } else {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
}

/// Read one file as a single response body
pub fn read_raw<P: AsRef<Path>>(path: P) -> io::Result<HttpMessage> {
    let path = path.as_ref();
    let mut body = Vec::new();
    open(path)?.read_to_end(&mut body)?;
    Ok(HttpMessage::new(body).with_origin(path.display().to_string()))
}

/// Read several files, one message per file, in the given order
pub fn read_raw_batch<I, P>(paths: I) -> io::Result<Vec<HttpMessage>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths.into_iter().map(read_raw).collect()
}

#[derive(Debug, Deserialize)]
struct MessageRecord {
    #[serde(default)]
    response: Option<String>,
}

/// Read an NDJSON batch, one message per non-blank line
pub fn read_ndjson<P: AsRef<Path>>(path: P) -> io::Result<Vec<HttpMessage>> {
    let path = path.as_ref();
    let mut data = Vec::new();
    open(path)?.read_to_end(&mut data)?;
    parse_ndjson(&data, &path.display().to_string())
}

/// Parse NDJSON bytes into messages, labelling each with `origin:line`
pub fn parse_ndjson(data: &[u8], origin: &str) -> io::Result<Vec<HttpMessage>> {
    let mut messages = Vec::new();
    let mut start = 0;
    let mut line_number = 0;

    let ends = memchr::memchr_iter(b'\n', data).chain(std::iter::once(data.len()));
    for end in ends {
        line_number += 1;
        let line = data[start..end].trim_ascii();
        start = end + 1;

        if line.is_empty() {
            continue;
        }

        let record: MessageRecord = serde_json::from_slice(line).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{}:{}: {}", origin, line_number, err),
            )
        })?;

        let message = match record.response {
            Some(body) => HttpMessage::new(body),
            None => HttpMessage::without_response(),
        };
        messages.push(message.with_origin(format!("{}:{}", origin, line_number)));
    }

    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_absent_response_has_zero_length() {
        let message = HttpMessage::without_response();
        assert_eq!(message.response(), None);
        assert_eq!(message.response_len(), 0);
        assert_eq!(HttpMessage::new("").response_len(), 0);
        assert_eq!(HttpMessage::new("x").origin(), None);
    }

    #[test]
    fn test_read_raw_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"HTTP/1.1 200 OK\r\n\r\nid=42").unwrap();
        file.flush().unwrap();

        let message = read_raw(file.path()).unwrap();
        assert_eq!(message.response_len(), 24);
        let origin = file.path().display().to_string();
        assert_eq!(message.origin(), Some(origin.as_str()));
    }

    #[test]
    fn test_read_gzip_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("body.bin.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"token=abc").unwrap();
        encoder.finish().unwrap();

        let message = read_raw(&path).unwrap();
        assert_eq!(message.response(), Some(&b"token=abc"[..]));
    }

    #[test]
    fn test_read_raw_missing_file() {
        assert!(read_raw("/nonexistent/regext/body.bin").is_err());
    }

    #[test]
    fn test_parse_ndjson() {
        let data = b"{\"response\": \"a=1\"}\n\n{\"response\": null}\n{}\n{\"response\": \"b\"}";
        let messages = parse_ndjson(data, "batch").unwrap();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].response(), Some(&b"a=1"[..]));
        assert_eq!(messages[1].response(), None);
        assert_eq!(messages[2].response(), None);
        assert_eq!(messages[3].origin(), Some("batch:5"));
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let err = parse_ndjson(b"{}\nnope\n", "batch").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().starts_with("batch:2:"));
    }
}
