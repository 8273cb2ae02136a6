//! Handshake response headers.

use tracing::warn;

use crate::error::{Error, Result};

/// Header carrying the negotiated extensions.
pub const EXTENSIONS_HEADER: &str = "Sec-WebSocket-Extensions";

const SEPARATOR: &str = ": ";

/// Response headers reported when a connection opens, in arrival order.
///
/// Lookups are case-insensitive. Repeated names keep every value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    entries: Vec<(String, String)>,
}

impl ResponseHeaders {
    /// Create an empty header set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `\n`-separated blob of `Key: Value` records.
    ///
    /// Blank records are skipped. Records without `": "` are skipped with a
    /// warning.
    #[must_use]
    pub fn parse(blob: &str) -> Self {
        let mut headers = Self::new();
        for record in blob.split('\n') {
            if record.trim().is_empty() {
                continue;
            }
            match Self::parse_record(record) {
                Ok((name, value)) => headers.insert(name, value),
                Err(err) => warn!(error = %err, "skipping response header"),
            }
        }
        headers
    }

    /// Split one record on its first `": "`.
    ///
    /// A trailing `\r` is dropped from the value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedHeader`] if the separator is missing or the
    /// name is empty.
    pub fn parse_record(record: &str) -> Result<(String, String)> {
        let (name, value) = record
            .split_once(SEPARATOR)
            .ok_or_else(|| Error::MalformedHeader(record.to_string()))?;
        if name.is_empty() {
            return Err(Error::MalformedHeader(record.to_string()));
        }
        Ok((name.to_string(), value.trim_end_matches('\r').to_string()))
    }

    /// Append a header.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `name`, in arrival order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Check if `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All headers in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of `Sec-WebSocket-Extensions`. Empty if absent.
    ///
    /// The name matches case-insensitively. Repeated headers are all kept and
    /// joined with `", "`; the last one does not replace the earlier ones.
    #[must_use]
    pub fn extensions(&self) -> String {
        self.get_all(EXTENSIONS_HEADER).collect::<Vec<_>>().join(", ")
    }
}
