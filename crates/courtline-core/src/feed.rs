//! JSON-lines event feeds
//!
//! One `EventEnvelope` per line. Blank lines are skipped. A malformed line is
//! reported with its line number.

use crate::events::EventEnvelope;
use std::io::BufRead;
use thiserror::Error;
use tracing::warn;

/// Errors from reading a feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The underlying reader failed.
    #[error("feed io error: {0}")]
    Io(#[from] std::io::Error),

    /// A line did not decode as an event.
    #[error("invalid event on line {line}: {source}")]
    Parse {
        /// One-based line number
        line: usize,
        /// Decoder error
        #[source]
        source: serde_json::Error,
    },
}

/// Iterator over events in a JSON-lines reader.
pub struct EventFeed<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> EventFeed<R> {
    /// Wrap a buffered reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Read every remaining event, stopping at the first error.
    pub fn read_all(self) -> Result<Vec<EventEnvelope>, FeedError> {
        self.collect()
    }
}

impl<R: BufRead> Iterator for EventFeed<R> {
    type Item = Result<EventEnvelope, FeedError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    let trimmed = self.buf.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let line = self.line;
                    return Some(serde_json::from_str(trimmed).map_err(|source| {
                        warn!(line, error = %source, "malformed feed line");
                        FeedError::Parse { line, source }
                    }));
                }
                Err(err) => return Some(Err(err.into())),
            }
        }
    }
}

/// Render events as JSON lines.
pub fn to_json_lines(events: &[EventEnvelope]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for event in events {
        out.push_str(&serde_json::to_string(event)?);
        out.push('\n');
    }
    Ok(out)
}
