//! JSON-lines reader for ingest events.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use contracts::IngestEvent;

use crate::error::{IngestionError, Result};

/// Streams [`IngestEvent`]s, one JSON object per line.
///
/// Blank lines and lines starting with `#` are skipped. Line numbers in
/// errors start at 1.
#[derive(Debug)]
pub struct RecordReader<R> {
    inner: R,
    line: usize,
    buf: String,
    source: Option<PathBuf>,
}

impl RecordReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| IngestionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = Self::new(BufReader::new(file));
        reader.source = Some(path.to_path_buf());
        Ok(reader)
    }
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: 0,
            buf: String::new(),
            source: None,
        }
    }

    /// Line number of the last line read.
    pub fn line(&self) -> usize {
        self.line
    }

    fn read_error(&self, source: std::io::Error) -> IngestionError {
        match &self.source {
            Some(path) => IngestionError::Read {
                path: path.clone(),
                source,
            },
            None => IngestionError::Io {
                line: self.line + 1,
                source,
            },
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<IngestEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.inner.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => self.line += 1,
                Err(e) => return Some(Err(self.read_error(e))),
            }
            let text = self.buf.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            return Some(serde_json::from_str(text).map_err(|e| IngestionError::ParseFailed {
                line: self.line,
                message: e.to_string(),
            }));
        }
    }
}
