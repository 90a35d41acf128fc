//! Append-only, newline-delimited JSON log of snapshots.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use super::snapshot::MetricSnapshot;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct MetricLog {
    path: PathBuf,
}

impl MetricLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one snapshot as a single line.
    pub fn append(&self, snapshot: &MetricSnapshot) -> Result<()> {
        let mut line = serde_json::to_vec(snapshot)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // One write per record so a concurrent reader sees whole lines or a
        // trailing fragment, never an interleaving.
        file.write_all(&line)?;
        file.flush()?;

        log::debug!("Metrics saved to {}", self.path.display());
        Ok(())
    }

    /// Stream the records currently in the log.
    ///
    /// A missing log is an empty stream.
    pub fn records(&self) -> Result<LogRecords> {
        let reader = match File::open(&self.path) {
            Ok(file) => Some(BufReader::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(LogRecords {
            reader,
            buf: Vec::new(),
            line_no: 0,
            skipped: 0,
        })
    }
}

/// Lazy iterator over the decodable records of a [`MetricLog`].
///
/// Lines that fail to decode are skipped with a warning. A final line
/// without a terminating newline is still being written and is ignored.
pub struct LogRecords {
    reader: Option<BufReader<File>>,
    buf: Vec<u8>,
    line_no: usize,
    skipped: usize,
}

impl LogRecords {
    /// Lines skipped so far because they did not decode.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for LogRecords {
    type Item = MetricSnapshot;

    fn next(&mut self) -> Option<MetricSnapshot> {
        loop {
            let reader = self.reader.as_mut()?;
            self.buf.clear();

            match reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.reader = None;
                    return None;
                }
                Ok(_) if self.buf.last() != Some(&b'\n') => {
                    log::debug!("Ignoring partial trailing line in metrics log");
                    self.reader = None;
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Stopped reading metrics log: {}", e);
                    self.reader = None;
                    return None;
                }
            }

            self.line_no += 1;
            let line = self.buf.trim_ascii();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_slice::<MetricSnapshot>(line) {
                Ok(snapshot) => return Some(snapshot),
                Err(e) => {
                    log::warn!("JSON parse error on line {}: {}", self.line_no, e);
                    self.skipped += 1;
                }
            }
        }
    }
}
