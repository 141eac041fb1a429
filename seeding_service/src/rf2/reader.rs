// seeding_service/src/rf2/reader.rs
//! Streaming RF2 reader: one typed record per non-empty data line.

use std::marker::PhantomData;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::errors::SeedError;
use crate::rf2::records::Rf2Record;

const READ_BUFFER_CAPACITY: usize = 64 * 1024;

/// Buffered line-at-a-time reader over one RF2 file. The header line is
/// consumed on open; malformed and empty lines are dropped without being
/// yielded, so memory use stays constant regardless of file size.
pub struct Rf2Reader<T: Rf2Record> {
    reader: BufReader<File>,
    buffer: String,
    shutdown: Option<Arc<AtomicBool>>,
    _record: PhantomData<T>,
}

impl<T: Rf2Record> Rf2Reader<T> {
    pub async fn open(path: &Path) -> Result<Self, SeedError> {
        let file = File::open(path).await?;
        let mut reader = BufReader::with_capacity(READ_BUFFER_CAPACITY, file);

        // header row
        let mut header = String::new();
        reader.read_line(&mut header).await?;

        Ok(Self {
            reader,
            buffer: String::new(),
            shutdown: None,
            _record: PhantomData,
        })
    }

    /// Attach a cancellation flag checked between lines.
    pub fn with_shutdown(mut self, shutdown: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// The next well-formed record, or `None` at end of file.
    pub async fn next_record(&mut self) -> Result<Option<T>, SeedError> {
        loop {
            if let Some(shutdown) = &self.shutdown {
                if shutdown.load(Ordering::Relaxed) {
                    return Err(SeedError::Cancelled);
                }
            }

            self.buffer.clear();
            let bytes = self.reader.read_line(&mut self.buffer).await?;
            if bytes == 0 {
                return Ok(None);
            }

            // strip the line terminator only; trailing column whitespace is data
            let line = self.buffer.strip_suffix('\n').unwrap_or(&self.buffer);
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                continue;
            }

            if let Some(record) = T::parse_line(line) {
                return Ok(Some(record));
            }
        }
    }
}
