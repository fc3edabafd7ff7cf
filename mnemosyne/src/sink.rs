//! Output destinations for encoded records.
//!
//! Each record is written with a single `write_all` while the sink's lock is
//! held, so records from concurrent threads never interleave.

use crate::Result;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A writer that can also push buffered output to durable storage
pub trait WriteSyncer: Write + Send {
    fn sync(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl WriteSyncer for io::Stdout {}

impl WriteSyncer for io::Stderr {}

impl WriteSyncer for File {
    fn sync(&mut self) -> io::Result<()> {
        self.flush()?;
        self.sync_all()
    }
}

/// Shared, lock-serialized handle to a [`WriteSyncer`]
#[derive(Clone)]
pub struct Sink {
    name: &'static str,
    inner: Arc<Mutex<Box<dyn WriteSyncer>>>,
}

impl Sink {
    pub fn new(name: &'static str, writer: impl WriteSyncer + 'static) -> Self {
        Self {
            name,
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new("stdout", io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new("stderr", io::stderr())
    }

    pub fn file(file: File) -> Self {
        Self::new("file", file)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn WriteSyncer>> {
        // Keep writing after a panic in another writer.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write one complete record
    pub fn write_record(&self, record: &[u8]) -> Result<()> {
        self.lock().write_all(record)?;
        Ok(())
    }

    /// Flush buffered output to the destination
    pub fn sync(&self) -> Result<()> {
        self.lock().sync()?;
        Ok(())
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink").field("name", &self.name).finish()
    }
}

/// In-memory sink that keeps everything written to it.
///
/// Clones share the same buffer, so one clone can be handed to a facade
/// while another inspects the output.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A [`Sink`] writing into this buffer
    pub fn sink(&self) -> Sink {
        Sink::new("memory", self.clone())
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    pub fn clear(&self) {
        self.buffer().clear();
    }
}

impl Write for MemorySink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buffer().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WriteSyncer for MemorySink {}
