//! Optional human-readable trace of every framing and dispatch decision.
//!
//! The sink is diagnostic only. A failed write is logged once and the sink
//! goes quiet; it never turns into a parse error.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::warn;

/// Where a session should send its trace.
#[derive(Debug, Clone)]
pub enum TraceTarget {
    /// A file, truncated when the session opens it.
    File(PathBuf),
    /// An in-memory buffer shared with the caller.
    Buffer(SharedBuffer),
    /// Any writer supplied by the caller.
    Writer(SharedWriter),
}

/// A cloneable in-memory writer, for capturing traces without touching disk.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, decoded lossily.
    pub fn contents(&self) -> String {
        match self.0.lock() {
            Ok(buf) => String::from_utf8_lossy(&buf).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self
            .0
            .lock()
            .map_err(|_| io::Error::other("trace buffer lock poisoned"))?;
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A caller-supplied writer behind a lock, so options stay cloneable.
#[derive(Clone)]
pub struct SharedWriter(Arc<Mutex<Box<dyn Write + Send>>>);

impl SharedWriter {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        SharedWriter(Arc::new(Mutex::new(Box::new(writer))))
    }
}

impl Write for SharedWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("trace writer lock poisoned"))?
            .write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("trace writer lock poisoned"))?
            .flush()
    }
}

impl fmt::Debug for SharedWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedWriter")
    }
}

/// Write-only trace sink owned by one session.
pub struct DebugSink {
    out: Option<Box<dyn Write>>,
}

impl DebugSink {
    /// A sink that discards everything.
    pub fn null() -> Self {
        DebugSink { out: None }
    }

    /// Opens the configured target. A file that cannot be created disables
    /// tracing with a warning rather than failing the parse.
    pub fn open(target: Option<&TraceTarget>) -> Self {
        let out: Option<Box<dyn Write>> = match target {
            None => None,
            Some(TraceTarget::File(path)) => match File::create(path) {
                Ok(file) => Some(Box::new(BufWriter::new(file))),
                Err(e) => {
                    warn!("Debug trace disabled: cannot create {}: {}", path.display(), e);
                    None
                }
            },
            Some(TraceTarget::Buffer(buf)) => Some(Box::new(buf.clone())),
            Some(TraceTarget::Writer(writer)) => Some(Box::new(writer.clone())),
        };
        DebugSink { out }
    }

    pub fn is_enabled(&self) -> bool {
        self.out.is_some()
    }

    /// Appends one line. Formatting only happens when the sink is enabled.
    pub fn line(&mut self, args: fmt::Arguments<'_>) {
        if let Some(out) = self.out.as_mut() {
            if let Err(e) = writeln!(out, "{}", args) {
                warn!("Debug trace write failed, disabling trace: {}", e);
                self.out = None;
            }
        }
    }

    /// Flushes and releases the target. Later writes are discarded.
    pub fn close(&mut self) {
        if let Some(mut out) = self.out.take() {
            if let Err(e) = out.flush() {
                warn!("Debug trace flush failed: {}", e);
            }
        }
    }
}

impl Drop for DebugSink {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for DebugSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugSink")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
