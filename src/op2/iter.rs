//! Table-by-table iteration.
//!
//! [`TableScan`] drives a [`DispatchSession`] one table per step, so callers
//! can act on each table as it is read instead of collecting a whole
//! [`ParseOutcome`](super::types::models::ParseOutcome).
//!
//! # Example
//! ```no_run
//! # use std::fs::File;
//! # use op2_reader::{Op2Reader, ReaderOptions};
//! let mut reader: Op2Reader = Op2Reader::new(ReaderOptions::default());
//! for event in reader.tables(File::open("model.op2").unwrap()).unwrap() {
//!     let event = event.unwrap();
//!     println!("{} at {}: {}", event.name, event.offset, event.kind);
//! }
//! ```

use std::io::{Read, Seek};

use super::decoder::DecoderRegistry;
use super::dispatch::DispatchSession;
use super::types::error::ParseError;
use super::types::models::TableEvent;

/// Yields one [`TableEvent`] per table, then `None` once the end marker has
/// been read. An error is yielded once and ends the scan.
///
/// Created by [`Op2Reader::tables()`](crate::Op2Reader::tables).
pub struct TableScan<'a, R, O> {
    session: DispatchSession<R>,
    decoders: &'a mut DecoderRegistry<O>,
    finished: bool,
}

impl<'a, R: Read + Seek, O> TableScan<'a, R, O> {
    pub(super) fn new(session: DispatchSession<R>, decoders: &'a mut DecoderRegistry<O>) -> Self {
        TableScan {
            session,
            decoders,
            finished: false,
        }
    }

    /// The underlying session, for its header and audit trail.
    pub fn session(&self) -> &DispatchSession<R> {
        &self.session
    }
}

impl<R: Read + Seek, O> Iterator for TableScan<'_, R, O> {
    type Item = Result<TableEvent<O>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.session.dispatch_next(self.decoders) {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
