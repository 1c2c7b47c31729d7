use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use log::info;

use super::decoder::{DecoderRegistry, TableDecoder};
use super::dispatch::DispatchSession;
use super::iter::TableScan;
use super::trace::TraceTarget;
use super::types::error::{Op2Error, ParseError};
use super::types::models::*;

/// Per-parse configuration.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Names, trimmed and upper-cased, of tables to read as matrices.
    pub additional_matrices: BTreeSet<String>,
    /// Where to mirror every framing decision, if anywhere.
    pub debug_trace: Option<TraceTarget>,
    /// Treat a file header followed directly by the end marker as an error.
    pub strict_header: bool,
    /// Byte order; `None` detects it from the first marker.
    pub endian: Option<Endian>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            additional_matrices: BTreeSet::new(),
            debug_trace: None,
            strict_header: true,
            endian: None,
        }
    }
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds table names to read with the matrix reader.
    pub fn with_additional_matrices<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.additional_matrices.extend(
            names
                .into_iter()
                .map(|name| TableName::new(name.as_ref()).as_str().to_string())
                .filter(|name| !name.is_empty()),
        );
        self
    }

    pub fn with_debug_sink(mut self, target: TraceTarget) -> Self {
        self.debug_trace = Some(target);
        self
    }

    /// Shorthand for a file debug sink.
    pub fn with_debug_file(self, path: impl Into<PathBuf>) -> Self {
        self.with_debug_sink(TraceTarget::File(path.into()))
    }

    pub fn with_strict_header(mut self, strict: bool) -> Self {
        self.strict_header = strict;
        self
    }

    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = Some(endian);
        self
    }
}

/// The main reader for OP2 files.
///
/// A reader holds configuration and result decoders; every parse call opens
/// a fresh session, so one reader can parse any number of sources.
///
/// `O` is the domain object produced by the registered decoders.
pub struct Op2Reader<O = ()> {
    options: ReaderOptions,
    decoders: DecoderRegistry<O>,
}

impl<O> Op2Reader<O> {
    pub fn new(options: ReaderOptions) -> Self {
        Op2Reader {
            options,
            decoders: DecoderRegistry::new(),
        }
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Registers the decoder for one result family, replacing any previous one.
    pub fn register_decoder<D>(&mut self, family: ResultFamily, decoder: D) -> &mut Self
    where
        D: TableDecoder<Output = O> + 'static,
    {
        self.decoders.register(family, decoder);
        self
    }

    /// Parses the file at `path` from its first byte.
    ///
    /// # Errors
    /// Returns a [`ParseError`] if the file cannot be opened, if any framing
    /// check fails, or if a table name matches no catalog and no additional
    /// matrix.
    pub fn read_path(&mut self, path: impl AsRef<Path>) -> Result<ParseOutcome<O>, ParseError> {
        let path = path.as_ref();
        info!("Opening OP2 file: {}", path.display());
        let file = File::open(path).map_err(|e| ParseError {
            table: None,
            offset: 0,
            recent_markers: Vec::new(),
            source: Op2Error::Io(e),
        })?;
        self.read_from(BufReader::new(file))
    }

    /// Parses a seekable source from its current position to the
    /// end-of-stream marker. Nothing past that marker is read.
    pub fn read_from<R: Read + Seek>(&mut self, source: R) -> Result<ParseOutcome<O>, ParseError> {
        let mut session = DispatchSession::begin(source, &self.options)?;
        let mut decoded = Vec::new();
        let mut matrices = Vec::new();

        while let Some(event) = session.dispatch_next(&mut self.decoders)? {
            match event.output {
                TableOutput::Decoded(output) => decoded.push((event.name, output)),
                TableOutput::Matrix(matrix) => matrices.push(matrix),
                TableOutput::Skipped => {}
            }
        }

        let endian = session.endian();
        let end_offset = session.tell();
        let (header, audit) = session.into_parts();
        info!(
            "Parsed {} table(s): {} decoded, {} matri{}",
            audit.len(),
            decoded.len(),
            matrices.len(),
            if matrices.len() == 1 { "x" } else { "ces" }
        );

        Ok(ParseOutcome {
            endian,
            header,
            tables: audit.into_vec(),
            decoded,
            matrices,
            end_offset,
        })
    }

    /// Returns an iterator that handles one table per step.
    pub fn tables<R: Read + Seek>(&mut self, source: R) -> Result<TableScan<'_, R, O>, ParseError> {
        let session = DispatchSession::begin(source, &self.options)?;
        Ok(TableScan::new(session, &mut self.decoders))
    }
}

impl<O> Default for Op2Reader<O> {
    fn default() -> Self {
        Self::new(ReaderOptions::default())
    }
}
