//! The per-parse dispatch state machine.

use std::collections::BTreeSet;
use std::io::{Read, Seek};

use log::{debug, info};

use super::catalog::RoutingTable;
use crate::op2::cursor::ByteCursor;
use crate::op2::decoder::DecoderRegistry;
use crate::op2::format::framing::RecordFramer;
use crate::op2::format::table_name::{read_table_name, TableNameOrEnd};
use crate::op2::format::{header, matrix, special, tables};
use crate::op2::reader::ReaderOptions;
use crate::op2::trace::DebugSink;
use crate::op2::types::error::{Op2Error, ParseError, Result};
use crate::op2::types::models::{
    Endian, FileHeader, TableEvent, TableKind, TableName, TableOutput,
};

/// Where a session stands between two tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Probing for the next table name.
    AwaitingTableName,
    /// A table name has been seen and its handler is next.
    Dispatching(TableName),
    /// The end-of-stream marker has been consumed.
    Done,
    /// A handler or probe failed; the stream position is no longer trusted.
    Failed,
}

/// Table names in the order they were encountered. Only ever appended to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditTrail(Vec<TableName>);

impl AuditTrail {
    fn push(&mut self, name: TableName) {
        self.0.push(name);
    }

    pub fn as_slice(&self) -> &[TableName] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TableName> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<TableName> {
        self.0
    }
}

/// One parse of one byte source.
///
/// The session exclusively owns the byte source and the debug sink for its
/// lifetime. It moves `AwaitingTableName -> Dispatching -> AwaitingTableName`
/// once per table and ends in `Done` or `Failed`; the sink is closed on
/// either terminal transition.
pub struct DispatchSession<R> {
    framer: RecordFramer<R>,
    routes: RoutingTable,
    additional_matrices: BTreeSet<String>,
    header: Option<FileHeader>,
    audit: AuditTrail,
    state: SessionState,
}

impl<R: Read + Seek> DispatchSession<R> {
    /// Opens the source at its current position, reads the file header and
    /// probes for the first table.
    pub fn begin(source: R, options: &ReaderOptions) -> std::result::Result<Self, ParseError> {
        let trace = DebugSink::open(options.debug_trace.as_ref());
        let cursor = ByteCursor::open(source, options.endian).map_err(|source| ParseError {
            table: None,
            offset: source.offset().unwrap_or(0),
            recent_markers: Vec::new(),
            source,
        })?;
        let mut framer = RecordFramer::new(cursor, trace);
        let routes = match RoutingTable::standard() {
            Ok(routes) => routes,
            Err(source) => {
                framer.close_trace();
                return Err(ParseError {
                    table: None,
                    offset: framer.tell(),
                    recent_markers: Vec::new(),
                    source,
                });
            }
        };

        let mut session = DispatchSession {
            framer,
            routes,
            additional_matrices: options.additional_matrices.clone(),
            header: None,
            audit: AuditTrail::default(),
            state: SessionState::AwaitingTableName,
        };
        if let Err(e) = session.start(options.strict_header) {
            return Err(session.fail(None, e));
        }
        Ok(session)
    }

    fn start(&mut self, strict_header: bool) -> Result<()> {
        info!(
            "Starting OP2 parse at offset {} ({})",
            self.framer.tell(),
            self.framer.endian()
        );
        self.header = header::parse(&mut self.framer)?;

        if strict_header && self.framer.peek_marker()? == 0 {
            return Err(Op2Error::FatalStream {
                offset: self.framer.tell(),
                reason: "no tables exist".to_string(),
            });
        }
        self.probe()
    }

    /// Looks for the next table name without consuming it.
    fn probe(&mut self) -> Result<()> {
        self.state = SessionState::AwaitingTableName;
        match read_table_name(&mut self.framer, true, false)? {
            TableNameOrEnd::Table(name) => {
                self.state = SessionState::Dispatching(name);
            }
            TableNameOrEnd::EndOfStream => {
                info!(
                    "Reached end of stream at {} after {} table(s)",
                    self.framer.tell(),
                    self.audit.len()
                );
                self.state = SessionState::Done;
                self.framer.close_trace();
            }
        }
        Ok(())
    }

    /// Handles the next table.
    ///
    /// Returns `Ok(None)` once the session is `Done`. After an error the
    /// session is `Failed` and every later call returns `Ok(None)`.
    pub fn dispatch_next<O>(
        &mut self,
        decoders: &mut DecoderRegistry<O>,
    ) -> std::result::Result<Option<TableEvent<O>>, ParseError> {
        let name = match &self.state {
            SessionState::Dispatching(name) => name.clone(),
            _ => return Ok(None),
        };

        let offset = self.framer.tell();
        self.audit.push(name.clone());
        let kind = self.routes.classify(&name, &self.additional_matrices);
        self.framer
            .trace()
            .line(format_args!("{}\ntable_name = {}; offset={}", "-".repeat(80), name, offset));
        info!("Table {} at offset {}: {}", name, offset, kind);

        let output = match self.run_handler(&name, kind, decoders) {
            Ok(output) => output,
            Err(e) => return Err(self.fail(Some(name), e)),
        };
        if let Err(e) = self.probe() {
            return Err(self.fail(Some(name), e));
        }
        debug!("Table {} done, next offset {}", name, self.framer.tell());

        Ok(Some(TableEvent {
            name,
            kind,
            offset,
            output,
        }))
    }

    fn run_handler<O>(
        &mut self,
        name: &TableName,
        kind: TableKind,
        decoders: &mut DecoderRegistry<O>,
    ) -> Result<TableOutput<O>> {
        let framer = &mut self.framer;
        match kind {
            TableKind::GeometryPasser => {
                tables::skip_generic_table(framer)?;
                Ok(TableOutput::Skipped)
            }
            TableKind::SpecialCase(special) => {
                special::read_special_table(framer, special)?;
                Ok(TableOutput::Skipped)
            }
            TableKind::ResultDecoder(family) => {
                match tables::read_results_table(framer, family, decoders)? {
                    Some(output) => Ok(TableOutput::Decoded(output)),
                    None => Ok(TableOutput::Skipped),
                }
            }
            TableKind::AdditionalMatrix => Ok(TableOutput::Matrix(matrix::read_matrix(framer)?)),
            TableKind::Unknown => Err(Op2Error::UnrecognizedTable { name: name.clone() }),
        }
    }

    /// Moves to `Failed`, closes the sink and attaches diagnostic context.
    fn fail(&mut self, table: Option<TableName>, source: Op2Error) -> ParseError {
        self.state = SessionState::Failed;
        let offset = source.offset().unwrap_or_else(|| self.framer.tell());
        self.framer
            .trace()
            .line(format_args!("FAILED at {}: {}", offset, source));
        self.framer.close_trace();
        ParseError {
            table,
            offset,
            recent_markers: self.framer.recent_markers(),
            source,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn audit_trail(&self) -> &AuditTrail {
        &self.audit
    }

    pub fn header(&self) -> Option<&FileHeader> {
        self.header.as_ref()
    }

    pub fn endian(&self) -> Endian {
        self.framer.endian()
    }

    /// Current absolute stream offset.
    pub fn tell(&self) -> u64 {
        self.framer.tell()
    }

    /// Consumes the session, returning its header and audit trail.
    pub fn into_parts(self) -> (Option<FileHeader>, AuditTrail) {
        (self.header, self.audit)
    }

    /// Consumes the session, handing back the byte source positioned at
    /// [`tell`](Self::tell). The debug sink is closed first.
    pub fn into_source(self) -> R {
        self.framer.into_inner()
    }
}
