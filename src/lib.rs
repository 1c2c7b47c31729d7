//! # op2-reader
//!
//! A reader for Nastran OP2 result files: Fortran unformatted sequential
//! binary containers holding a sequence of named tables.
//!
//! The crate frames every table, skips geometry, hands result tables to
//! caller-registered decoders and reads requested matrices. It never
//! interprets result payloads itself.
pub mod op2;

// Re-export the main types for convenience
pub use op2::{
    decoder::{DecoderContext, DecoderRegistry, TableDecoder},
    iter::TableScan,
    models::{
        Endian, FileHeader, Matrix, MatrixColumn, MatrixHeader, MatrixString, MatrixValues,
        ParseOutcome, ResultFamily, SpecialTable, TableDate, TableEvent, TableHeader, TableKind,
        TableName, TableOutput,
    },
    trace::{SharedBuffer, SharedWriter, TraceTarget},
    Op2Error, Op2Reader, ParseError, ReaderOptions,
};
