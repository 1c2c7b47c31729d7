//! Core data structures for OP2 stream components.
//!
//! This module defines the fundamental types used throughout the library:
//! - Byte order and framing markers
//! - Table identity and routing categories
//! - File, table and matrix headers
//! - Per-table events and the final parse outcome

use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use encoding_rs::WINDOWS_1252;

/// Byte order of every integer and float in the stream.
///
/// Fixed once when a session opens the stream; never changes per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Reads a signed 32-bit integer from the first four bytes of `buf`.
    pub fn read_i32(self, buf: &[u8]) -> i32 {
        match self {
            Endian::Little => LittleEndian::read_i32(buf),
            Endian::Big => BigEndian::read_i32(buf),
        }
    }

    pub fn read_f32(self, buf: &[u8]) -> f32 {
        match self {
            Endian::Little => LittleEndian::read_f32(buf),
            Endian::Big => BigEndian::read_f32(buf),
        }
    }

    pub fn read_f64(self, buf: &[u8]) -> f64 {
        match self {
            Endian::Little => LittleEndian::read_f64(buf),
            Endian::Big => BigEndian::read_f64(buf),
        }
    }

    /// Detects the byte order from the first word of a stream, which is always
    /// the length (4) of the first marker block.
    pub fn detect(first_word: [u8; 4]) -> Option<Endian> {
        if LittleEndian::read_i32(&first_word) == 4 {
            Some(Endian::Little)
        } else if BigEndian::read_i32(&first_word) == 4 {
            Some(Endian::Big)
        } else {
            None
        }
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Endian::Little => write!(f, "little-endian"),
            Endian::Big => write!(f, "big-endian"),
        }
    }
}

/// One `(4, n, 4)` framing triple and where it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub offset: u64,
    pub value: i32,
}

/// The identity of a table: its 8-byte name with padding trimmed and
/// letters upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableName(String);

impl TableName {
    /// Normalizes a name given as text.
    pub fn new(name: &str) -> Self {
        TableName(name.trim_end_matches([' ', '\0']).trim_start().to_ascii_uppercase())
    }

    /// Decodes the raw 8-byte name field of a table-name record.
    pub fn from_bytes(raw: &[u8]) -> Self {
        let (text, _, _) = WINDOWS_1252.decode(raw);
        Self::new(&text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Result-table families. Each family is decoded by one external decoder;
/// [`ResultFamily::Passer`] tables are framed and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResultFamily {
    /// Element forces.
    Oef,
    /// SPC/MPC constraint forces.
    Oqg,
    /// Applied loads.
    Opg,
    /// Grid point forces.
    Ogpf,
    /// Strain energy.
    Onr,
    /// Element stresses and strains.
    Oes,
    /// Displacements, velocities, accelerations, eigenvectors, temperatures.
    Oug,
    /// Grid point weight.
    Ogpwg,
    /// Grid point stresses.
    Ogs,
    RealEigenvalues,
    BucklingEigenvalues,
    ComplexEigenvalues,
    /// Known result tables with no decoder.
    Passer,
}

/// Tables that do not follow the generic descending-subtable layout and
/// carry a hand-coded marker sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialTable {
    /// Direct input tables (TABLED1, TABLEM1, ...).
    Dit,
    Gpl,
    /// Modal effective mass summary.
    Meff,
    Intmod,
    /// Date-stamped subtable header.
    Omm2,
    Fol,
    /// Science data file tables (`SDF`, `PMRF`).
    Sdf,
    /// Element stiffness table with block-cadence subtables.
    Kelm,
    Pcompts,
}

impl fmt::Display for SpecialTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SpecialTable::Dit => "DIT",
            SpecialTable::Gpl => "GPL",
            SpecialTable::Meff => "MEFF",
            SpecialTable::Intmod => "INTMOD",
            SpecialTable::Omm2 => "OMM2",
            SpecialTable::Fol => "FOL",
            SpecialTable::Sdf => "SDF",
            SpecialTable::Kelm => "KELM",
            SpecialTable::Pcompts => "PCOMPTS",
        };
        write!(f, "{}", name)
    }
}

/// How a table is handled, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    GeometryPasser,
    ResultDecoder(ResultFamily),
    SpecialCase(SpecialTable),
    AdditionalMatrix,
    Unknown,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TableKind::GeometryPasser => write!(f, "geometry"),
            TableKind::ResultDecoder(family) => write!(f, "result ({:?})", family),
            TableKind::SpecialCase(special) => write!(f, "special ({})", special),
            TableKind::AdditionalMatrix => write!(f, "matrix"),
            TableKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// A calendar date stamped into a file or subtable header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDate {
    pub month: i32,
    pub day: i32,
    /// Four-digit year; two-digit years on disk are mapped to 2000 + year.
    pub year: i32,
}

impl TableDate {
    pub fn from_raw(month: i32, day: i32, year: i32) -> Self {
        let year = if (0..100).contains(&year) { 2000 + year } else { year };
        TableDate { month, day, year }
    }
}

impl fmt::Display for TableDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}/{:02}/{:04}", self.month, self.day, self.year)
    }
}

/// The optional header that precedes the first table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub date: TableDate,
    /// Normally `"NASTRAN FORT TAPE ID CODE -"`.
    pub tape_code: String,
    pub label: String,
}

/// The `-1` and `-2` records shared by result tables, as handed to decoders.
#[derive(Debug, Clone, PartialEq)]
pub struct TableHeader {
    pub table_name: TableName,
    /// Raw `-1` record.
    pub ident_record: Vec<u8>,
    pub subtable_name: String,
    /// Present when the `-2` record is the 28-byte dated form.
    pub date: Option<TableDate>,
    /// First flag word of the dated form (0 when absent).
    pub approach_flag: i32,
}

/// The 7-word first record of a matrix table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixHeader {
    /// Matrix counter (101, 102, ...).
    pub matrix_num: i32,
    pub form: i32,
    pub rows: i32,
    pub cols: i32,
    /// Output precision: 1 real f32, 2 real f64, 3 complex f32, 4 complex f64.
    pub precision: i32,
    pub nvalues: i32,
    pub group: i32,
}

impl fmt::Display for MatrixHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "matrix_num={} form={} rows={} cols={} precision={} nvalues={} group={}",
            self.matrix_num, self.form, self.rows, self.cols, self.precision, self.nvalues, self.group
        )
    }
}

/// Values of one matrix string, widened to f64.
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixValues {
    Real(Vec<f64>),
    Complex(Vec<(f64, f64)>),
}

impl MatrixValues {
    pub fn len(&self) -> usize {
        match self {
            MatrixValues::Real(values) => values.len(),
            MatrixValues::Complex(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A run of consecutive non-zero values in one column, starting at `row`.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixString {
    pub row: i32,
    pub values: MatrixValues,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixColumn {
    /// One-based column number.
    pub column: u32,
    pub strings: Vec<MatrixString>,
}

/// A named matrix read from an additional-matrix table.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub name: TableName,
    pub header: MatrixHeader,
    pub columns: Vec<MatrixColumn>,
}

/// What a handled table produced.
#[derive(Debug)]
pub enum TableOutput<O> {
    /// The table was framed and its payload discarded.
    Skipped,
    /// An external decoder produced a domain object.
    Decoded(O),
    Matrix(Matrix),
}

/// One table handled by the dispatcher.
#[derive(Debug)]
pub struct TableEvent<O> {
    pub name: TableName,
    pub kind: TableKind,
    /// Offset of the table-name record.
    pub offset: u64,
    pub output: TableOutput<O>,
}

/// Everything a successful parse produced.
#[derive(Debug)]
pub struct ParseOutcome<O> {
    pub endian: Endian,
    pub header: Option<FileHeader>,
    /// Every table name encountered, in stream order.
    pub tables: Vec<TableName>,
    pub decoded: Vec<(TableName, O)>,
    pub matrices: Vec<Matrix>,
    /// Offset just past the end-of-stream marker.
    pub end_offset: u64,
}
