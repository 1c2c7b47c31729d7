//! Matrix tables.
//!
//! # Table Structure
//! ```text
//! record               matrix name
//! [-1]       record    matrix_num, form, rows, cols, precision, nvalues, group
//! [-2, 1, 0] record    name (8 bytes), 170, 170
//! [-3, 1, 1] [n] block(row, values...) [n] block ...   column 1
//! [-4, 1, 1] ...                                       column 2
//! [-k, 1, 0, 0]                                        end of matrix
//! ```
//! Value strings inside a column may use any positive marker cadence; the
//! column ends at the next negative marker.

use std::io::{Read, Seek};

use log::{debug, info, warn};

use super::framing::RecordFramer;
use super::table_name::{expect_table_name, TABLE_NAME_BYTES};
use crate::op2::types::error::{Op2Error, Result};
use crate::op2::types::models::{
    Endian, Matrix, MatrixColumn, MatrixHeader, MatrixString, MatrixValues, TableName,
};
use crate::op2::utils;

/// Sentinel words that follow the name in a matrix's second header record.
const MATRIX_SENTINEL: i32 = 170;

/// A matrix shape the reader knows how to interpret.
struct MatrixLayout {
    matrix_nums: &'static [i32],
    form: i32,
    rows: i32,
    cols: i32,
    precision: i32,
    nvalues: i32,
    group: i32,
}

const KNOWN_LAYOUTS: &[MatrixLayout] = &[
    MatrixLayout { matrix_nums: &[101, 102], form: 2, rows: 4, cols: 2, precision: 1, nvalues: 3, group: 6250 },
    MatrixLayout { matrix_nums: &[103, 104], form: 2, rows: 2, cols: 1, precision: 2, nvalues: 4, group: 10000 },
    MatrixLayout { matrix_nums: &[105], form: 1, rows: 36, cols: 2, precision: 1, nvalues: 36, group: 10000 },
];

/// Reads a whole matrix table, leaving the cursor on the next table name.
pub fn read_matrix<R: Read + Seek>(framer: &mut RecordFramer<R>) -> Result<Matrix> {
    let name = expect_table_name(framer)?;
    info!("Reading matrix {}", name);
    let endian = framer.endian();

    framer.read_markers(&[-1])?;
    let record = framer.read_record()?;
    let header = parse_matrix_header(&name, &record, endian)?;
    validate_matrix_header(&name, &header)?;
    framer.trace().line(format_args!("  matrix {}: {}", name, header));

    framer.read_markers(&[-2, 1, 0])?;
    let record = framer.read_record()?;
    expect_sentinel_record(&name, &record, endian)?;

    let mut columns = Vec::new();
    let mut index = -3;
    loop {
        framer.read_markers(&[index, 1])?;
        let present = framer.read_marker()?;
        if present.value == 0 {
            let remaining = framer.read_marker()?;
            if remaining.value != 0 {
                return Err(Op2Error::MarkerMismatch {
                    offset: remaining.offset,
                    expected: 0,
                    actual: remaining.value,
                });
            }
            break;
        }

        let column = (-(index + 2)) as u32;
        let mut strings = Vec::new();
        while framer.peek_marker()? > 0 {
            framer.read_marker()?;
            let block = framer.read_block()?;
            strings.push(decode_string(&block, header.precision, endian)?);
        }
        debug!("Matrix {} column {}: {} string(s)", name, column, strings.len());
        framer
            .trace()
            .line(format_args!("  column {} at index {}: {} string(s)", column, index, strings.len()));
        columns.push(MatrixColumn { column, strings });
        index -= 1;
    }

    if columns.len() > header.cols as usize {
        warn!(
            "Matrix {} declares {} columns but {} were read",
            name,
            header.cols,
            columns.len()
        );
    }

    Ok(Matrix {
        name,
        header,
        columns,
    })
}

/// Parses the 7-word first record of a matrix.
pub fn parse_matrix_header(name: &TableName, record: &[u8], endian: Endian) -> Result<MatrixHeader> {
    let words = utils::read_words(record, endian)?;
    if words.len() != 7 {
        return Err(Op2Error::InvalidFormat(format!(
            "Matrix {} header has {} words, expected 7",
            name,
            words.len()
        )));
    }
    Ok(MatrixHeader {
        matrix_num: words[0],
        form: words[1],
        rows: words[2],
        cols: words[3],
        precision: words[4],
        nvalues: words[5],
        group: words[6],
    })
}

/// Cross-checks a header against the known layout for its matrix number.
///
/// A wrong row or column count would silently produce garbage downstream,
/// so any disagreement is fatal.
pub fn validate_matrix_header(name: &TableName, header: &MatrixHeader) -> Result<()> {
    let inconsistent = |reason: String| Op2Error::MatrixHeaderInconsistent {
        name: name.clone(),
        header: *header,
        reason,
    };

    let layout = KNOWN_LAYOUTS
        .iter()
        .find(|layout| layout.matrix_nums.contains(&header.matrix_num))
        .ok_or_else(|| inconsistent(format!("unrecognized matrix number {}", header.matrix_num)))?;

    let checks = [
        ("form", header.form, layout.form),
        ("rows", header.rows, layout.rows),
        ("cols", header.cols, layout.cols),
        ("precision", header.precision, layout.precision),
        ("nvalues", header.nvalues, layout.nvalues),
        ("group", header.group, layout.group),
    ];
    for (field, actual, expected) in checks {
        if actual != expected {
            return Err(inconsistent(format!(
                "{} is {}, matrix {} requires {}",
                field, actual, header.matrix_num, expected
            )));
        }
    }
    Ok(())
}

/// Checks a 16-byte `name, 170, 170` record, shared by matrices and the
/// element-matrix tables.
pub(crate) fn expect_sentinel_record(name: &TableName, record: &[u8], endian: Endian) -> Result<()> {
    if record.len() != TABLE_NAME_BYTES + 8 {
        return Err(Op2Error::InvalidFormat(format!(
            "{} name record is {} bytes, expected {}",
            name,
            record.len(),
            TABLE_NAME_BYTES + 8
        )));
    }
    let a = endian.read_i32(&record[8..12]);
    let b = endian.read_i32(&record[12..16]);
    if a != MATRIX_SENTINEL || b != MATRIX_SENTINEL {
        return Err(Op2Error::InvalidFormat(format!(
            "{} name record carries ({}, {}), expected ({}, {})",
            name, a, b, MATRIX_SENTINEL, MATRIX_SENTINEL
        )));
    }
    Ok(())
}

/// Decodes one `(row, values...)` block according to the precision code.
fn decode_string(block: &[u8], precision: i32, endian: Endian) -> Result<MatrixString> {
    if block.len() < 4 {
        return Err(Op2Error::InvalidFormat(format!(
            "Matrix string of {} bytes has no row index",
            block.len()
        )));
    }
    let row = endian.read_i32(&block[..4]);
    let data = &block[4..];

    let width = match precision {
        1 => 4,
        2 | 3 => 8,
        4 => 16,
        other => {
            return Err(Op2Error::InvalidFormat(format!("Unknown matrix precision {}", other)));
        }
    };
    if data.len() % width != 0 {
        return Err(Op2Error::InvalidFormat(format!(
            "Matrix string of {} value bytes is not a multiple of {}",
            data.len(),
            width
        )));
    }

    let values = match precision {
        1 => MatrixValues::Real(data.chunks_exact(4).map(|v| f64::from(endian.read_f32(v))).collect()),
        2 => MatrixValues::Real(data.chunks_exact(8).map(|v| endian.read_f64(v)).collect()),
        3 => MatrixValues::Complex(
            data.chunks_exact(8)
                .map(|v| (f64::from(endian.read_f32(&v[..4])), f64::from(endian.read_f32(&v[4..]))))
                .collect(),
        ),
        _ => MatrixValues::Complex(
            data.chunks_exact(16)
                .map(|v| (endian.read_f64(&v[..8]), endian.read_f64(&v[8..])))
                .collect(),
        ),
    };
    Ok(MatrixString { row, values })
}
