//! Table name resolution.
//!
//! Every table opens with a record holding its 8-byte, blank-padded name.
//! The stream ends where a name would be expected and a lone `[0]` marker
//! is found instead.

use std::io::{Read, Seek};

use log::trace;

use super::framing::RecordFramer;
use crate::op2::types::error::{Op2Error, Result};
use crate::op2::types::models::TableName;

/// Width of the name field in a table-name record.
pub const TABLE_NAME_BYTES: usize = 8;

/// Outcome of probing for the next table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableNameOrEnd {
    Table(TableName),
    EndOfStream,
}

/// Reads the next table name.
///
/// * `rewind` - restore the position to the start of the name record
///   afterwards, so the table handler can consume it as part of its own
///   sequence. Ignored at end of stream: the end marker stays consumed.
/// * `strict` - a table must be present here. When `false`, a zero marker
///   in place of the name record is the normal end of the stream.
///
/// Nothing past the end marker is ever read.
pub fn read_table_name<R: Read + Seek>(
    framer: &mut RecordFramer<R>,
    rewind: bool,
    strict: bool,
) -> Result<TableNameOrEnd> {
    let start = framer.tell();
    let checkpoint = framer.checkpoint();
    let first = framer.peek_marker()?;

    if first == 0 {
        if strict {
            return Err(Op2Error::FatalStream {
                offset: start,
                reason: "expected a table name, found the end-of-stream marker".to_string(),
            });
        }
        framer.read_markers(&[0])?;
        framer.trace().line(format_args!("end of stream at {}", start));
        trace!("End-of-stream marker at {}", start);
        return Ok(TableNameOrEnd::EndOfStream);
    }
    if first < 0 {
        return Err(Op2Error::FatalStream {
            offset: start,
            reason: format!("expected a table name record, found subtable marker {}", first),
        });
    }

    let data = framer.read_record()?;
    if data.len() != TABLE_NAME_BYTES {
        return Err(Op2Error::FatalStream {
            offset: start,
            reason: format!(
                "table name record is {} bytes, expected {}",
                data.len(),
                TABLE_NAME_BYTES
            ),
        });
    }
    let name = TableName::from_bytes(&data);
    framer
        .trace()
        .line(format_args!("table_header = [8, {}, 8] at {}", name, start));

    if rewind {
        framer.restore(checkpoint)?;
    }
    Ok(TableNameOrEnd::Table(name))
}

/// Reads a table name that must be present and returns it.
pub fn expect_table_name<R: Read + Seek>(framer: &mut RecordFramer<R>) -> Result<TableName> {
    let offset = framer.tell();
    match read_table_name(framer, false, true)? {
        TableNameOrEnd::Table(name) => Ok(name),
        TableNameOrEnd::EndOfStream => Err(Op2Error::FatalStream {
            offset,
            reason: "expected a table name".to_string(),
        }),
    }
}
