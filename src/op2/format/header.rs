//! OP2 file header parsing.
//!
//! # Header Structure
//! ```text
//! [3]  [12 bytes] month, day, 2-digit year
//! [7]  [28 bytes] "NASTRAN FORT TAPE ID CODE - "
//! record          label (usually 8 bytes)
//! [-1] [0]
//! ```
//! Files written with `PARAM,POST,-2` carry no header; their first marker is
//! the `[2]` that opens the first table-name record.

use std::io::{Read, Seek};

use log::{debug, info};

use super::framing::RecordFramer;
use crate::op2::types::error::{Op2Error, Result};
use crate::op2::types::models::{FileHeader, TableDate};
use crate::op2::utils;

/// First marker of a stream that starts with a file header.
const HEADER_MARKER: i32 = 3;
/// First marker of a stream that starts directly with a table name.
const TABLE_NAME_MARKER: i32 = 2;

/// Parses the file header if one is present.
///
/// Returns `None`, without consuming anything, when the stream starts
/// directly with a table or with the end-of-stream marker.
pub fn parse<R: Read + Seek>(framer: &mut RecordFramer<R>) -> Result<Option<FileHeader>> {
    let offset = framer.tell();
    let first = framer.peek_marker()?;

    match first {
        HEADER_MARKER => {}
        TABLE_NAME_MARKER => {
            debug!("No file header at {}: stream starts with a table", offset);
            return Ok(None);
        }
        0 => {
            debug!("No file header at {}: stream holds no tables", offset);
            return Ok(None);
        }
        other => {
            return Err(Op2Error::InvalidFormat(format!(
                "Unexpected first marker {} at offset {}; expected {} (header) or {} (table)",
                other, offset, HEADER_MARKER, TABLE_NAME_MARKER
            )));
        }
    }

    info!("Parsing OP2 file header");
    let endian = framer.endian();

    framer.read_markers(&[HEADER_MARKER])?;
    let date_block = framer.read_block()?;
    let words = utils::read_words(&date_block, endian)?;
    if words.len() != 3 {
        return Err(Op2Error::InvalidFormat(format!(
            "Header date block has {} words, expected 3",
            words.len()
        )));
    }
    let date = TableDate::from_raw(words[0], words[1], words[2]);

    framer.read_markers(&[7])?;
    let tape_block = framer.read_block()?;
    let tape_code = utils::decode_text(&tape_block);

    let label_record = framer.read_record()?;
    let label = utils::decode_text(&label_record);

    framer.read_markers(&[-1, 0])?;

    framer.trace().line(format_args!(
        "header: date={} tape_code={:?} label={:?}",
        date, tape_code, label
    ));
    info!("Header parsed: date={}, label='{}'", date, label);

    Ok(Some(FileHeader {
        date,
        tape_code,
        label,
    }))
}
