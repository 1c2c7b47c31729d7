//! Handlers for the two generic table shapes: skipped geometry tables and
//! framed result tables.
//!
//! # Table Structure
//! ```text
//! record          table name
//! [-1]     record table identification
//! [-2,1,0] record subtable name (8 bytes) or name + date + flags (28 bytes)
//! [-3,1,0] record ... [-k,1,0] [0]
//! ```

use std::io::{Read, Seek};

use log::debug;

use super::framing::RecordFramer;
use super::subtables::{walk_subtables, WalkPlan};
use super::table_name::{expect_table_name, TABLE_NAME_BYTES};
use crate::op2::decoder::{DecoderContext, DecoderRegistry};
use crate::op2::types::error::{Op2Error, Result};
use crate::op2::types::models::{Endian, ResultFamily, TableDate, TableHeader, TableName};
use crate::op2::utils;

/// Length of the dated `-2` record: name, month, day, year, flag, one.
const DATED_HEADER_BYTES: usize = 28;

/// Skips a table that follows the generic layout without allocating its
/// payload.
pub fn skip_generic_table<R: Read + Seek>(framer: &mut RecordFramer<R>) -> Result<TableName> {
    let name = expect_table_name(framer)?;
    framer.trace().line(format_args!("skipping table...{}", name));
    framer.read_markers(&[-1])?;
    framer.skip_record()?;
    framer.read_markers(&[-2, 1, 0])?;
    framer.skip_record()?;
    walk_subtables(framer, &WalkPlan::standard(), None)?;
    Ok(name)
}

/// Frames a result table and feeds its subtables to the family decoder.
///
/// Tables whose family has no registered decoder are walked in discard mode
/// and produce no output.
pub fn read_results_table<R: Read + Seek, O>(
    framer: &mut RecordFramer<R>,
    family: ResultFamily,
    decoders: &mut DecoderRegistry<O>,
) -> Result<Option<O>> {
    let name = expect_table_name(framer)?;
    framer.trace().line(format_args!("read_results_table - {}", name));

    framer.read_markers(&[-1])?;
    let ident_record = framer.read_record()?;
    framer.read_markers(&[-2, 1, 0])?;
    let raw = framer.read_record()?;
    let header = parse_table_header(name, ident_record, &raw, framer.endian())?;
    trace_table_header(framer, &header);

    let registered = match family {
        ResultFamily::Passer => None,
        _ => decoders.get_mut(family),
    };
    let decoder = match registered {
        Some(decoder) => decoder,
        None => {
            debug!("No decoder for {} ({:?}); discarding payload", header.table_name, family);
            walk_subtables(framer, &WalkPlan::standard(), None)?;
            return Ok(None);
        }
    };

    let mut ctx = DecoderContext::new(header);
    let mut deliver = |index: i32, record: &[u8]| -> Result<()> {
        ctx.subtable_index = index;
        if index % 2 != 0 {
            ctx.subtable_header = record.to_vec();
            ctx.header_records += 1;
            decoder.on_subtable_header(&mut ctx, record)
        } else {
            ctx.payload_records += 1;
            decoder.on_payload_record(&mut ctx, record)
        }
    };
    let sink: &mut dyn FnMut(i32, &[u8]) -> Result<()> = &mut deliver;
    walk_subtables(framer, &WalkPlan::standard(), Some(sink))?;

    debug!(
        "Table {} complete: {} header and {} payload records",
        ctx.header.table_name, ctx.header_records, ctx.payload_records
    );
    decoder.on_table_complete(ctx)
}

/// Parses a table's `-2` record. The layout is chosen by record length,
/// since both forms occur across table families.
pub fn parse_table_header(
    table_name: TableName,
    ident_record: Vec<u8>,
    raw: &[u8],
    endian: Endian,
) -> Result<TableHeader> {
    match raw.len() {
        TABLE_NAME_BYTES => Ok(TableHeader {
            table_name,
            ident_record,
            subtable_name: utils::decode_text(raw),
            date: None,
            approach_flag: 0,
        }),
        DATED_HEADER_BYTES => {
            let words = utils::read_words(&raw[TABLE_NAME_BYTES..], endian)?;
            let (month, day, year, flag, one) = (words[0], words[1], words[2], words[3], words[4]);
            if one != 1 {
                return Err(Op2Error::InvalidFormat(format!(
                    "Dated subtable header of {} ends with {}, expected 1",
                    table_name, one
                )));
            }
            Ok(TableHeader {
                table_name,
                ident_record,
                subtable_name: utils::decode_text(&raw[..TABLE_NAME_BYTES]),
                date: Some(TableDate::from_raw(month, day, year)),
                approach_flag: flag,
            })
        }
        other => Err(Op2Error::InvalidFormat(format!(
            "Subtable header of {} is {} bytes, expected {} or {} [{}]",
            table_name,
            other,
            TABLE_NAME_BYTES,
            DATED_HEADER_BYTES,
            utils::hex_preview(raw, 32)
        ))),
    }
}

pub(crate) fn trace_table_header<R: Read + Seek>(framer: &mut RecordFramer<R>, header: &TableHeader) {
    match header.date {
        Some(date) => framer.trace().line(format_args!(
            "  subtable_name={:?} date={} flag={}",
            header.subtable_name, date, header.approach_flag
        )),
        None => framer
            .trace()
            .line(format_args!("  subtable_name={:?}", header.subtable_name)),
    }
}
