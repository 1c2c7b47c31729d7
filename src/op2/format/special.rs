//! Hand-coded handlers for tables that break the generic layout.
//!
//! Each handler consumes exactly one table, from its name record to its end
//! marker. Where a table still ends in a recognizable subtable walk, the
//! irregular part is read here and the rest is described as a [`WalkPlan`].
//!
//! ```text
//! DIT      -1 rec | -2 rec | -3 rec, -4 rec, up to 4 more [n,1,0] rec | [0]
//! GPL      -1 rec | [n,1,0] rec from -2 ... [0]
//! MEFF     -1 rec | -2 rec | [n,1,1] [m] (m*4+12 bytes) for -3..-8 | [-9,1,0,0]
//! OMM2     -1 rec | -2 rec (28 bytes, dated) | generic walk
//! FOL      -1 rec | -2 rec (name + f32) | generic walk
//! SDF      -1 rec | -2 rec (name, 170, 170) | [-3,1,1] [m] block | [-4,1,0,0]
//! KELM     -1 rec | -2 rec (name, 170, 170) | fixed runs -3..-8 | cadence runs
//! PCOMPTS  -1 rec | -2 rec | up to three [n,1,0] rec | [0]
//! ```

use std::io::{Read, Seek};

use log::{debug, info};

use super::framing::RecordFramer;
use super::matrix::expect_sentinel_record;
use super::subtables::{read_body, walk_subtables, SubtableBody, WalkPlan};
use super::table_name::{expect_table_name, TABLE_NAME_BYTES};
use super::tables::{parse_table_header, trace_table_header};
use crate::op2::types::error::{Op2Error, Result};
use crate::op2::types::models::{SpecialTable, TableName};
use crate::op2::utils;

const DIT_PLAN: WalkPlan = WalkPlan::standard().required(2).limit(6);
const GPL_PLAN: WalkPlan = WalkPlan::standard().starting_at(-2);
/// The `markers * 4 + 12` span read at each of `-3..=-8`.
const MEFF_PLAN: WalkPlan = WalkPlan::standard()
    .flagged(SubtableBody::CountedSpan)
    .required(6)
    .limit(6);
const SDF_PLAN: WalkPlan = WalkPlan::standard()
    .flagged(SubtableBody::MarkerAndBlock)
    .required(1)
    .limit(1);
const KELM_TAIL_PLAN: WalkPlan = WalkPlan::standard()
    .starting_at(-9)
    .flagged(SubtableBody::CadenceRun);
const PCOMPTS_PLAN: WalkPlan = WalkPlan::standard().limit(3);

/// `(marker, repeat)` runs of the two stiffness subtables at -3 and -4.
const KELM_STIFFNESS_RUNS: &[(i32, usize)] = &[(2, 17), (4, 1), (2, 7)];
const KELM_FIXED_RUNS: &[(i32, &[(i32, usize)])] = &[
    (-5, &[(600, 1)]),
    (-6, &[(188, 1), (14, 1), (16, 1), (18, 1), (84, 1), (6, 1)]),
    (-7, &[(342, 1)]),
];

/// Length of the FOL `-2` record: name plus one f32.
const FOL_HEADER_BYTES: usize = TABLE_NAME_BYTES + 4;

/// Runs the handler for `special`, consuming one whole table.
pub fn read_special_table<R: Read + Seek>(
    framer: &mut RecordFramer<R>,
    special: SpecialTable,
) -> Result<TableName> {
    match special {
        SpecialTable::Dit => read_dit(framer),
        SpecialTable::Gpl => read_gpl(framer),
        SpecialTable::Meff | SpecialTable::Intmod => read_counted_spans(framer),
        SpecialTable::Omm2 => read_omm2(framer),
        SpecialTable::Fol => read_fol(framer),
        SpecialTable::Sdf => read_sdf(framer),
        SpecialTable::Kelm => read_kelm(framer),
        SpecialTable::Pcompts => skip_pcompts(framer),
    }
}

/// Reads the name, the `-1` record and the `-2` record common to every
/// special table, returning the `-2` record.
fn read_leading_records<R: Read + Seek>(framer: &mut RecordFramer<R>) -> Result<(TableName, Vec<u8>)> {
    let name = expect_table_name(framer)?;
    info!("Reading special table {}", name);
    framer.read_markers(&[-1])?;
    framer.skip_record()?;
    framer.read_markers(&[-2, 1, 0])?;
    let second = framer.read_record()?;
    Ok((name, second))
}

fn read_dit<R: Read + Seek>(framer: &mut RecordFramer<R>) -> Result<TableName> {
    let (name, second) = read_leading_records(framer)?;
    framer
        .trace()
        .line(format_args!("  subtable_name={:?}", utils::decode_text(&second)));
    let summary = walk_subtables(framer, &DIT_PLAN, None)?;
    debug!("{}: {} subtable(s)", name, summary.subtables);
    Ok(name)
}

fn read_gpl<R: Read + Seek>(framer: &mut RecordFramer<R>) -> Result<TableName> {
    let name = expect_table_name(framer)?;
    info!("Reading special table {}", name);
    framer.read_markers(&[-1])?;
    framer.skip_record()?;

    if framer.peek_marker()? == 0 {
        framer.read_markers(&[0])?;
        return Ok(name);
    }
    walk_subtables(framer, &GPL_PLAN, None)?;
    Ok(name)
}

fn read_counted_spans<R: Read + Seek>(framer: &mut RecordFramer<R>) -> Result<TableName> {
    let (name, _) = read_leading_records(framer)?;
    let mut spans = 0usize;
    let mut count_span = |index: i32, span: &[u8]| -> Result<()> {
        spans += 1;
        debug!("{} subtable {}: {} byte span", name, index, span.len());
        Ok(())
    };
    let sink: &mut dyn FnMut(i32, &[u8]) -> Result<()> = &mut count_span;
    walk_subtables(framer, &MEFF_PLAN, Some(sink))?;
    debug!("{}: {} span(s)", name, spans);
    Ok(name)
}

fn read_omm2<R: Read + Seek>(framer: &mut RecordFramer<R>) -> Result<TableName> {
    let (name, second) = read_leading_records(framer)?;
    if second.len() != 28 {
        return Err(Op2Error::InvalidFormat(format!(
            "{} subtable header is {} bytes, expected a 28-byte dated header [{}]",
            name,
            second.len(),
            utils::hex_preview(&second, 32)
        )));
    }
    let header = parse_table_header(name, Vec::new(), &second, framer.endian())?;
    trace_table_header(framer, &header);
    walk_subtables(framer, &WalkPlan::standard(), None)?;
    Ok(header.table_name)
}

fn read_fol<R: Read + Seek>(framer: &mut RecordFramer<R>) -> Result<TableName> {
    let (name, second) = read_leading_records(framer)?;
    if second.len() != FOL_HEADER_BYTES {
        return Err(Op2Error::InvalidFormat(format!(
            "{} subtable header is {} bytes, expected {} [{}]",
            name,
            second.len(),
            FOL_HEADER_BYTES,
            utils::hex_preview(&second, 32)
        )));
    }
    let subtable_name = utils::decode_text(&second[..TABLE_NAME_BYTES]);
    let value = framer.endian().read_f32(&second[TABLE_NAME_BYTES..]);
    framer
        .trace()
        .line(format_args!("  subtable_name={:?} value={}", subtable_name, value));
    walk_subtables(framer, &WalkPlan::standard(), None)?;
    Ok(name)
}

fn read_sdf<R: Read + Seek>(framer: &mut RecordFramer<R>) -> Result<TableName> {
    let (name, second) = read_leading_records(framer)?;
    expect_sentinel_record(&name, &second, framer.endian())?;
    walk_subtables(framer, &SDF_PLAN, None)?;
    Ok(name)
}

fn read_kelm<R: Read + Seek>(framer: &mut RecordFramer<R>) -> Result<TableName> {
    let (name, second) = read_leading_records(framer)?;
    expect_sentinel_record(&name, &second, framer.endian())?;

    for index in [-3, -4] {
        framer.read_markers(&[index, 1, 1])?;
        read_block_runs(framer, KELM_STIFFNESS_RUNS)?;
    }
    for &(index, runs) in KELM_FIXED_RUNS {
        framer.read_markers(&[index, 1, 1])?;
        read_block_runs(framer, runs)?;
    }

    // -8 opens with one block of any length before its cadence run.
    framer.read_markers(&[-8, 1, 1])?;
    framer.read_marker()?;
    framer.skip_block()?;
    read_body(framer, SubtableBody::CadenceRun, -8, &mut None)?;

    let summary = walk_subtables(framer, &KELM_TAIL_PLAN, None)?;
    debug!("{}: {} cadence subtable(s) after -8", name, summary.subtables);
    Ok(name)
}

fn skip_pcompts<R: Read + Seek>(framer: &mut RecordFramer<R>) -> Result<TableName> {
    let name = expect_table_name(framer)?;
    info!("Skipping special table {}", name);
    framer.read_markers(&[-1])?;
    framer.skip_record()?;
    framer.read_markers(&[-2, 1, 0])?;
    framer.skip_record()?;
    walk_subtables(framer, &PCOMPTS_PLAN, None)?;
    Ok(name)
}

/// Reads `repeat` `[marker] block` pairs for each run, in order.
fn read_block_runs<R: Read + Seek>(framer: &mut RecordFramer<R>, runs: &[(i32, usize)]) -> Result<()> {
    for &(marker, repeat) in runs {
        for _ in 0..repeat {
            framer.read_markers(&[marker])?;
            framer.skip_block()?;
        }
    }
    Ok(())
}
