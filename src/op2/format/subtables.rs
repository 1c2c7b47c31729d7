//! The descending-index subtable walk shared by most tables.
//!
//! After a table's fixed leading records, subtables follow at indices
//! `-3, -4, -5, ...`, each introduced by a `[n, 1, flag]` marker triple:
//!
//! ```text
//! flag 0:  [n, 1, 0] body   ...   [n, 1, 0] [0]        <- end of table
//! flag 1:  [n, 1, 1] body   ...   [n, 1, 0, 0]         <- end of table
//! ```
//!
//! Which body follows each header, how many bodies are mandatory and how
//! many are allowed are described by a [`WalkPlan`], so the walk itself
//! never looks at table names.

use std::io::{Read, Seek};

use log::trace;

use super::framing::RecordFramer;
use crate::op2::types::error::{Op2Error, Result};

/// Markers that announce another block in a cadence run.
const CADENCE_MARKERS: [i32; 4] = [2, 4, 6, 8];

/// Shape of the data between two subtable headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtableBody {
    /// One logical record.
    Record,
    /// A count marker `m` followed by `m * 4 + 12` unframed bytes.
    CountedSpan,
    /// A single marker of any value followed by one block.
    MarkerAndBlock,
    /// Zero or more `(marker, block)` pairs whose markers are 2, 4, 6 or 8.
    CadenceRun,
}

/// Per-table configuration of the subtable walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkPlan {
    /// Index of the first subtable header.
    pub first_index: i32,
    /// Third word of every body-carrying header: 0 or 1.
    pub flag: i32,
    pub body: SubtableBody,
    /// Subtables whose body is read without checking for the end of the table.
    pub required: usize,
    /// Maximum number of subtables before the end marker must appear.
    pub limit: Option<usize>,
}

impl WalkPlan {
    /// `[-3, 1, 0]` record ... `[0]`, open-ended.
    pub const fn standard() -> Self {
        WalkPlan {
            first_index: -3,
            flag: 0,
            body: SubtableBody::Record,
            required: 0,
            limit: None,
        }
    }

    pub const fn starting_at(mut self, first_index: i32) -> Self {
        self.first_index = first_index;
        self
    }

    pub const fn flagged(mut self, body: SubtableBody) -> Self {
        self.flag = 1;
        self.body = body;
        self
    }

    pub const fn required(mut self, required: usize) -> Self {
        self.required = required;
        self
    }

    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// What a finished walk went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkSummary {
    /// Subtables seen before the end marker, empty ones included.
    pub subtables: usize,
    /// Index of the closing header.
    pub last_index: i32,
}

/// Receives each subtable body as it is read. `None` discards payloads
/// without allocating them where the body shape allows it.
pub type RecordSink<'a> = Option<&'a mut dyn FnMut(i32, &[u8]) -> Result<()>>;

/// Walks subtables until the end-of-table marker, leaving the cursor on the
/// next table name.
pub fn walk_subtables<R: Read + Seek>(
    framer: &mut RecordFramer<R>,
    plan: &WalkPlan,
    mut sink: RecordSink<'_>,
) -> Result<WalkSummary> {
    let mut index = plan.first_index;
    let mut subtables = 0usize;

    loop {
        framer.read_markers(&[index, 1])?;

        if subtables < plan.required {
            framer.read_markers(&[plan.flag])?;
            read_body(framer, plan.body, index, &mut sink)?;
            subtables += 1;
            index -= 1;
            continue;
        }

        let at_limit = plan.limit.is_some_and(|limit| subtables >= limit);

        if plan.flag == 0 {
            framer.read_markers(&[0])?;
            let next = framer.peek_marker()?;
            if next == 0 {
                framer.read_markers(&[0])?;
                break;
            }
            if at_limit {
                return Err(end_expected(framer.tell(), next));
            }
            if next < 0 {
                // The next header follows at once: this subtable is empty.
                trace!("empty subtable {}", index);
                subtables += 1;
                index -= 1;
                continue;
            }
        } else {
            let third = framer.peek_marker()?;
            if third == 0 {
                framer.read_markers(&[0, 0])?;
                break;
            }
            if at_limit {
                return Err(end_expected(framer.tell(), third));
            }
            framer.read_markers(&[plan.flag])?;
        }

        read_body(framer, plan.body, index, &mut sink)?;
        subtables += 1;
        index -= 1;
    }

    framer
        .trace()
        .line(format_args!("  end of table after {} subtable(s), last index {}", subtables, index));
    Ok(WalkSummary {
        subtables,
        last_index: index,
    })
}

/// Reads one body of the given shape.
pub fn read_body<R: Read + Seek>(
    framer: &mut RecordFramer<R>,
    body: SubtableBody,
    index: i32,
    sink: &mut RecordSink<'_>,
) -> Result<()> {
    match body {
        SubtableBody::Record => match sink {
            Some(deliver) => {
                let data = framer.read_record()?;
                deliver(index, &data)?;
            }
            None => {
                framer.skip_record()?;
            }
        },
        SubtableBody::CountedSpan => {
            let count = framer.read_marker()?;
            let nbytes = i64::from(count.value) * 4 + 12;
            if nbytes < 0 {
                return Err(Op2Error::FatalStream {
                    offset: count.offset,
                    reason: format!("negative span length from count marker {}", count.value),
                });
            }
            let data = framer.read_raw(nbytes as usize)?;
            if let Some(deliver) = sink {
                deliver(index, &data)?;
            }
        }
        SubtableBody::MarkerAndBlock => {
            framer.read_marker()?;
            let data = framer.read_block()?;
            if let Some(deliver) = sink {
                deliver(index, &data)?;
            }
        }
        SubtableBody::CadenceRun => {
            while CADENCE_MARKERS.contains(&framer.peek_marker()?) {
                framer.read_marker()?;
                let data = framer.read_block()?;
                if let Some(deliver) = sink {
                    deliver(index, &data)?;
                }
            }
        }
    }
    Ok(())
}

fn end_expected(offset: u64, actual: i32) -> Op2Error {
    Op2Error::MarkerMismatch {
        offset,
        expected: 0,
        actual,
    }
}
