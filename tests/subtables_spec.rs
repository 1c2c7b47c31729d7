mod common;

use std::io::Cursor;

use common::StreamBuilder;
use op2_reader::op2::cursor::ByteCursor;
use op2_reader::op2::format::framing::RecordFramer;
use op2_reader::op2::format::subtables::{walk_subtables, SubtableBody, WalkPlan};
use op2_reader::op2::trace::DebugSink;
use op2_reader::op2::Result;
use op2_reader::Op2Error;

fn framer(bytes: Vec<u8>) -> RecordFramer<Cursor<Vec<u8>>> {
    let cursor = ByteCursor::open(Cursor::new(bytes), None).expect("cursor should open");
    RecordFramer::new(cursor, DebugSink::null())
}

/// Walks with a sink that collects every delivered `(index, record)`.
fn collect(framer: &mut RecordFramer<Cursor<Vec<u8>>>, plan: &WalkPlan) -> Result<Vec<(i32, Vec<u8>)>> {
    let mut seen = Vec::new();
    let mut record = |index: i32, data: &[u8]| -> Result<()> {
        seen.push((index, data.to_vec()));
        Ok(())
    };
    let sink: &mut dyn FnMut(i32, &[u8]) -> Result<()> = &mut record;
    walk_subtables(framer, plan, Some(sink))?;
    Ok(seen)
}

#[test]
fn test_standard_walk_delivers_records_in_order() {
    let bytes = StreamBuilder::new()
        .subtables(&[b"first...", b"second..", b"third..."])
        .table_name("NEXT")
        .build();
    let mut framer = framer(bytes);

    let seen = collect(&mut framer, &WalkPlan::standard()).unwrap();
    assert_eq!(
        seen,
        vec![
            (-3, b"first...".to_vec()),
            (-4, b"second..".to_vec()),
            (-5, b"third...".to_vec()),
        ]
    );
    assert_eq!(framer.peek_marker().unwrap(), 2, "cursor rests on the next table name");
}

#[test]
fn test_discard_walk_ends_at_the_same_offset() {
    let bytes = StreamBuilder::new().subtables(&[b"aaaa", b"bbbbbbbb"]).build();
    let total = bytes.len() as u64;

    let mut discarding = framer(bytes);
    let summary = walk_subtables(&mut discarding, &WalkPlan::standard(), None).unwrap();
    assert_eq!(summary.subtables, 2);
    assert_eq!(summary.last_index, -5);
    assert_eq!(discarding.tell(), total);
}

#[test]
fn test_empty_subtable_is_counted_but_not_delivered() {
    let bytes = StreamBuilder::new()
        .markers(&[-3, 1, 0])
        .markers(&[-4, 1, 0])
        .record(b"payload!")
        .markers(&[-5, 1, 0, 0])
        .build();
    let mut framer = framer(bytes);

    let seen = collect(&mut framer, &WalkPlan::standard()).unwrap();
    assert_eq!(seen, vec![(-4, b"payload!".to_vec())]);
}

#[test]
fn test_required_subtables_read_before_end_check() {
    // With two required bodies, the end marker is taken for a record marker
    // and the record runs off the end of the stream.
    let bytes = StreamBuilder::new().subtables(&[b"only one"]).build();
    let plan = WalkPlan::standard().required(2);

    let err = walk_subtables(&mut framer(bytes), &plan, None).unwrap_err();
    assert!(matches!(err, Op2Error::TruncatedStream { .. }), "got {:?}", err);
}

#[test]
fn test_limit_requires_the_end_marker() {
    let bytes = StreamBuilder::new().subtables(&[b"1111", b"2222"]).build();
    let plan = WalkPlan::standard().limit(1);

    let err = walk_subtables(&mut framer(bytes), &plan, None).unwrap_err();
    assert!(
        matches!(err, Op2Error::MarkerMismatch { expected: 0, actual: 1, .. }),
        "got {:?}",
        err
    );
}

#[test]
fn test_flagged_walk_ends_on_four_marker_tail() {
    let bytes = StreamBuilder::new()
        .markers(&[-3, 1, 1])
        .marker(9)
        .block(b"block one")
        .markers(&[-4, 1, 1])
        .marker(3)
        .block(b"two")
        .markers(&[-5, 1, 0, 0])
        .build();
    let total = bytes.len() as u64;
    let mut framer = framer(bytes);

    let plan = WalkPlan::standard().flagged(SubtableBody::MarkerAndBlock);
    let seen = collect(&mut framer, &plan).unwrap();
    assert_eq!(seen, vec![(-3, b"block one".to_vec()), (-4, b"two".to_vec())]);
    assert_eq!(framer.tell(), total);
}

#[test]
fn test_counted_span_reads_markers_times_four_plus_twelve() {
    // count 2 -> 2 * 4 + 12 = 20 unframed bytes.
    let span: Vec<u8> = (0u8..20).collect();
    let bytes = StreamBuilder::new()
        .markers(&[-3, 1, 1])
        .marker(2)
        .raw(&span)
        .markers(&[-4, 1, 0, 0])
        .build();
    let mut framer = framer(bytes);

    let plan = WalkPlan::standard().flagged(SubtableBody::CountedSpan);
    let seen = collect(&mut framer, &plan).unwrap();
    assert_eq!(seen, vec![(-3, span)]);
}

#[test]
fn test_cadence_run_stops_at_first_other_marker() {
    let bytes = StreamBuilder::new()
        .markers(&[-9, 1, 1])
        .marker(2)
        .block(b"aa")
        .marker(8)
        .block(b"bbbb")
        .markers(&[-10, 1, 1])
        .marker(6)
        .block(b"cc")
        .markers(&[-11, 1, 0, 0])
        .build();
    let mut framer = framer(bytes);

    let plan = WalkPlan::standard().starting_at(-9).flagged(SubtableBody::CadenceRun);
    let seen = collect(&mut framer, &plan).unwrap();
    assert_eq!(
        seen,
        vec![(-9, b"aa".to_vec()), (-9, b"bbbb".to_vec()), (-10, b"cc".to_vec())]
    );
}
