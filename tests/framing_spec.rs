mod common;

use std::io::Cursor;

use common::{padded, StreamBuilder};
use op2_reader::op2::cursor::ByteCursor;
use op2_reader::op2::format::framing::RecordFramer;
use op2_reader::op2::format::table_name::{read_table_name, TableNameOrEnd};
use op2_reader::op2::trace::DebugSink;
use op2_reader::{Endian, Op2Error, TableName};

fn framer(bytes: Vec<u8>) -> RecordFramer<Cursor<Vec<u8>>> {
    let cursor = ByteCursor::open(Cursor::new(bytes), None).expect("cursor should open");
    RecordFramer::new(cursor, DebugSink::null())
}

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// (payload length, chunk size): empty, one byte, one block, several blocks.
const RECORD_SIZES: &[(usize, usize)] = &[(0, 4096), (1, 4096), (28, 4096), (4096, 4096), (10_000, 4096), (9, 4)];

#[test]
fn test_read_record_returns_exact_payload() {
    for &(len, chunk) in RECORD_SIZES {
        let data = payload(len);
        let bytes = StreamBuilder::new().split_record(&data, chunk).marker(-1).build();
        let total = bytes.len() as u64;
        let mut framer = framer(bytes);

        let record = framer.read_record().expect("record should read");
        assert_eq!(record, data, "payload of {} bytes in {}-byte chunks", len, chunk);
        framer.read_markers(&[-1]).expect("terminating marker should follow the record");
        assert_eq!(framer.tell(), total, "no bytes left after record of {} bytes", len);
    }
}

#[test]
fn test_skip_record_lands_where_read_record_does() {
    for &(len, chunk) in RECORD_SIZES {
        let bytes = StreamBuilder::new().split_record(&payload(len), chunk).marker(-1).build();

        let mut reading = framer(bytes.clone());
        reading.read_record().unwrap();
        let mut skipping = framer(bytes);
        let skipped = skipping.skip_record().unwrap();

        assert_eq!(skipped, len as u64, "skip_record reports the payload length");
        assert_eq!(skipping.tell(), reading.tell(), "same end offset for {} bytes", len);
    }
}

#[test]
fn test_block_length_mismatch_reports_block_offset() {
    let builder = StreamBuilder::new().marker(1);
    let block_offset = builder.offset();
    let bytes = builder.corrupt_block(&[1, 2, 3, 4], 5).marker(-1).build();

    let err = framer(bytes).read_record().unwrap_err();
    match err {
        Op2Error::BlockLengthMismatch { offset, leading, trailing } => {
            assert_eq!(offset, block_offset);
            assert_eq!(leading, 4);
            assert_eq!(trailing, 5);
        }
        other => panic!("expected BlockLengthMismatch, got {:?}", other),
    }
}

#[test]
fn test_short_block_is_truncated_stream() {
    let bytes = StreamBuilder::new().marker(2).word(8).raw(&[1, 2, 3]).build();

    let err = framer(bytes).read_record().unwrap_err();
    assert!(
        matches!(err, Op2Error::TruncatedStream { offset: 16, needed: 8, available: 3 }),
        "got {:?}",
        err
    );
}

#[test]
fn test_read_markers_reports_first_disagreement() {
    let bytes = StreamBuilder::new().markers(&[-3, 1, 0]).build();

    let err = framer(bytes).read_markers(&[-3, 1, 1]).unwrap_err();
    assert!(
        matches!(err, Op2Error::MarkerMismatch { offset: 24, expected: 1, actual: 0 }),
        "got {:?}",
        err
    );
}

#[test]
fn test_marker_with_wrong_length_is_invalid() {
    let bytes = StreamBuilder::new().word(8).word(1).word(2).build();
    let cursor = ByteCursor::open(Cursor::new(bytes), Some(Endian::Little)).unwrap();
    let mut framer = RecordFramer::new(cursor, DebugSink::null());

    let err = framer.read_marker().unwrap_err();
    assert!(matches!(err, Op2Error::InvalidMarker { offset: 0, length: 8 }), "got {:?}", err);
}

#[test]
fn test_peek_markers_restores_position() {
    let bytes = StreamBuilder::new().markers(&[-3, 1, 0]).build();
    let mut framer = framer(bytes);

    assert_eq!(framer.peek_markers(2).unwrap(), vec![-3, 1]);
    assert_eq!(framer.tell(), 0, "peek must not advance the cursor");
    assert!(framer.recent_markers().is_empty(), "peeked markers are not recorded");

    framer.read_markers(&[-3, 1, 0]).unwrap();
    assert_eq!(framer.recent_markers(), vec![-3, 1, 0]);
}

#[test]
fn test_byte_order_is_detected_from_first_marker() {
    let little = ByteCursor::open(StreamBuilder::new().marker(3).cursor(), None).unwrap();
    assert_eq!(little.endian(), Endian::Little);

    let big = ByteCursor::open(StreamBuilder::big_endian().marker(3).cursor(), None).unwrap();
    assert_eq!(big.endian(), Endian::Big);

    let err = ByteCursor::open(Cursor::new(vec![0u8, 0, 0, 0]), None).unwrap_err();
    assert!(matches!(err, Op2Error::UnknownEndianness { first_word: 0 }), "got {:?}", err);
}

#[test]
fn test_big_endian_record_round_trip() {
    let data = payload(40);
    let bytes = StreamBuilder::big_endian().split_record(&data, 16).marker(-1).build();
    let mut framer = framer(bytes);

    assert_eq!(framer.endian(), Endian::Big);
    assert_eq!(framer.read_record().unwrap(), data);
}

#[test]
fn test_cursor_resumes_from_current_position() {
    let bytes = StreamBuilder::new().marker(7).markers(&[-1, 0]).build();
    let mut source = Cursor::new(bytes);
    source.set_position(12);

    let cursor = ByteCursor::open(source, None).unwrap();
    assert_eq!(cursor.tell(), 12, "cursor starts where the source stands");
    let mut framer = RecordFramer::new(cursor, DebugSink::null());
    framer.read_markers(&[-1, 0]).unwrap();
}

#[test]
fn test_table_name_rewind_restores_position() {
    let bytes = StreamBuilder::new().table_name("oug1").marker(-1).build();
    let mut framer = framer(bytes);

    let probed = read_table_name(&mut framer, true, false).unwrap();
    assert_eq!(probed, TableNameOrEnd::Table(TableName::new("OUG1")));
    assert_eq!(framer.tell(), 0, "rewind leaves the name for the handler");
    assert!(framer.recent_markers().is_empty(), "rewind also forgets the name marker");

    let read = read_table_name(&mut framer, false, true).unwrap();
    assert_eq!(read, TableNameOrEnd::Table(TableName::new("OUG1")));
    assert_eq!(framer.tell(), 28, "name record consumed");
    assert_eq!(framer.recent_markers(), vec![2], "name marker recorded once");
}

#[test]
fn test_restore_undoes_reads() {
    let bytes = StreamBuilder::new().markers(&[-1, 7]).record(b"payload!").marker(-2).build();
    let mut framer = framer(bytes);
    framer.read_markers(&[-1]).unwrap();

    let checkpoint = framer.checkpoint();
    framer.read_markers(&[7]).unwrap();
    framer.read_record().unwrap();
    framer.restore(checkpoint).unwrap();

    assert_eq!(framer.tell(), 12);
    assert_eq!(framer.recent_markers(), vec![-1]);
    assert_eq!(framer.peek_marker().unwrap(), 7);
}

#[test]
fn test_table_name_is_trimmed_and_upper_cased() {
    assert_eq!(TableName::from_bytes(b"geom1   ").as_str(), "GEOM1");
    assert_eq!(TableName::from_bytes(b"OES1X1\0\0").as_str(), "OES1X1");
    assert_eq!(TableName::from_bytes(&padded("KELM")), TableName::new(" kelm "));
}

#[test]
fn test_end_marker_is_normal_termination_only_when_lenient() {
    let bytes = StreamBuilder::new().end().raw(b"garbage!").build();

    let mut lenient = framer(bytes.clone());
    let outcome = read_table_name(&mut lenient, true, false).unwrap();
    assert_eq!(outcome, TableNameOrEnd::EndOfStream);
    assert_eq!(lenient.tell(), 12, "only the end marker is consumed, even with rewind");

    let mut strict = framer(bytes);
    let err = read_table_name(&mut strict, false, true).unwrap_err();
    assert!(matches!(err, Op2Error::FatalStream { offset: 0, .. }), "got {:?}", err);
}

#[test]
fn test_table_name_failures_are_fatal() {
    // A name record of the wrong width.
    let bytes = StreamBuilder::new().record(b"TOO_LONG_NAME_").marker(-1).build();
    let err = read_table_name(&mut framer(bytes), true, false).unwrap_err();
    assert!(matches!(err, Op2Error::FatalStream { offset: 0, .. }), "got {:?}", err);

    // A subtable marker where a name should be.
    let bytes = StreamBuilder::new().markers(&[-3, 1, 0]).build();
    let err = read_table_name(&mut framer(bytes), true, false).unwrap_err();
    assert!(matches!(err, Op2Error::FatalStream { .. }), "got {:?}", err);

    // Neither a name nor a complete end marker.
    let bytes = StreamBuilder::new().word(4).word(0).build();
    let err = read_table_name(&mut framer(bytes), true, false).unwrap_err();
    assert!(matches!(err, Op2Error::TruncatedStream { .. }), "got {:?}", err);
}
