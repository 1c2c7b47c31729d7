//! Synthetic OP2 stream construction for integration tests.
#![allow(dead_code)]

use std::io::Cursor;

use op2_reader::Endian;

pub const TAPE_CODE: &[u8; 28] = b"NASTRAN FORT TAPE ID CODE - ";

/// Builds a byte stream one framing element at a time.
#[derive(Debug, Clone)]
pub struct StreamBuilder {
    bytes: Vec<u8>,
    endian: Endian,
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self::with_endian(Endian::Little)
    }

    pub fn big_endian() -> Self {
        Self::with_endian(Endian::Big)
    }

    pub fn with_endian(endian: Endian) -> Self {
        StreamBuilder {
            bytes: Vec::new(),
            endian,
        }
    }

    /// Current length, i.e. the offset of whatever is written next.
    pub fn offset(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn word(mut self, value: i32) -> Self {
        let encoded = encode_i32(value, self.endian);
        self.bytes.extend_from_slice(&encoded);
        self
    }

    pub fn raw(mut self, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(data);
        self
    }

    pub fn marker(self, value: i32) -> Self {
        self.word(4).word(value).word(4)
    }

    pub fn markers(mut self, values: &[i32]) -> Self {
        for &value in values {
            self = self.marker(value);
        }
        self
    }

    pub fn block(self, payload: &[u8]) -> Self {
        let len = payload.len() as i32;
        self.word(len).raw(payload).word(len)
    }

    /// A block whose trailing length disagrees with its leading one.
    pub fn corrupt_block(self, payload: &[u8], trailing: i32) -> Self {
        let len = payload.len() as i32;
        self.word(len).raw(payload).word(trailing)
    }

    /// One record in a single block, announced by its word count.
    pub fn record(self, payload: &[u8]) -> Self {
        let words = (payload.len() / 4).max(1) as i32;
        self.marker(words).block(payload)
    }

    /// One record written as several blocks of at most `chunk` bytes.
    pub fn split_record(mut self, payload: &[u8], chunk: usize) -> Self {
        if payload.is_empty() {
            return self.record(payload);
        }
        for piece in payload.chunks(chunk) {
            self = self.record(piece);
        }
        self
    }

    pub fn words(&self, values: &[i32]) -> Vec<u8> {
        values
            .iter()
            .flat_map(|&value| encode_i32(value, self.endian))
            .collect()
    }

    pub fn f32s(&self, values: &[f32]) -> Vec<u8> {
        values
            .iter()
            .flat_map(|&value| match self.endian {
                Endian::Little => value.to_le_bytes(),
                Endian::Big => value.to_be_bytes(),
            })
            .collect()
    }

    pub fn f64s(&self, values: &[f64]) -> Vec<u8> {
        values
            .iter()
            .flat_map(|&value| match self.endian {
                Endian::Little => value.to_le_bytes(),
                Endian::Big => value.to_be_bytes(),
            })
            .collect()
    }

    /// File header: date, tape code, label, `[-1, 0]`.
    pub fn file_header(self, month: i32, day: i32, year: i32, label: &str) -> Self {
        let date = self.words(&[month, day, year]);
        self.marker(3)
            .block(&date)
            .marker(7)
            .block(TAPE_CODE)
            .record(&padded(label))
            .markers(&[-1, 0])
    }

    pub fn table_name(self, name: &str) -> Self {
        self.record(&padded(name))
    }

    /// Name, `-1` record and `-2` record.
    pub fn table_start(self, name: &str, second: &[u8]) -> Self {
        let ident = self.words(&[101, 0, 0, 0, 0, 0, 0]);
        self.table_name(name)
            .marker(-1)
            .record(&ident)
            .markers(&[-2, 1, 0])
            .record(second)
    }

    /// `[n, 1, 0]` records from `first`, closed with `[n, 1, 0] [0]`.
    pub fn subtables_from(mut self, first: i32, records: &[&[u8]]) -> Self {
        let mut index = first;
        for record in records {
            self = self.markers(&[index, 1, 0]).record(record);
            index -= 1;
        }
        self.markers(&[index, 1, 0, 0])
    }

    pub fn subtables(self, records: &[&[u8]]) -> Self {
        self.subtables_from(-3, records)
    }

    /// A table in the generic layout with an 8-byte subtable name.
    pub fn generic_table(self, name: &str, records: &[&[u8]]) -> Self {
        self.table_start(name, &padded(name)).subtables(records)
    }

    /// A result table whose `-2` record is the 28-byte dated form.
    pub fn dated_result_table(self, name: &str, date: (i32, i32, i32), records: &[&[u8]]) -> Self {
        let second = self.dated_header(name, date, 0);
        self.table_start(name, &second).subtables(records)
    }

    pub fn dated_header(&self, name: &str, (month, day, year): (i32, i32, i32), flag: i32) -> Vec<u8> {
        let mut second = padded(name).to_vec();
        second.extend(self.words(&[month, day, year, flag, 1]));
        second
    }

    /// `name, 170, 170`.
    pub fn sentinel_record(&self, name: &str) -> Vec<u8> {
        let mut record = padded(name).to_vec();
        record.extend(self.words(&[170, 170]));
        record
    }

    pub fn gpl_table(self, records: &[&[u8]]) -> Self {
        let ident = self.words(&[1, 2, 3]);
        self.table_name("GPL")
            .marker(-1)
            .record(&ident)
            .subtables_from(-2, records)
    }

    /// `[n, 1, 1] [m] (m * 4 + 12 bytes)` for -3..=-8, closed with `[-9, 1, 0, 0]`.
    pub fn counted_span_table(mut self, name: &str, counts: [i32; 6]) -> Self {
        self = self.table_start(name, &padded(name));
        for (i, &count) in counts.iter().enumerate() {
            let span = vec![0xA5u8; (count * 4 + 12) as usize];
            self = self.markers(&[-3 - i as i32, 1, 1]).marker(count).raw(&span);
        }
        self.markers(&[-9, 1, 0, 0])
    }

    pub fn sdf_table(self, name: &str, payload: &[u8]) -> Self {
        let second = self.sentinel_record(name);
        self.table_start(name, &second)
            .markers(&[-3, 1, 1])
            .marker((payload.len() / 4) as i32)
            .block(payload)
            .markers(&[-4, 1, 0, 0])
    }

    pub fn fol_table(self, value: f32, records: &[&[u8]]) -> Self {
        let mut second = padded("FOL").to_vec();
        second.extend(self.f32s(&[value]));
        self.table_start("FOL", &second).subtables(records)
    }

    /// KELM with the fixed runs at -3..-8, `tail` cadence subtables from -9.
    pub fn kelm_table(mut self, tail: usize) -> Self {
        let second = self.sentinel_record("KELM");
        let chunk = [0u8; 8];
        self = self.table_start("KELM", &second);
        for index in [-3, -4] {
            self = self.markers(&[index, 1, 1]);
            for _ in 0..17 {
                self = self.marker(2).block(&chunk);
            }
            self = self.marker(4).block(&chunk);
            for _ in 0..7 {
                self = self.marker(2).block(&chunk);
            }
        }
        self = self.markers(&[-5, 1, 1]).marker(600).block(&chunk);
        self = self.markers(&[-6, 1, 1]);
        for value in [188, 14, 16, 18, 84, 6] {
            self = self.marker(value).block(&chunk);
        }
        self = self.markers(&[-7, 1, 1]).marker(342).block(&chunk);
        self = self
            .markers(&[-8, 1, 1])
            .marker(17)
            .block(&chunk)
            .marker(2)
            .block(&chunk)
            .marker(6)
            .block(&chunk);

        let mut index = -9;
        for _ in 0..tail {
            self = self
                .markers(&[index, 1, 1])
                .marker(4)
                .block(&chunk)
                .marker(8)
                .block(&chunk);
            index -= 1;
        }
        self.markers(&[index, 1, 0, 0])
    }

    /// A matrix table. Each column is a list of `(row, f32 values)` strings.
    pub fn matrix_f32(mut self, name: &str, header: [i32; 7], columns: &[Vec<(i32, Vec<f32>)>]) -> Self {
        let first = self.words(&header);
        let second = self.sentinel_record(name);
        self = self
            .table_name(name)
            .marker(-1)
            .record(&first)
            .markers(&[-2, 1, 0])
            .record(&second);
        let mut index = -3;
        for column in columns {
            self = self.markers(&[index, 1, 1]);
            for (row, values) in column {
                let mut string = self.words(&[*row]);
                string.extend(self.f32s(values));
                self = self.marker(values.len() as i32).block(&string);
            }
            index -= 1;
        }
        self.markers(&[index, 1, 0, 0])
    }

    pub fn end(self) -> Self {
        self.marker(0)
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }

    pub fn cursor(self) -> Cursor<Vec<u8>> {
        Cursor::new(self.bytes)
    }
}

impl Default for StreamBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A name blank-padded to the 8-byte field.
pub fn padded(name: &str) -> [u8; 8] {
    let mut field = [b' '; 8];
    for (slot, byte) in field.iter_mut().zip(name.bytes()) {
        *slot = byte;
    }
    field
}

fn encode_i32(value: i32, endian: Endian) -> [u8; 4] {
    match endian {
        Endian::Little => value.to_le_bytes(),
        Endian::Big => value.to_be_bytes(),
    }
}
