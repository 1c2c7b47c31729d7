//! The contract between the framing core and result-table decoders.
//!
//! The core never interprets result payloads. For each result table it
//! builds a [`DecoderContext`] from the table's fixed leading records, then
//! hands every subtable record to the decoder registered for the table's
//! [`ResultFamily`]: odd subtables (`-3`, `-5`, ...) are headers, even ones
//! (`-4`, `-6`, ...) are payloads.

use std::collections::HashMap;

use super::types::error::Result;
use super::types::models::{ResultFamily, TableHeader};

/// Per-table state handed to a decoder.
#[derive(Debug, Clone)]
pub struct DecoderContext {
    /// The table's `-1`/`-2` records, parsed.
    pub header: TableHeader,
    /// Index of the subtable whose record is being delivered.
    pub subtable_index: i32,
    /// The most recent header record, which describes the payload that follows it.
    pub subtable_header: Vec<u8>,
    pub header_records: usize,
    pub payload_records: usize,
}

impl DecoderContext {
    pub fn new(header: TableHeader) -> Self {
        DecoderContext {
            header,
            subtable_index: 0,
            subtable_header: Vec::new(),
            header_records: 0,
            payload_records: 0,
        }
    }
}

/// A decoder for one family of result tables.
///
/// Implementations keep whatever state they need between calls; a decoder
/// instance is reused for every table of its family in a file, one table at
/// a time.
pub trait TableDecoder {
    /// The domain object produced per table.
    type Output;

    /// Receives one subtable header record.
    fn on_subtable_header(&mut self, ctx: &mut DecoderContext, record: &[u8]) -> Result<()>;

    /// Receives one payload record, described by `ctx.subtable_header`.
    fn on_payload_record(&mut self, ctx: &mut DecoderContext, record: &[u8]) -> Result<()>;

    /// Called once the table's end marker has been read.
    fn on_table_complete(&mut self, ctx: DecoderContext) -> Result<Option<Self::Output>>;
}

/// Decoders by result family. Families without a decoder are framed and
/// their payloads discarded.
pub struct DecoderRegistry<O> {
    decoders: HashMap<ResultFamily, Box<dyn TableDecoder<Output = O>>>,
}

impl<O> DecoderRegistry<O> {
    pub fn new() -> Self {
        DecoderRegistry {
            decoders: HashMap::new(),
        }
    }

    /// Registers `decoder` for `family`, returning any decoder it replaces.
    pub fn register<D>(&mut self, family: ResultFamily, decoder: D) -> Option<Box<dyn TableDecoder<Output = O>>>
    where
        D: TableDecoder<Output = O> + 'static,
    {
        self.decoders.insert(family, Box::new(decoder))
    }

    pub fn get_mut(&mut self, family: ResultFamily) -> Option<&mut (dyn TableDecoder<Output = O> + 'static)> {
        self.decoders.get_mut(&family).map(|decoder| decoder.as_mut())
    }

    pub fn contains(&self, family: ResultFamily) -> bool {
        self.decoders.contains_key(&family)
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl<O> Default for DecoderRegistry<O> {
    fn default() -> Self {
        Self::new()
    }
}
