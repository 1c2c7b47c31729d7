//! Low-level byte decoding utilities

use encoding_rs::WINDOWS_1252;

use super::types::error::{Op2Error, Result};
use super::types::models::Endian;

/// Splits a record into 32-bit signed words.
///
/// Fails if the record length is not a multiple of four.
pub fn read_words(data: &[u8], endian: Endian) -> Result<Vec<i32>> {
    if data.len() % 4 != 0 {
        return Err(Op2Error::InvalidFormat(format!(
            "Record of {} bytes is not a whole number of words",
            data.len()
        )));
    }
    Ok(data.chunks_exact(4).map(|word| endian.read_i32(word)).collect())
}

/// Decodes a fixed-width text field, dropping trailing blanks and NULs.
///
/// OP2 text is ASCII in practice; anything outside it is decoded as
/// Windows-1252 so no byte is ever rejected.
pub fn decode_text(data: &[u8]) -> String {
    let (text, _, _) = WINDOWS_1252.decode(data);
    text.trim_end_matches([' ', '\0']).to_string()
}

/// Hex rendering of at most `limit` leading bytes, for trace output.
pub fn hex_preview(data: &[u8], limit: usize) -> String {
    if data.len() <= limit {
        hex::encode(data)
    } else {
        format!("{}..(+{} bytes)", hex::encode(&data[..limit]), data.len() - limit)
    }
}
