//! Core OP2 reader module.
//!
//! Layers, leaves first:
//!
//! ```text
//! ByteCursor -> RecordFramer -> table name -> DispatchSession
//!                                                  |
//!                      +------------+--------------+-------------+
//!                      |            |              |             |
//!                 geometry skip  subtable walk  special      matrix
//!                                  + decoders   handlers     reader
//! ```

pub mod cursor;
pub mod decoder;
pub mod dispatch;
pub mod format;
pub mod iter;
pub mod reader;
pub mod trace;
pub mod types;
mod utils;

pub use reader::{Op2Reader, ReaderOptions};
pub use types::error::{Op2Error, ParseError, Result};
pub use types::models;
