//! The OP2 container format.
//!
//! An OP2 file is a Fortran unformatted sequential file: every write is a
//! block framed by its own length, and the producer frames each logical
//! record with one-word marker blocks.
//!
//! # File Structure
//! ```text
//! +------------------------------+
//! | file header (optional)       |  [3] date  [7] tape code  label  [-1] [0]
//! +------------------------------+
//! | table                        |  name  [-1] rec  [-2,1,0] rec
//! |                              |  [-3,1,0] rec  [-4,1,0] rec ...  [0]
//! +------------------------------+
//! | table ...                    |
//! +------------------------------+
//! | [0]                          |  end of stream
//! +------------------------------+
//! ```
//!
//! # Framing
//! ```text
//! marker:  [4] [n] [4]
//! block:   [len] payload (len bytes) [len]
//! record:  [n] block  [m] block ...     (continuation while the next marker > 0)
//! ```

pub mod framing;
pub mod header;
pub mod matrix;
pub mod special;
pub mod subtables;
pub mod table_name;
pub mod tables;
