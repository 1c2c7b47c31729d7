//! # Table Dispatch
//!
//! The format has no table of contents: the only way to learn what a file
//! holds is to scan it table by table and recognize each name. This module
//! owns that scan.
//!
//! ```text
//!            +-------------------+
//!   begin -->| AwaitingTableName |<-----------------------+
//!            +-------------------+                        |
//!              |  name        | [0]                       | handler done,
//!              v              v                           | next name probed
//!     +--------------------+  +------+                    |
//!     | Dispatching(name)  |  | Done |                    |
//!     +--------------------+  +------+                    |
//!              |                                          |
//!              +--> geometry skip | special | result | matrix
//!              |
//!              +--> any error --> Failed
//! ```
//!
//! Names are routed through [`catalog::RoutingTable`]; unknown names go to the
//! matrix reader only when the caller listed them as additional matrices.

pub mod catalog;
pub mod session;

pub use catalog::{Route, RoutingTable, STANDARD_CATALOG};
pub use session::{AuditTrail, DispatchSession, SessionState};
