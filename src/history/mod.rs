//! History module for ledger edits and persisted input.
//!
//! This module provides:
//! - `undo`: Snapshot stack enabling multi-level undo
//! - `store`: Persistence port for raw statement text and filename

mod store;
mod undo;

pub use store::*;
pub use undo::*;
