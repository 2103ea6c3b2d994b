//! Shared data model for statements and ledger edits.

mod statement;

pub use statement::*;
