//! Ledger state machine (Empty / Loaded) with snapshot undo.

mod session;

pub use session::*;
