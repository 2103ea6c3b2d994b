//! Natural-language ledger edits

mod directive;
mod handler;

pub use directive::*;
pub use handler::*;
