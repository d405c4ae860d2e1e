//! Pagination module
//!
//! Reads a source table in bounded chunks.
//!
//! # Overview
//!
//! [`BatchSource`] is the read capability (`LIMIT n OFFSET m` semantics).
//! [`Extractor`] drives it: offset starts at 0, advances by the chunk size on
//! every call, and stops at the first empty page.

mod extractor;
mod memory;
mod types;

pub use extractor::Extractor;
pub use memory::MemorySource;
pub use types::{BatchSource, PaginationState};

#[cfg(test)]
mod tests;
