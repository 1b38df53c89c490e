//! Quire domain logic.
//!
//! Pure, storage-agnostic wiki engine: the ordering chain over a wiki's
//! pages, the block splitter, the sanitizing patch merger, title resolution
//! and the page lifecycle operations built on them. Everything operates on a
//! [`session::WikiSession`] that the persistence layer loads and writes back
//! inside one transaction.

pub mod access;
pub mod blocks;
pub mod chain;
pub mod error;
pub mod lifecycle;
pub mod patch;
pub mod sanitize;
pub mod session;
pub mod title;
pub mod types;
pub mod wiki;
