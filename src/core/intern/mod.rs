//! Deduplication of creators, tags and field values

pub mod interner;

pub use interner::{InternStats, ValueInterner};
