//! Utility functions for string formatting.

pub mod format;

pub use format::{format_optional, format_timestamp, short_hash, truncate_string};
