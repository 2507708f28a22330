//! File formats

pub mod wide;

pub use wide::{parse_wide, sniff_delimiter, write_wide, ImportError};
