//! bdp-core: shared error type, media-domain enums, language codes, tick
//! helpers and configuration.
//!
//! This crate is the foundational dependency for all other bdp-* crates.

pub mod config;
pub mod error;
pub mod language;
pub mod media;
pub mod time;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use language::LanguageCode;
pub use media::*;
pub use time::{secs_to_ticks, ticks_to_timestamp, TICKS_PER_SECOND};
