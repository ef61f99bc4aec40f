//! bdpile - Blu-ray title listing, chapter export and remuxing
//!
//! This library crate holds the command implementations so they can be
//! tested without spawning the binary.

pub mod chapters;
pub mod disc;
pub mod ffargs;
pub mod remux;
pub mod report;
