//! # bdp-pile
//!
//! Collects a disc's titles into a [`Pile`].
//!
//! A build walks a [`NavigationSource`](bdp_nav::NavigationSource) and stages
//! every selected (playlist, angle) in pooled linked lists: one pool each for
//! titles, clips and streams. Streams come from a
//! [`StreamProber`](bdp_nav::StreamProber) and pick up language tags from the
//! first clip's stream tables. Once the walk is done the staged records are
//! counted, one block is charged for all of them, and everything is copied
//! across with each title's streams in canonical order. Staging memory is
//! returned on success and on every failure path.

pub mod builder;
mod flatten;
pub mod merge;
pub mod order;
pub mod pile;
pub mod selection;
mod staging;

pub use builder::{build, PileBuilder};
pub use pile::{Clip, Pile, Stream, Title, TitleView};
pub use selection::Selection;
