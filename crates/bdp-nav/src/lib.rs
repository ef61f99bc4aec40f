//! # bdp-nav
//!
//! The boundary between bdpile and a disc: what a navigation library tells
//! us about titles, what a demuxer tells us about their streams, and which
//! stream files back each clip.
//!
//! - [`NavigationSource`] enumerates titles and hands out [`TitleDescriptor`]s.
//! - [`StreamProber`] lists a title's elementary streams.
//! - [`DiscDump`] and [`DumpStreams`] implement them from a JSON
//!   description of a disc.
//! - [`FfprobeProber`] asks `ffprobe` through its libbluray input.
//! - [`ClipNameTable`] maps stream files to names via open descriptors.

pub mod clip_names;
pub mod command;
pub mod descriptor;
pub mod dump;
pub mod ffprobe;
pub mod prober;
pub mod source;
pub mod tools;

pub use clip_names::{ClipNameId, ClipNameTable};
pub use command::{ToolCommand, ToolOutput};
pub use descriptor::{ChapterDescriptor, ClipDescriptor, StreamDescriptor, TitleDescriptor};
pub use dump::{DiscDump, DumpStreams, DumpTitle};
pub use ffprobe::{bluray_url, FfprobeProber};
pub use prober::{ElementaryStream, StreamProber};
pub use source::{with_descriptor, NavigationSource, TitleFilter};
pub use tools::{ToolInfo, ToolRegistry};
