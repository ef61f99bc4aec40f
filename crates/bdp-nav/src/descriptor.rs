//! Title descriptors handed out by a [`NavigationSource`](crate::NavigationSource).
//!
//! These mirror what a disc navigation library reports for one playlist and
//! angle. Ticks are 90 kHz throughout.

use bdp_core::LanguageCode;
use serde::{Deserialize, Serialize};

/// One stream entry of a clip's stream number table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// MPEG-TS packet identifier; matches [`ElementaryStream::id`](crate::ElementaryStream::id).
    pub pid: u16,
    /// Blu-ray stream coding type (0x1b = H.264, 0x80 = LPCM, 0x90 = PGS, ...).
    #[serde(default)]
    pub coding_type: u8,
    #[serde(default)]
    pub lang: LanguageCode,
}

/// One clip of a title, with its per-kind stream tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipDescriptor {
    /// Clip information file number, e.g. `"00001"`.
    pub clip_id: String,
    /// Start of the clip on the title timeline.
    pub start_time: u64,
    pub in_time: u64,
    pub out_time: u64,
    pub video_streams: Vec<StreamDescriptor>,
    pub sec_video_streams: Vec<StreamDescriptor>,
    pub audio_streams: Vec<StreamDescriptor>,
    pub sec_audio_streams: Vec<StreamDescriptor>,
    /// Presentation graphics (subtitle) streams.
    pub pg_streams: Vec<StreamDescriptor>,
    /// Interactive graphics (menu) streams.
    pub ig_streams: Vec<StreamDescriptor>,
}

impl ClipDescriptor {
    /// The tables language tags are recovered from, in lookup order.
    pub fn tagged_streams(&self) -> [&[StreamDescriptor]; 3] {
        [&self.video_streams, &self.audio_streams, &self.pg_streams]
    }
}

/// A chapter mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterDescriptor {
    pub start: u64,
    #[serde(default)]
    pub duration: u64,
}

/// Everything the navigation source knows about one (playlist, angle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleDescriptor {
    /// Playlist number (`00042.mpls` is 42).
    pub playlist: u32,
    #[serde(default = "one")]
    pub angle_count: u8,
    pub duration: u64,
    #[serde(default)]
    pub clips: Vec<ClipDescriptor>,
    #[serde(default)]
    pub chapters: Vec<ChapterDescriptor>,
}

fn one() -> u8 {
    1
}

impl TitleDescriptor {
    /// Chapter start ticks in timeline order.
    pub fn chapter_starts(&self) -> impl ExactSizeIterator<Item = u64> + '_ {
        self.chapters.iter().map(|c| c.start)
    }
}
