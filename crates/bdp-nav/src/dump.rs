//! A navigation source backed by a JSON disc dump.
//!
//! A dump records what a navigation library reported for a disc: every
//! playlist with its clips, stream tables and chapters, plus the demuxer's
//! view of each playlist's elementary streams. The dump itself is the
//! [`NavigationSource`]; [`DiscDump::streams`] splits off its
//! [`StreamProber`] so both can be used side by side.
//!
//! ```json
//! {
//!   "titles": [
//!     {
//!       "playlist": 1,
//!       "angle_count": 1,
//!       "duration": 180000,
//!       "clips": [{"clip_id": "00001", "audio_streams": [{"pid": 4352, "lang": "eng"}]}],
//!       "chapters": [{"start": 0}, {"start": 90000}],
//!       "streams": [{"id": 4352, "media_type": "audio", "codec_name": "ac3"}]
//!     }
//!   ]
//! }
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};

use bdp_core::{secs_to_ticks, Error, Result};
use serde::{Deserialize, Serialize};

use crate::descriptor::TitleDescriptor;
use crate::prober::{ElementaryStream, StreamProber};
use crate::source::{NavigationSource, TitleFilter};

/// One playlist of a dump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpTitle {
    #[serde(flatten)]
    pub title: TitleDescriptor,
    /// Replays the clips of an earlier playlist.
    #[serde(default)]
    pub duplicate: bool,
    /// Demuxer streams of this playlist.
    #[serde(default)]
    pub streams: Vec<ElementaryStream>,
}

/// JSON disc dump with navigation state.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DiscDump {
    pub titles: Vec<DumpTitle>,
    #[serde(skip)]
    root: Option<PathBuf>,
    #[serde(skip)]
    counted: Vec<usize>,
    #[serde(skip)]
    current: Option<usize>,
    #[serde(skip)]
    open_clip: Option<File>,
    #[serde(skip)]
    outstanding: usize,
}

impl DiscDump {
    pub fn new(titles: Vec<DumpTitle>) -> Self {
        Self {
            titles,
            ..Self::default()
        }
    }

    /// Parse a dump from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::source(format!("disc dump parse error: {e}")))
    }

    /// Read and parse a dump file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let dump = Self::from_json(&json)?;
        tracing::debug!(
            path = %path.display(),
            titles = dump.titles.len(),
            "Loaded disc dump"
        );
        Ok(dump)
    }

    /// Attach the disc directory. Seeking then opens the clip file under
    /// `BDMV/STREAM` that holds the new position, as a disc reader would.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Descriptors handed out and not yet released.
    pub fn outstanding_descriptors(&self) -> usize {
        self.outstanding
    }

    fn find_playlist(&self, playlist: u32) -> Option<usize> {
        self.titles.iter().position(|t| t.title.playlist == playlist)
    }

    fn hand_out(&mut self, idx: usize, angle: u8) -> Option<TitleDescriptor> {
        let title = &self.titles.get(idx)?.title;
        if angle >= title.angle_count {
            return None;
        }
        self.outstanding += 1;
        Some(title.clone())
    }
}

impl NavigationSource for DiscDump {
    fn name(&self) -> &'static str {
        "dump"
    }

    fn title_count(&mut self, filter: TitleFilter, min_duration_secs: u32) -> u32 {
        let min = secs_to_ticks(min_duration_secs);
        self.counted = self
            .titles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.title.duration >= min)
            .filter(|(_, t)| !(filter == TitleFilter::FilterDuplicates && t.duplicate))
            .map(|(i, _)| i)
            .collect();
        tracing::debug!(?filter, min_duration_secs, count = self.counted.len(), "Counted titles");
        self.counted.len() as u32
    }

    fn title_info(&mut self, index: u32, angle: u8) -> Option<TitleDescriptor> {
        let idx = *self.counted.get(index as usize)?;
        self.hand_out(idx, angle)
    }

    fn playlist_info(&mut self, playlist: u32, angle: u8) -> Option<TitleDescriptor> {
        let idx = self.find_playlist(playlist)?;
        self.hand_out(idx, angle)
    }

    fn select_title(&mut self, playlist: u32, angle: u8) -> bool {
        self.open_clip = None;
        match self.find_playlist(playlist) {
            Some(idx) if angle < self.titles[idx].title.angle_count => {
                self.current = Some(idx);
                true
            }
            _ => {
                self.current = None;
                false
            }
        }
    }

    fn seek_time(&mut self, ticks: u64) {
        let (Some(root), Some(idx)) = (&self.root, self.current) else {
            return;
        };
        let clip = self.titles[idx]
            .title
            .clips
            .iter()
            .filter(|c| c.start_time <= ticks)
            .last();
        self.open_clip = clip.and_then(|c| {
            let path = root
                .join("BDMV")
                .join("STREAM")
                .join(format!("{}.m2ts", c.clip_id));
            match File::open(&path) {
                Ok(f) => Some(f),
                Err(e) => {
                    tracing::trace!(path = %path.display(), "Cannot open clip: {e}");
                    None
                }
            }
        });
    }

    fn release_descriptor(&mut self, _descriptor: TitleDescriptor) {
        self.outstanding = self.outstanding.saturating_sub(1);
    }
}

/// The demuxer half of a [`DiscDump`].
#[derive(Debug, Clone, Default)]
pub struct DumpStreams {
    titles: Vec<(u32, u8, Vec<ElementaryStream>)>,
}

impl DiscDump {
    /// Copy out the per-playlist streams as a prober.
    pub fn streams(&self) -> DumpStreams {
        DumpStreams {
            titles: self
                .titles
                .iter()
                .map(|t| (t.title.playlist, t.title.angle_count, t.streams.clone()))
                .collect(),
        }
    }
}

impl StreamProber for DumpStreams {
    fn name(&self) -> &'static str {
        "dump"
    }

    fn probe_title(&self, playlist: u32, angle: u8) -> Result<Vec<ElementaryStream>> {
        let (_, angle_count, streams) = self
            .titles
            .iter()
            .find(|(p, _, _)| *p == playlist)
            .ok_or_else(|| Error::source(format!("playlist {playlist:05}.mpls not in dump")))?;
        if angle >= *angle_count {
            return Err(Error::source(format!(
                "playlist {playlist:05}.mpls has no angle {angle}"
            )));
        }
        Ok(streams.clone())
    }
}
