//! The compacted result of a build.

use std::ops::{Deref, Range};

use bdp_core::{CodecHint, LanguageCode, StreamKind};
use bdp_nav::{ClipNameId, ClipNameTable};
use bdp_pool::{try_vec, AllocError, Reservation, SharedBackend};
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// One elementary stream of a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Stream {
    /// Position in the demuxer's stream list.
    pub index: u16,
    /// Transport stream PID.
    pub id: u16,
    pub kind: StreamKind,
    pub codec: CodecHint,
    /// Empty when undetermined.
    pub lang: LanguageCode,
}

/// One clip of a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Clip {
    /// Entry in the pile's clip name table, if the file was identified.
    pub name: Option<ClipNameId>,
}

/// One (playlist, angle) of the disc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    pub playlist: u32,
    pub angle: u8,
    pub angle_count: u8,
    /// Ticks.
    pub duration: u64,
    pub(crate) clips: Range<usize>,
    pub(crate) streams: Range<usize>,
    pub(crate) chapters: Range<usize>,
}

impl Title {
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// Where this title's clips sit in the pile's clip section.
    pub fn clip_range(&self) -> Range<usize> {
        self.clips.clone()
    }

    pub fn stream_range(&self) -> Range<usize> {
        self.streams.clone()
    }

    pub fn chapter_range(&self) -> Range<usize> {
        self.chapters.clone()
    }
}

/// The single allocation holding every section of a pile.
#[derive(Debug)]
pub(crate) struct PileBlock {
    pub(crate) titles: Vec<Title>,
    pub(crate) clips: Vec<Clip>,
    pub(crate) streams: Vec<Stream>,
    pub(crate) chapters: Vec<u64>,
    reservation: Reservation,
}

impl PileBlock {
    /// Bytes needed for the given section sizes.
    pub(crate) fn bytes_for(
        titles: usize,
        clips: usize,
        streams: usize,
        chapters: usize,
    ) -> Option<usize> {
        use std::mem::size_of;
        let sections = [
            titles.checked_mul(size_of::<Title>())?,
            clips.checked_mul(size_of::<Clip>())?,
            streams.checked_mul(size_of::<Stream>())?,
            chapters.checked_mul(size_of::<u64>())?,
        ];
        sections
            .iter()
            .try_fold(size_of::<Pile>(), |acc, s| acc.checked_add(*s))
    }

    /// Charge one block to `backend` and reserve every section.
    pub(crate) fn allocate(
        backend: &SharedBackend,
        titles: usize,
        clips: usize,
        streams: usize,
        chapters: usize,
    ) -> Result<Self, AllocError> {
        let bytes = Self::bytes_for(titles, clips, streams, chapters).ok_or(
            AllocError::OutOfMemory {
                requested: usize::MAX,
            },
        )?;
        let reservation = Reservation::new(backend, bytes)?;
        Ok(Self {
            titles: try_vec(titles)?,
            clips: try_vec(clips)?,
            streams: try_vec(streams)?,
            chapters: try_vec(chapters)?,
            reservation,
        })
    }

    pub(crate) fn bytes(&self) -> usize {
        self.reservation.bytes()
    }
}

/// Every selected title with its clips, streams and chapters, compacted into
/// one read-only block.
///
/// Dropping the pile (or calling [`Pile::release`]) frees the block and the
/// clip name table together.
#[derive(Debug)]
pub struct Pile {
    block: PileBlock,
    clip_names: Option<ClipNameTable>,
}

impl Pile {
    pub(crate) fn new(block: PileBlock, clip_names: Option<ClipNameTable>) -> Self {
        Self { block, clip_names }
    }

    pub fn title_count(&self) -> usize {
        self.block.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.block.titles.is_empty()
    }

    /// Titles in discovery order.
    pub fn titles(&self) -> impl ExactSizeIterator<Item = TitleView<'_>> {
        self.block.titles.iter().map(move |title| TitleView { pile: self, title })
    }

    pub fn title(&self, index: usize) -> Option<TitleView<'_>> {
        self.block
            .titles
            .get(index)
            .map(|title| TitleView { pile: self, title })
    }

    /// Clips of every title, back to back.
    pub fn all_clips(&self) -> &[Clip] {
        &self.block.clips
    }

    pub fn all_streams(&self) -> &[Stream] {
        &self.block.streams
    }

    pub fn all_chapters(&self) -> &[u64] {
        &self.block.chapters
    }

    pub fn clip_names(&self) -> Option<&ClipNameTable> {
        self.clip_names.as_ref()
    }

    /// Size of the compacted block as charged to the memory backend.
    pub fn block_bytes(&self) -> usize {
        self.block.bytes()
    }

    /// Free the block and the clip name table.
    pub fn release(self) {
        tracing::trace!(titles = self.title_count(), "Releasing pile");
    }
}

/// A title together with the pile it lives in.
#[derive(Debug, Clone, Copy)]
pub struct TitleView<'a> {
    pile: &'a Pile,
    title: &'a Title,
}

impl<'a> TitleView<'a> {
    pub fn clips(&self) -> &'a [Clip] {
        &self.pile.block.clips[self.title.clips.clone()]
    }

    /// Streams ordered by kind, then demuxer index.
    pub fn streams(&self) -> &'a [Stream] {
        &self.pile.block.streams[self.title.streams.clone()]
    }

    /// Chapter start ticks.
    pub fn chapters(&self) -> &'a [u64] {
        &self.pile.block.chapters[self.title.chapters.clone()]
    }

    /// File name of `clip`, if it was identified.
    pub fn clip_name(&self, clip: &Clip) -> Option<&'a str> {
        let table = self.pile.clip_names.as_ref()?;
        table.name(clip.name?)
    }

    /// Streams of one kind, in order.
    pub fn streams_of(&self, kind: StreamKind) -> impl Iterator<Item = &'a Stream> {
        self.streams().iter().filter(move |s| s.kind == kind)
    }
}

impl Deref for TitleView<'_> {
    type Target = Title;

    fn deref(&self) -> &Title {
        self.title
    }
}

impl Serialize for TitleView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let clips: Vec<Option<&str>> = self.clips().iter().map(|c| self.clip_name(c)).collect();
        let mut s = serializer.serialize_struct("Title", 7)?;
        s.serialize_field("playlist", &self.playlist)?;
        s.serialize_field("angle", &self.angle)?;
        s.serialize_field("angle_count", &self.angle_count)?;
        s.serialize_field("duration", &self.duration)?;
        s.serialize_field("clips", &clips)?;
        s.serialize_field("streams", self.streams())?;
        s.serialize_field("chapters", self.chapters())?;
        s.end()
    }
}

impl Serialize for Pile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let titles: Vec<TitleView<'_>> = self.titles().collect();
        let mut s = serializer.serialize_struct("Pile", 2)?;
        s.serialize_field("title_count", &self.title_count())?;
        s.serialize_field("titles", &titles)?;
        s.end()
    }
}
