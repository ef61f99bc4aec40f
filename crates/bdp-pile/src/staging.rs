//! Pooled linked lists holding titles while the disc is walked.
//!
//! Titles, clips and streams each come from their own [`Pool`]; every record
//! carries the handle of the next one. Nothing here is freed record by
//! record: dropping the [`Staging`] returns the pools' chunks, and the
//! chapter buffers still owned by staged titles, in one go.

use bdp_core::Result;
use bdp_pool::{AccountedVec, Pool, SharedBackend, SlotHandle};

use crate::pile::{Clip, Stream};

/// Head and tail of one singly linked chain.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Chain {
    pub(crate) head: Option<SlotHandle>,
    tail: Option<SlotHandle>,
    pub(crate) len: usize,
}

#[derive(Debug)]
pub(crate) struct StagedTitle {
    pub(crate) playlist: u32,
    pub(crate) angle: u8,
    pub(crate) angle_count: u8,
    pub(crate) duration: u64,
    pub(crate) clips: Chain,
    pub(crate) streams: Chain,
    pub(crate) chapters: Option<AccountedVec<u64>>,
    pub(crate) next: Option<SlotHandle>,
}

#[derive(Debug)]
pub(crate) struct StagedClip {
    pub(crate) clip: Clip,
    pub(crate) next: Option<SlotHandle>,
}

#[derive(Debug)]
pub(crate) struct StagedStream {
    pub(crate) stream: Stream,
    pub(crate) next: Option<SlotHandle>,
}

/// Fixed fields of a title being staged.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TitleHead {
    pub(crate) playlist: u32,
    pub(crate) angle: u8,
    pub(crate) angle_count: u8,
    pub(crate) duration: u64,
}

/// Staged titles in discovery order, plus running totals for flattening.
#[derive(Debug)]
pub(crate) struct Staging {
    backend: SharedBackend,
    pub(crate) titles: Pool<StagedTitle>,
    pub(crate) clips: Pool<StagedClip>,
    pub(crate) streams: Pool<StagedStream>,
    pub(crate) title_chain: Chain,
    pub(crate) clip_total: usize,
    pub(crate) stream_total: usize,
    pub(crate) chapter_total: usize,
}

impl Staging {
    pub(crate) fn new(chunk_objects: usize, backend: &SharedBackend) -> Result<Self> {
        Ok(Self {
            backend: backend.clone(),
            titles: Pool::with_backend(chunk_objects, backend.clone())?,
            clips: Pool::with_backend(chunk_objects, backend.clone())?,
            streams: Pool::with_backend(chunk_objects, backend.clone())?,
            title_chain: Chain::default(),
            clip_total: 0,
            stream_total: 0,
            chapter_total: 0,
        })
    }

    pub(crate) fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    pub(crate) fn title_count(&self) -> usize {
        self.title_chain.len
    }

    /// Append a title with no clips, streams or chapters yet.
    pub(crate) fn begin_title(&mut self, head: TitleHead) -> Result<SlotHandle> {
        let h = self.titles.allocate(StagedTitle {
            playlist: head.playlist,
            angle: head.angle,
            angle_count: head.angle_count,
            duration: head.duration,
            clips: Chain::default(),
            streams: Chain::default(),
            chapters: None,
            next: None,
        })?;
        if let Some(tail) = self.title_chain.tail {
            self.title_mut(tail)?.next = Some(h);
        } else {
            self.title_chain.head = Some(h);
        }
        self.title_chain.tail = Some(h);
        self.title_chain.len += 1;
        Ok(h)
    }

    pub(crate) fn push_clip(&mut self, title: SlotHandle, clip: Clip) -> Result<()> {
        let h = self.clips.allocate(StagedClip { clip, next: None })?;
        let prev = self.title(title)?.clips.tail;
        if let Some(tail) = prev {
            self.clips.get_mut(tail).ok_or(bdp_core::Error::NotOwned)?.next = Some(h);
        }
        link(&mut self.title_mut(title)?.clips, h);
        self.clip_total += 1;
        Ok(())
    }

    pub(crate) fn push_stream(&mut self, title: SlotHandle, stream: Stream) -> Result<()> {
        let h = self.streams.allocate(StagedStream { stream, next: None })?;
        let prev = self.title(title)?.streams.tail;
        if let Some(tail) = prev {
            self.streams.get_mut(tail).ok_or(bdp_core::Error::NotOwned)?.next = Some(h);
        }
        link(&mut self.title_mut(title)?.streams, h);
        self.stream_total += 1;
        Ok(())
    }

    /// Copy the chapter starts into a buffer owned by the staged title.
    pub(crate) fn set_chapters<I>(&mut self, title: SlotHandle, starts: I) -> Result<()>
    where
        I: ExactSizeIterator<Item = u64>,
    {
        let buf = AccountedVec::from_exact_iter(&self.backend, starts)?;
        let n = buf.len();
        let old = self.title_mut(title)?.chapters.replace(buf);
        self.chapter_total = self.chapter_total + n - old.map_or(0, |c| c.len());
        Ok(())
    }

    /// Apply `f` to each staged stream of `title`, in staging order.
    pub(crate) fn for_each_stream_mut<F>(&mut self, title: SlotHandle, mut f: F) -> Result<()>
    where
        F: FnMut(&mut Stream),
    {
        let mut cur = self.title(title)?.streams.head;
        while let Some(h) = cur {
            let node = self.streams.get_mut(h).ok_or(bdp_core::Error::NotOwned)?;
            f(&mut node.stream);
            cur = node.next;
        }
        Ok(())
    }

    pub(crate) fn title(&self, h: SlotHandle) -> Result<&StagedTitle> {
        self.titles.get(h).ok_or(bdp_core::Error::NotOwned)
    }

    pub(crate) fn title_mut(&mut self, h: SlotHandle) -> Result<&mut StagedTitle> {
        self.titles.get_mut(h).ok_or(bdp_core::Error::NotOwned)
    }

    /// Return every pool chunk. Records still in the pools are dropped with
    /// their chunks.
    pub(crate) fn destroy(self) {
        self.titles.destroy();
        self.clips.destroy();
        self.streams.destroy();
    }
}

fn link(chain: &mut Chain, h: SlotHandle) {
    if chain.head.is_none() {
        chain.head = Some(h);
    }
    chain.tail = Some(h);
    chain.len += 1;
}
