//! Compacting staged titles into a [`Pile`].

use bdp_core::{Error, Result};
use bdp_nav::ClipNameTable;
use bdp_pool::SlotHandle;

use crate::order::sort_streams;
use crate::pile::{Pile, PileBlock, Title};
use crate::staging::Staging;

/// Copy every staged title, in discovery order, into one block.
///
/// Chapter buffers are freed as soon as they are copied. On failure the
/// partially filled block is freed and the staging (with any chapter buffers
/// not yet copied) is dropped by the caller's unwinding.
pub(crate) fn flatten(mut staging: Staging, clip_names: Option<ClipNameTable>) -> Result<Pile> {
    let mut block = PileBlock::allocate(
        staging.backend(),
        staging.title_count(),
        staging.clip_total,
        staging.stream_total,
        staging.chapter_total,
    )?;

    let mut cur = staging.title_chain.head;
    while let Some(h) = cur {
        cur = copy_title(&mut staging, &mut block, h)?;
    }

    debug_assert_eq!(block.titles.len(), staging.title_count());
    debug_assert_eq!(block.clips.len(), staging.clip_total);
    debug_assert_eq!(block.streams.len(), staging.stream_total);
    debug_assert_eq!(block.chapters.len(), staging.chapter_total);

    staging.destroy();
    Ok(Pile::new(block, clip_names))
}

/// Append one staged title to `block`; returns the next title's handle.
fn copy_title(
    staging: &mut Staging,
    block: &mut PileBlock,
    h: SlotHandle,
) -> Result<Option<SlotHandle>> {
    let title = staging.title(h)?;
    let (clip_head, stream_head, next) = (title.clips.head, title.streams.head, title.next);

    let clips_start = block.clips.len();
    let mut c = clip_head;
    while let Some(ch) = c {
        let node = staging.clips.get(ch).ok_or(Error::NotOwned)?;
        block.clips.push(node.clip);
        c = node.next;
    }

    let streams_start = block.streams.len();
    let mut s = stream_head;
    while let Some(sh) = s {
        let node = staging.streams.get(sh).ok_or(Error::NotOwned)?;
        block.streams.push(node.stream);
        s = node.next;
    }
    sort_streams(&mut block.streams[streams_start..]);

    let title = staging.title_mut(h)?;
    let chapters_start = block.chapters.len();
    if let Some(chapters) = title.chapters.take() {
        block.chapters.extend_from_slice(&chapters);
    }

    block.titles.push(Title {
        playlist: title.playlist,
        angle: title.angle,
        angle_count: title.angle_count,
        duration: title.duration,
        clips: clips_start..block.clips.len(),
        streams: streams_start..block.streams.len(),
        chapters: chapters_start..block.chapters.len(),
    });
    Ok(next)
}
