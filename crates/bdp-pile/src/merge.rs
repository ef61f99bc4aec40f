//! Copying language tags from a clip's stream tables onto probed streams.

use bdp_nav::{ClipDescriptor, StreamDescriptor};

use crate::pile::Stream;

/// Tag `stream` from one stream table.
///
/// The first entry with the stream's PID decides: its language is copied if
/// it has one, and later entries with the same PID are ignored.
pub fn merge_from_table(stream: &mut Stream, table: &[StreamDescriptor]) {
    if let Some(entry) = table.iter().find(|d| d.pid == stream.id) {
        if !entry.lang.is_undetermined() {
            stream.lang = entry.lang;
        }
    }
}

/// Tag `stream` from the video, audio and subtitle tables of `clip`, in
/// that order.
pub fn merge_from_clip(stream: &mut Stream, clip: &ClipDescriptor) {
    for table in clip.tagged_streams() {
        merge_from_table(stream, table);
    }
}
