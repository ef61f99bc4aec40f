//! The [`NavigationSource`] trait: title enumeration over a disc.

use bdp_core::Result;
use serde::{Deserialize, Serialize};

use crate::descriptor::TitleDescriptor;

/// Duplicate-filter policy applied when counting titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleFilter {
    /// Every playlist long enough.
    All,
    /// Drop playlists that replay the same clips as an earlier one.
    #[default]
    FilterDuplicates,
}

/// A stateful disc navigation handle.
///
/// Sources are single-threaded: they keep a current title, angle and
/// playback position, so one handle must not be shared between builds.
pub trait NavigationSource {
    /// Human-readable name identifying this source implementation.
    fn name(&self) -> &'static str;

    /// Count titles of at least `min_duration_secs`, applying `filter`.
    ///
    /// Also fixes the list that [`NavigationSource::title_info`] indexes.
    fn title_count(&mut self, filter: TitleFilter, min_duration_secs: u32) -> u32;

    /// Descriptor of the `index`th counted title at `angle`.
    fn title_info(&mut self, index: u32, angle: u8) -> Option<TitleDescriptor>;

    /// Descriptor of a playlist at `angle`, bypassing the counted list.
    fn playlist_info(&mut self, playlist: u32, angle: u8) -> Option<TitleDescriptor>;

    /// Make `playlist`/`angle` the current title. Returns `false` if the
    /// source cannot play it.
    fn select_title(&mut self, playlist: u32, angle: u8) -> bool;

    /// Move the playback position of the current title.
    fn seek_time(&mut self, ticks: u64);

    /// Give back a descriptor obtained from this source.
    fn release_descriptor(&mut self, descriptor: TitleDescriptor);
}

/// Run `f` on `descriptor`, then release it back to `source`.
///
/// The descriptor is released exactly once whether `f` succeeds or fails.
pub fn with_descriptor<S, R, F>(source: &mut S, descriptor: TitleDescriptor, f: F) -> Result<R>
where
    S: NavigationSource + ?Sized,
    F: FnOnce(&mut S, &TitleDescriptor) -> Result<R>,
{
    let result = f(source, &descriptor);
    source.release_descriptor(descriptor);
    result
}
