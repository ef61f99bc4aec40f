//! Walking a navigation source into a [`Pile`].

use std::path::PathBuf;

use bdp_core::config::{PileConfig, DEFAULT_CHUNK_OBJECTS};
use bdp_core::{Error, LanguageCode, Result};
use bdp_nav::{with_descriptor, ClipNameTable, NavigationSource, StreamProber, TitleDescriptor};
use bdp_pool::{system, SharedBackend};

use crate::flatten::flatten;
use crate::merge::merge_from_clip;
use crate::pile::{Clip, Pile, Stream};
use crate::selection::Selection;
use crate::staging::{Staging, TitleHead};

/// Build settings.
///
/// ```
/// use bdp_pile::{PileBuilder, Selection};
/// use bdp_nav::DiscDump;
///
/// let mut dump = DiscDump::from_json(r#"{"titles": []}"#).unwrap();
/// let prober = dump.streams();
/// let pile = PileBuilder::new()
///     .build(&mut dump, &prober, &Selection::all())
///     .unwrap();
/// assert_eq!(pile.title_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct PileBuilder {
    backend: SharedBackend,
    chunk_objects: usize,
    disc_root: Option<PathBuf>,
    fd_dir: PathBuf,
}

impl Default for PileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PileBuilder {
    /// System heap, default chunk size, no clip names.
    pub fn new() -> Self {
        Self {
            backend: system(),
            chunk_objects: DEFAULT_CHUNK_OBJECTS,
            disc_root: None,
            fd_dir: PathBuf::from("/proc/self/fd"),
        }
    }

    /// Settings from the `pile` config section. Clip names still need a
    /// disc root via [`PileBuilder::clip_names`].
    pub fn from_config(cfg: &PileConfig) -> Self {
        Self::new()
            .chunk_objects(cfg.effective_chunk_objects())
            .fd_dir(cfg.fd_dir.clone())
    }

    /// Charge every allocation of the build to `backend`.
    pub fn backend(mut self, backend: SharedBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn chunk_objects(mut self, n: usize) -> Self {
        self.chunk_objects = n;
        self
    }

    /// Recover clip file names by scanning `<disc_root>/BDMV/STREAM`.
    pub fn clip_names(mut self, disc_root: impl Into<PathBuf>) -> Self {
        self.disc_root = Some(disc_root.into());
        self
    }

    /// Directory listing this process's open descriptors.
    pub fn fd_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fd_dir = dir.into();
        self
    }

    /// Collect the titles named by `selection`.
    ///
    /// Any source, prober, allocation or descriptor-directory failure aborts
    /// the build; everything staged so far is freed and every descriptor
    /// obtained from `source` has been released. No qualifying titles is an
    /// empty pile, not an error.
    pub fn build<S, P>(&self, source: &mut S, prober: &P, selection: &Selection) -> Result<Pile>
    where
        S: NavigationSource + ?Sized,
        P: StreamProber + ?Sized,
    {
        self.build_all(source, prober, std::slice::from_ref(selection))
    }

    /// Collect the titles of every selection, in order, into one pile.
    ///
    /// A named angle the playlist does not have is a validation error.
    pub fn build_all<S, P>(
        &self,
        source: &mut S,
        prober: &P,
        selections: &[Selection],
    ) -> Result<Pile>
    where
        S: NavigationSource + ?Sized,
        P: StreamProber + ?Sized,
    {
        tracing::debug!(
            selections = selections.len(),
            source = source.name(),
            prober = prober.name(),
            "Building title pile"
        );

        let clip_names = self.disc_root.as_deref().and_then(ClipNameTable::scan);
        let mut run = Run {
            builder: self,
            prober,
            clip_names: clip_names.as_ref(),
            staging: Staging::new(self.chunk_objects, &self.backend)?,
        };

        for selection in selections {
            tracing::debug!(%selection, "Selecting titles");
            match *selection {
                Selection::ByDuration { min_secs, filter } => {
                    let n = source.title_count(filter, min_secs);
                    tracing::debug!(titles = n, "Source counted titles");
                    for t in 0..n {
                        run.stage_angles(source, None, |src, a| src.title_info(t, a), || {
                            format!("no info for title {t}")
                        })?;
                    }
                }
                Selection::ByPlaylist { id, angle } => {
                    if let Some(a) = angle {
                        check_angle(source, id, a)?;
                    }
                    run.stage_angles(source, angle, |src, a| src.playlist_info(id, a), || {
                        format!("no info for playlist {id:05}.mpls")
                    })?;
                }
            }
        }

        let staging = run.staging;
        let pile = flatten(staging, clip_names)?;
        tracing::info!(
            titles = pile.title_count(),
            clips = pile.all_clips().len(),
            streams = pile.all_streams().len(),
            chapters = pile.all_chapters().len(),
            bytes = pile.block_bytes(),
            "Built title pile"
        );
        Ok(pile)
    }
}

/// Fail unless playlist `id` has an angle `angle`.
fn check_angle<S>(source: &mut S, id: u32, angle: u8) -> Result<()>
where
    S: NavigationSource + ?Sized,
{
    let descriptor = source
        .playlist_info(id, 0)
        .ok_or_else(|| Error::source(format!("no info for playlist {id:05}.mpls")))?;
    let angle_count = with_descriptor(source, descriptor, |_, d| Ok(d.angle_count))?;
    if angle >= angle_count {
        return Err(Error::Validation(format!(
            "invalid angle {angle} for playlist {id:05}.mpls ({angle_count} angles)"
        )));
    }
    Ok(())
}

/// Build with default settings.
pub fn build<S, P>(source: &mut S, prober: &P, selection: &Selection) -> Result<Pile>
where
    S: NavigationSource + ?Sized,
    P: StreamProber + ?Sized,
{
    PileBuilder::new().build(source, prober, selection)
}

/// State of one build in progress.
struct Run<'a, P: ?Sized> {
    builder: &'a PileBuilder,
    prober: &'a P,
    clip_names: Option<&'a ClipNameTable>,
    staging: Staging,
}

impl<P: StreamProber + ?Sized> Run<'_, P> {
    /// Stage `angle`, or every angle from 0 up to the title's angle count.
    fn stage_angles<S, F, M>(
        &mut self,
        source: &mut S,
        angle: Option<u8>,
        mut fetch: F,
        missing: M,
    ) -> Result<()>
    where
        S: NavigationSource + ?Sized,
        F: FnMut(&mut S, u8) -> Option<TitleDescriptor>,
        M: Fn() -> String,
    {
        let mut a = angle.unwrap_or(0);
        loop {
            let descriptor = fetch(source, a)
                .ok_or_else(|| Error::source(format!("{} angle {a}", missing())))?;
            let angle_count =
                with_descriptor(source, descriptor, |src, d| self.stage_title(src, d, a))?;

            if angle.is_some() {
                return Ok(());
            }
            a = match a.checked_add(1) {
                Some(next) if next < angle_count => next,
                _ => return Ok(()),
            };
        }
    }

    /// Stage one descriptor; returns its angle count.
    fn stage_title<S>(&mut self, source: &mut S, d: &TitleDescriptor, angle: u8) -> Result<u8>
    where
        S: NavigationSource + ?Sized,
    {
        if !source.select_title(d.playlist, angle) {
            return Err(Error::source(format!(
                "cannot select playlist {:05}.mpls angle {angle}",
                d.playlist
            )));
        }

        let t = self.staging.begin_title(TitleHead {
            playlist: d.playlist,
            angle,
            angle_count: d.angle_count,
            duration: d.duration,
        })?;

        for clip in &d.clips {
            let name = match self.clip_names {
                Some(table) => {
                    source.seek_time(clip.start_time);
                    table.resolve_open_files(&self.builder.fd_dir)?
                }
                None => None,
            };
            self.staging.push_clip(t, Clip { name })?;
        }

        let probed = self.prober.probe_title(d.playlist, angle)?;
        for (i, es) in probed.iter().enumerate() {
            let index = u16::try_from(i)
                .map_err(|_| Error::source(format!("too many streams in {:05}.mpls", d.playlist)))?;
            self.staging.push_stream(
                t,
                Stream {
                    index,
                    id: es.id,
                    kind: es.kind(),
                    codec: es.codec_hint(),
                    lang: LanguageCode::UNDETERMINED,
                },
            )?;
        }

        if let Some(first) = d.clips.first() {
            self.staging
                .for_each_stream_mut(t, |s| merge_from_clip(s, first))?;
        }

        self.staging.set_chapters(t, d.chapter_starts())?;

        tracing::debug!(
            playlist = d.playlist,
            angle,
            clips = d.clips.len(),
            streams = probed.len(),
            chapters = d.chapters.len(),
            "Staged title"
        );
        Ok(d.angle_count)
    }
}
