//! Opening a disc directory and picking titles from it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use bdp_core::config::Config;
use bdp_nav::{
    with_descriptor, DiscDump, FfprobeProber, NavigationSource, StreamProber, ToolRegistry,
};
use bdp_pile::{Pile, PileBuilder, Selection, TitleView};

use crate::chapters::{spans, ChapterSpan};

/// Name of the navigation dump looked for inside a disc directory.
pub const DEFAULT_DUMP_NAME: &str = "bdpile.json";

/// A `N[:A]` playlist selector from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaylistArg {
    pub playlist: u32,
    /// `None` selects every angle.
    pub angle: Option<u8>,
}

impl PlaylistArg {
    /// Every angle, or the named one.
    pub fn selection(&self) -> Selection {
        match self.angle {
            Some(a) => Selection::playlist_angle(self.playlist, a),
            None => Selection::playlist(self.playlist),
        }
    }

    /// One angle only; the first when none was named.
    pub fn single(&self) -> Selection {
        Selection::playlist_angle(self.playlist, self.angle.unwrap_or(0))
    }
}

/// Selections for repeated `-p` selectors, in playlist order.
///
/// A selector for every angle of a playlist absorbs the single-angle ones
/// naming the same playlist, and repeats are dropped.
pub fn playlist_selections(args: &[PlaylistArg]) -> Vec<Selection> {
    let mut args = args.to_vec();
    // `None` sorts before any angle, so a wildcard leads its playlist.
    args.sort_by_key(|a| (a.playlist, a.angle));
    args.dedup_by(|next, kept| {
        next.playlist == kept.playlist && (kept.angle.is_none() || next.angle == kept.angle)
    });
    args.iter().map(PlaylistArg::selection).collect()
}

impl FromStr for PlaylistArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || format!("invalid playlist '{s}', expected N or N:ANGLE");
        let (pl, angle) = match s.split_once(':') {
            Some((pl, a)) => {
                let a: u8 = a.parse().map_err(|_| invalid())?;
                // 255 is the "every angle" marker on disc.
                if a == u8::MAX {
                    return Err(format!("angle {a} is reserved"));
                }
                (pl, Some(a))
            }
            None => (s, None),
        };
        let playlist = pl.parse().map_err(|_| invalid())?;
        Ok(Self { playlist, angle })
    }
}

impl fmt::Display for PlaylistArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.angle {
            Some(a) => write!(f, "{}:{a}", self.playlist),
            None => write!(f, "{}", self.playlist),
        }
    }
}

/// A disc directory with its navigation dump and stream prober.
pub struct Disc {
    root: PathBuf,
    dump: DiscDump,
    prober: Box<dyn StreamProber>,
}

impl Disc {
    /// Open `root`, reading navigation from `dump` (default
    /// `<root>/bdpile.json`). Streams come from the dump unless `ffprobe` is
    /// set, in which case ffprobe reads them from the disc itself.
    pub fn open(root: &Path, dump: Option<&Path>, ffprobe: bool, config: &Config) -> Result<Self> {
        if !root.is_dir() {
            bail!("Disc directory does not exist: {}", root.display());
        }
        let dump_path = dump
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.join(DEFAULT_DUMP_NAME));
        let dump = DiscDump::load(&dump_path)
            .with_context(|| format!("cannot read navigation dump {}", dump_path.display()))?
            .with_root(root);

        let prober: Box<dyn StreamProber> = if ffprobe {
            let tools = ToolRegistry::discover(&config.tools);
            let path = tools.require("ffprobe")?;
            Box::new(FfprobeProber::new(path.to_path_buf(), root))
        } else {
            Box::new(dump.streams())
        };

        tracing::debug!(
            root = %root.display(),
            dump = %dump_path.display(),
            titles = dump.titles.len(),
            prober = prober.name(),
            "Opened disc"
        );
        Ok(Self {
            root: root.to_path_buf(),
            dump,
            prober,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build a pile with the `pile` settings of `config`.
    pub fn build(&mut self, selection: &Selection, config: &Config) -> Result<Pile> {
        self.build_all(std::slice::from_ref(selection), config)
    }

    /// Build one pile holding the titles of every selection.
    pub fn build_all(&mut self, selections: &[Selection], config: &Config) -> Result<Pile> {
        let mut builder = PileBuilder::from_config(&config.pile);
        if config.pile.clip_names {
            builder = builder.clip_names(&self.root);
        }
        let pile = builder
            .build_all(&mut self.dump, self.prober.as_ref(), selections)
            .with_context(|| {
                format!(
                    "cannot collect {} from {}",
                    describe(selections),
                    self.root.display()
                )
            })?;
        Ok(pile)
    }

    /// Chapters of `title` with their ends. Chapter lengths recorded in the
    /// navigation data take precedence over the next chapter's start.
    pub fn chapter_spans(&mut self, title: TitleView<'_>) -> Result<Vec<ChapterSpan>> {
        let durations = match self.dump.playlist_info(title.playlist, title.angle) {
            Some(d) => with_descriptor(&mut self.dump, d, |_, d| {
                Ok(d.chapters.iter().map(|c| c.duration).collect::<Vec<_>>())
            })?,
            None => Vec::new(),
        };
        Ok(spans(title.chapters(), &durations, title.duration))
    }
}

/// Human-readable list of selections.
pub fn describe(selections: &[Selection]) -> String {
    selections
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
