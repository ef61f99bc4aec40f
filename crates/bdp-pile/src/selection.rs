//! Which titles a build collects.

use std::fmt;

use bdp_core::config::SelectionConfig;
use bdp_nav::TitleFilter;

/// Title selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Every counted title of at least `min_secs`, every angle.
    ByDuration { min_secs: u32, filter: TitleFilter },
    /// One playlist; every angle unless `angle` names one.
    ByPlaylist { id: u32, angle: Option<u8> },
}

impl Selection {
    /// Every title, duplicates included.
    pub fn all() -> Self {
        Self::ByDuration {
            min_secs: 0,
            filter: TitleFilter::All,
        }
    }

    pub fn playlist(id: u32) -> Self {
        Self::ByPlaylist { id, angle: None }
    }

    pub fn playlist_angle(id: u32, angle: u8) -> Self {
        Self::ByPlaylist {
            id,
            angle: Some(angle),
        }
    }

    /// Duration selection from configuration defaults.
    pub fn from_config(cfg: &SelectionConfig) -> Self {
        Self::ByDuration {
            min_secs: cfg.min_duration_secs,
            filter: if cfg.filter_duplicates {
                TitleFilter::FilterDuplicates
            } else {
                TitleFilter::All
            },
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByDuration { min_secs, filter } => {
                write!(f, "titles >= {min_secs}s ({filter:?})")
            }
            Self::ByPlaylist { id, angle: None } => write!(f, "{id:05}.mpls, every angle"),
            Self::ByPlaylist {
                id,
                angle: Some(a),
            } => write!(f, "{id:05}.mpls angle {a}"),
        }
    }
}
