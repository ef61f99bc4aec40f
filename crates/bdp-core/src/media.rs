//! Media-domain enums for elementary streams.
//!
//! All enums serialize in lowercase (via `serde(rename_all = "lowercase")`) and
//! implement `Display` manually for consistent string representation.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// StreamKind
// ---------------------------------------------------------------------------

/// Coarse kind of an elementary stream.
///
/// The declaration order is the canonical output order: video sorts before
/// audio, audio before subtitle, subtitle before everything else.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    #[default]
    Other,
}

impl StreamKind {
    /// Map a demuxer media type (`"video"`, `"audio"`, `"subtitle"`, ...) to a
    /// stream kind. Anything unrecognised is [`StreamKind::Other`].
    pub fn from_media_type(media_type: &str) -> Self {
        match media_type {
            "video" => Self::Video,
            "audio" => Self::Audio,
            "subtitle" => Self::Subtitle,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
            Self::Subtitle => write!(f, "subtitle"),
            Self::Other => write!(f, "other"),
        }
    }
}

// ---------------------------------------------------------------------------
// CodecHint
// ---------------------------------------------------------------------------

/// Coding format hint used for transcoding decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CodecHint {
    /// Uncompressed Blu-ray LPCM audio.
    Pcm,
    #[default]
    Other,
}

/// Demuxer codec name of Blu-ray LPCM audio.
pub const PCM_BLURAY_CODEC: &str = "pcm_bluray";

impl CodecHint {
    /// Derive the hint from a stream kind and the demuxer's codec name.
    ///
    /// Only audio streams coded as Blu-ray LPCM are [`CodecHint::Pcm`].
    pub fn from_codec_name(kind: StreamKind, codec_name: &str) -> Self {
        if kind == StreamKind::Audio && codec_name == PCM_BLURAY_CODEC {
            Self::Pcm
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for CodecHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pcm => write!(f, "pcm"),
            Self::Other => write!(f, "other"),
        }
    }
}
