//! The [`StreamProber`] trait: demuxer-level stream enumeration.

use bdp_core::{CodecHint, StreamKind};
use serde::{Deserialize, Serialize};

/// One elementary stream as a demuxer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementaryStream {
    /// Transport stream PID.
    pub id: u16,
    /// Demuxer media type: `video`, `audio`, `subtitle`, `data`, ...
    pub media_type: String,
    /// Demuxer codec name, e.g. `h264` or `pcm_bluray`.
    #[serde(default)]
    pub codec_name: String,
}

impl ElementaryStream {
    pub fn kind(&self) -> StreamKind {
        StreamKind::from_media_type(&self.media_type)
    }

    pub fn codec_hint(&self) -> CodecHint {
        CodecHint::from_codec_name(self.kind(), &self.codec_name)
    }
}

/// Enumerates the elementary streams of a title.
///
/// The navigation source only knows stream tables; codec-level content
/// comes from here. Implementations must be safe to share across threads.
pub trait StreamProber: Send + Sync {
    /// Human-readable name identifying this prober implementation.
    fn name(&self) -> &'static str;

    /// Streams of `playlist` at `angle`, in demuxer order.
    fn probe_title(&self, playlist: u32, angle: u8) -> bdp_core::Result<Vec<ElementaryStream>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn es(media_type: &str, codec_name: &str) -> ElementaryStream {
        ElementaryStream {
            id: 0x1100,
            media_type: media_type.into(),
            codec_name: codec_name.into(),
        }
    }

    #[test]
    fn kind_and_hint() {
        let lpcm = es("audio", "pcm_bluray");
        assert_eq!(lpcm.kind(), StreamKind::Audio);
        assert_eq!(lpcm.codec_hint(), CodecHint::Pcm);

        let pgs = es("subtitle", "hdmv_pgs_subtitle");
        assert_eq!(pgs.kind(), StreamKind::Subtitle);
        assert_eq!(pgs.codec_hint(), CodecHint::Other);

        assert_eq!(es("data", "").kind(), StreamKind::Other);
    }
}
