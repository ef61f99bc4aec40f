//! Canonical stream order: video, audio, subtitle, other; demuxer order
//! within a kind.

use crate::pile::Stream;

/// Sort key of a stream.
pub fn stream_key(s: &Stream) -> (bdp_core::StreamKind, u16) {
    (s.kind, s.index)
}

/// Sort `streams` into canonical order. Stable.
pub fn sort_streams(streams: &mut [Stream]) {
    streams.sort_by_key(stream_key);
}

/// Whether `streams` is already in canonical order.
pub fn is_canonical(streams: &[Stream]) -> bool {
    streams.windows(2).all(|w| stream_key(&w[0]) <= stream_key(&w[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bdp_core::{CodecHint, LanguageCode, StreamKind};

    fn s(index: u16, kind: StreamKind) -> Stream {
        Stream {
            index,
            id: 0x1000 + index,
            kind,
            codec: CodecHint::Other,
            lang: LanguageCode::UNDETERMINED,
        }
    }

    #[test]
    fn groups_by_kind_then_index() {
        let mut streams = vec![
            s(0, StreamKind::Subtitle),
            s(1, StreamKind::Audio),
            s(2, StreamKind::Other),
            s(3, StreamKind::Video),
            s(4, StreamKind::Audio),
        ];
        sort_streams(&mut streams);
        let order: Vec<u16> = streams.iter().map(|s| s.index).collect();
        assert_eq!(order, vec![3, 1, 4, 0, 2]);
        assert!(is_canonical(&streams));
    }

    #[test]
    fn empty_and_single_are_canonical() {
        assert!(is_canonical(&[]));
        assert!(is_canonical(&[s(9, StreamKind::Other)]));
        assert!(!is_canonical(&[s(0, StreamKind::Audio), s(1, StreamKind::Video)]));
    }
}
