//! Property tests for pile layout over arbitrary disc dumps.

use std::sync::Arc;

use bdp_core::LanguageCode;
use bdp_nav::{
    ChapterDescriptor, ClipDescriptor, DiscDump, DumpTitle, ElementaryStream, StreamDescriptor,
    TitleDescriptor,
};
use bdp_pile::{order::is_canonical, PileBuilder, Selection};
use bdp_pool::CountingBackend;
use proptest::prelude::*;

const MEDIA: [&str; 4] = ["video", "audio", "subtitle", "data"];
const LANGS: [&str; 4] = ["", "eng", "fra", "deu"];

#[derive(Debug, Clone)]
struct Shape {
    angles: u8,
    clips: usize,
    chapters: usize,
    /// (media type, language) per stream, in demuxer order.
    streams: Vec<(usize, usize)>,
}

fn shape() -> impl Strategy<Value = Shape> {
    (
        1u8..4,
        0usize..5,
        0usize..6,
        prop::collection::vec((0usize..4, 0usize..4), 0..10),
    )
        .prop_map(|(angles, clips, chapters, streams)| Shape {
            angles,
            clips,
            chapters,
            streams,
        })
}

fn dump_of(shapes: &[Shape]) -> DiscDump {
    let titles = shapes
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let pid = |j: usize| 0x1000 + j as u16;
            let tagged: Vec<StreamDescriptor> = s
                .streams
                .iter()
                .enumerate()
                .map(|(j, &(_, l))| StreamDescriptor {
                    pid: pid(j),
                    coding_type: 0,
                    lang: LanguageCode::parse(LANGS[l]).unwrap(),
                })
                .collect();
            let clips = (0..s.clips)
                .map(|c| ClipDescriptor {
                    clip_id: format!("{:05}", i * 10 + c),
                    start_time: c as u64 * 90_000,
                    audio_streams: tagged.clone(),
                    ..Default::default()
                })
                .collect();
            DumpTitle {
                title: TitleDescriptor {
                    playlist: i as u32,
                    angle_count: s.angles,
                    duration: 90_000,
                    clips,
                    chapters: (0..s.chapters as u64)
                        .map(|c| ChapterDescriptor {
                            start: c * 45_000,
                            duration: 45_000,
                        })
                        .collect(),
                },
                duplicate: false,
                streams: s
                    .streams
                    .iter()
                    .enumerate()
                    .map(|(j, &(m, _))| ElementaryStream {
                        id: pid(j),
                        media_type: MEDIA[m].to_string(),
                        codec_name: String::new(),
                    })
                    .collect(),
            }
        })
        .collect();
    DiscDump::new(titles)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Every (playlist, angle) lands once, in discovery order, with its
    /// slices sized as staged and streams in canonical order.
    #[test]
    fn layout_matches_the_walk(
        shapes in prop::collection::vec(shape(), 0..6),
        chunk_objects in 1usize..6,
    ) {
        let counter = Arc::new(CountingBackend::new());
        let mut src = dump_of(&shapes);
        let prober = src.streams();
        let pile = PileBuilder::new()
            .chunk_objects(chunk_objects)
            .backend(counter.clone())
            .build(&mut src, &prober, &Selection::all())
            .unwrap();

        let expected: Vec<(u32, u8)> = shapes
            .iter()
            .enumerate()
            .flat_map(|(i, s)| (0..s.angles).map(move |a| (i as u32, a)))
            .collect();
        let got: Vec<(u32, u8)> = pile.titles().map(|t| (t.playlist, t.angle)).collect();
        prop_assert_eq!(got, expected);

        let mut next = (0, 0, 0);
        for t in pile.titles() {
            let s = &shapes[t.playlist as usize];
            prop_assert_eq!(t.clip_count(), s.clips);
            prop_assert_eq!(t.stream_count(), s.streams.len());
            prop_assert_eq!(t.chapter_count(), s.chapters);
            prop_assert!(is_canonical(t.streams()));

            // Slices are contiguous and in title order.
            prop_assert_eq!(t.clip_range().start, next.0);
            prop_assert_eq!(t.stream_range().start, next.1);
            prop_assert_eq!(t.chapter_range().start, next.2);
            next = (t.clip_range().end, t.stream_range().end, t.chapter_range().end);

            // Nothing lost or invented by the sort; tags land only with a clip.
            let mut indices: Vec<u16> = t.streams().iter().map(|st| st.index).collect();
            indices.sort_unstable();
            prop_assert_eq!(indices, (0..s.streams.len() as u16).collect::<Vec<_>>());
            for st in t.streams() {
                let want = if s.clips == 0 { "" } else { LANGS[s.streams[st.index as usize].1] };
                prop_assert_eq!(st.lang.as_str(), want);
            }
        }
        prop_assert_eq!(next, (
            pile.all_clips().len(),
            pile.all_streams().len(),
            pile.all_chapters().len(),
        ));

        prop_assert_eq!(counter.live(), 1);
        prop_assert_eq!(src.outstanding_descriptors(), 0);
        pile.release();
        prop_assert!(counter.is_balanced());
    }

    /// Two builds of the same input agree element for element.
    #[test]
    fn builds_are_deterministic(shapes in prop::collection::vec(shape(), 0..6)) {
        let mut src = dump_of(&shapes);
        let prober = src.streams();
        let a = bdp_pile::build(&mut src, &prober, &Selection::all()).unwrap();
        let b = bdp_pile::build(&mut src, &prober, &Selection::all()).unwrap();
        prop_assert_eq!(a.all_streams(), b.all_streams());
        prop_assert_eq!(a.all_chapters(), b.all_chapters());
        prop_assert_eq!(a.all_clips(), b.all_clips());
    }
}
