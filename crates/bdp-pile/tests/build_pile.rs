//! End-to-end builds against disc dumps and misbehaving sources.

use std::sync::Arc;

use bdp_core::{Error, StreamKind};
use bdp_nav::{
    DiscDump, ElementaryStream, NavigationSource, StreamProber, TitleDescriptor, TitleFilter,
};
use bdp_pile::{build, order::is_canonical, PileBuilder, Selection};
use bdp_pool::{CountingBackend, SharedBackend};

const ONE_TITLE: &str = r#"{
    "titles": [{
        "playlist": 1,
        "duration": 180000,
        "clips": [
            {"clip_id": "00001", "start_time": 0,
             "video_streams": [{"pid": 0}],
             "audio_streams": [{"pid": 1, "lang": "eng"}],
             "pg_streams": [{"pid": 2, "lang": ""}]},
            {"clip_id": "00002", "start_time": 90000}
        ],
        "chapters": [{"start": 0}, {"start": 90000}],
        "streams": [
            {"id": 2, "media_type": "subtitle", "codec_name": "hdmv_pgs_subtitle"},
            {"id": 0, "media_type": "video", "codec_name": "h264"},
            {"id": 1, "media_type": "audio", "codec_name": "ac3"}
        ]
    }]
}"#;

const MULTI_ANGLE: &str = r#"{
    "titles": [
        {"playlist": 10, "duration": 5400000, "angle_count": 3,
         "clips": [{"clip_id": "00010"}],
         "chapters": [{"start": 0}],
         "streams": [{"id": 4113, "media_type": "video", "codec_name": "h264"}]},
        {"playlist": 11, "duration": 5400000, "duplicate": true,
         "streams": [{"id": 4113, "media_type": "video", "codec_name": "h264"}]},
        {"playlist": 12, "duration": 900000,
         "streams": [{"id": 4352, "media_type": "audio", "codec_name": "pcm_bluray"}]}
    ]
}"#;

fn dump(json: &str) -> DiscDump {
    DiscDump::from_json(json).unwrap()
}

#[test]
fn single_playlist_every_angle() {
    let mut src = dump(ONE_TITLE);
    let prober = src.streams();
    let pile = build(&mut src, &prober, &Selection::playlist(1)).unwrap();

    assert_eq!(pile.title_count(), 1);
    let t = pile.title(0).unwrap();
    assert_eq!((t.playlist, t.angle, t.angle_count), (1, 0, 1));
    assert_eq!(t.clip_count(), 2);
    assert_eq!(t.chapters(), &[0, 90_000]);

    let got: Vec<(u16, StreamKind, &str)> = t
        .streams()
        .iter()
        .map(|s| (s.id, s.kind, s.lang.as_str()))
        .collect();
    assert_eq!(
        got,
        vec![
            (0, StreamKind::Video, ""),
            (1, StreamKind::Audio, "eng"),
            (2, StreamKind::Subtitle, ""),
        ]
    );
    assert_eq!(src.outstanding_descriptors(), 0);
}

#[test]
fn no_qualifying_titles_is_an_empty_pile() {
    let mut src = dump(r#"{"titles": []}"#);
    let prober = src.streams();
    let sel = Selection::ByDuration {
        min_secs: 0,
        filter: TitleFilter::All,
    };
    let pile = build(&mut src, &prober, &sel).unwrap();
    assert_eq!(pile.title_count(), 0);
    assert!(pile.all_streams().is_empty());
}

#[test]
fn wildcard_angle_collects_every_angle() {
    let mut src = dump(MULTI_ANGLE);
    let prober = src.streams();
    let pile = build(&mut src, &prober, &Selection::playlist(10)).unwrap();
    let angles: Vec<u8> = pile.titles().map(|t| t.angle).collect();
    assert_eq!(angles, vec![0, 1, 2]);
    assert!(pile.titles().all(|t| t.angle_count == 3));
}

#[test]
fn named_angle_collects_one() {
    let mut src = dump(MULTI_ANGLE);
    let prober = src.streams();
    let pile = build(&mut src, &prober, &Selection::playlist_angle(10, 2)).unwrap();
    assert_eq!(pile.title_count(), 1);
    assert_eq!(pile.title(0).unwrap().angle, 2);
}

#[test]
fn angle_beyond_the_playlist_is_rejected() {
    let mut src = dump(MULTI_ANGLE);
    let prober = src.streams();
    let err = build(&mut src, &prober, &Selection::playlist_angle(10, 3)).unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "{err}");
    assert!(
        err.to_string().contains("invalid angle 3 for playlist 00010.mpls"),
        "{err}"
    );
    assert_eq!(src.outstanding_descriptors(), 0);
}

#[test]
fn unknown_playlist_is_a_source_error() {
    let mut src = dump(MULTI_ANGLE);
    let prober = src.streams();
    for sel in [Selection::playlist(99), Selection::playlist_angle(99, 0)] {
        let err = build(&mut src, &prober, &sel).unwrap_err();
        assert!(matches!(err, Error::Source(_)), "{err}");
    }
}

#[test]
fn several_selections_share_one_pile() {
    let mut src = dump(MULTI_ANGLE);
    let prober = src.streams();
    let pile = PileBuilder::new()
        .build_all(
            &mut src,
            &prober,
            &[
                Selection::playlist(12),
                Selection::playlist_angle(10, 1),
                Selection::playlist(11),
            ],
        )
        .unwrap();
    let got: Vec<(u32, u8)> = pile.titles().map(|t| (t.playlist, t.angle)).collect();
    assert_eq!(got, vec![(12, 0), (10, 1), (11, 0)]);
    assert_eq!(src.outstanding_descriptors(), 0);
}

#[test]
fn a_bad_selection_discards_the_whole_build() {
    let counter = Arc::new(CountingBackend::new());
    let mut src = dump(MULTI_ANGLE);
    let prober = src.streams();
    let err = PileBuilder::new()
        .backend(counter.clone())
        .build_all(
            &mut src,
            &prober,
            &[Selection::playlist(10), Selection::playlist_angle(12, 1)],
        )
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "{err}");
    assert!(counter.is_balanced());
    assert_eq!(src.outstanding_descriptors(), 0);
}

#[test]
fn by_duration_walks_counted_titles_and_their_angles() {
    let mut src = dump(MULTI_ANGLE);
    let prober = src.streams();
    let sel = Selection::ByDuration {
        min_secs: 0,
        filter: TitleFilter::FilterDuplicates,
    };
    let pile = build(&mut src, &prober, &sel).unwrap();
    let got: Vec<(u32, u8)> = pile.titles().map(|t| (t.playlist, t.angle)).collect();
    assert_eq!(got, vec![(10, 0), (10, 1), (10, 2), (12, 0)]);

    let sel = Selection::ByDuration {
        min_secs: 60,
        filter: TitleFilter::All,
    };
    let pile = build(&mut src, &prober, &sel).unwrap();
    let got: Vec<u32> = pile.titles().map(|t| t.playlist).collect();
    assert_eq!(got, vec![10, 10, 10, 11]);
    assert_eq!(src.outstanding_descriptors(), 0);
}

#[test]
fn identical_input_gives_identical_piles() {
    let mut src = dump(MULTI_ANGLE);
    let prober = src.streams();
    let a = build(&mut src, &prober, &Selection::all()).unwrap();
    let b = build(&mut src, &prober, &Selection::all()).unwrap();
    assert_eq!(a.all_streams(), b.all_streams());
    assert_eq!(a.all_chapters(), b.all_chapters());
    for t in a.titles() {
        assert!(is_canonical(t.streams()));
    }
}

#[test]
fn every_allocation_failure_unwinds_cleanly() {
    let mut succeeded_at = None;
    for n in 0..64 {
        let counter = Arc::new(CountingBackend::failing_after(n));
        let backend: SharedBackend = counter.clone();
        let mut src = dump(MULTI_ANGLE);
        let prober = src.streams();

        let result = PileBuilder::new()
            .chunk_objects(2)
            .backend(backend)
            .build(&mut src, &prober, &Selection::all());

        assert_eq!(src.outstanding_descriptors(), 0, "n = {n}");
        match result {
            Ok(pile) => {
                assert_eq!(pile.title_count(), 5);
                assert_eq!(counter.live(), 1, "only the block survives");
                drop(pile);
                assert!(counter.is_balanced());
                succeeded_at = Some(n);
                break;
            }
            Err(e) => {
                assert!(e.is_out_of_memory(), "n = {n}: {e}");
                assert!(counter.is_balanced(), "n = {n}: leaked {}", counter.live());
            }
        }
    }
    assert!(succeeded_at.is_some_and(|n| n > 0));
}

// ---------------------------------------------------------------------------
// Misbehaving collaborators
// ---------------------------------------------------------------------------

/// Wraps a dump and fails on command.
struct Flaky {
    inner: DiscDump,
    refuse_select: bool,
    lose_title: Option<u32>,
}

impl NavigationSource for Flaky {
    fn name(&self) -> &'static str {
        "flaky"
    }
    fn title_count(&mut self, filter: TitleFilter, min: u32) -> u32 {
        self.inner.title_count(filter, min)
    }
    fn title_info(&mut self, index: u32, angle: u8) -> Option<TitleDescriptor> {
        if self.lose_title == Some(index) {
            return None;
        }
        self.inner.title_info(index, angle)
    }
    fn playlist_info(&mut self, playlist: u32, angle: u8) -> Option<TitleDescriptor> {
        self.inner.playlist_info(playlist, angle)
    }
    fn select_title(&mut self, playlist: u32, angle: u8) -> bool {
        !self.refuse_select && self.inner.select_title(playlist, angle)
    }
    fn seek_time(&mut self, ticks: u64) {
        self.inner.seek_time(ticks)
    }
    fn release_descriptor(&mut self, d: TitleDescriptor) {
        self.inner.release_descriptor(d)
    }
}

struct BrokenProber;

impl StreamProber for BrokenProber {
    fn name(&self) -> &'static str {
        "broken"
    }
    fn probe_title(&self, _: u32, _: u8) -> bdp_core::Result<Vec<ElementaryStream>> {
        Err(Error::source("demuxer could not open the title"))
    }
}

fn counted_build<S: NavigationSource, P: StreamProber>(
    src: &mut S,
    prober: &P,
) -> (bdp_core::Result<bdp_pile::Pile>, Arc<CountingBackend>) {
    let counter = Arc::new(CountingBackend::new());
    let result = PileBuilder::new()
        .backend(counter.clone())
        .build(src, prober, &Selection::all());
    (result, counter)
}

#[test]
fn lost_title_aborts_and_frees() {
    let inner = dump(MULTI_ANGLE);
    let prober = inner.streams();
    let mut src = Flaky {
        inner,
        refuse_select: false,
        lose_title: Some(1),
    };
    let (result, counter) = counted_build(&mut src, &prober);
    assert!(matches!(result.unwrap_err(), Error::Source(_)));
    assert!(counter.is_balanced());
    assert_eq!(src.inner.outstanding_descriptors(), 0);
}

#[test]
fn refused_selection_releases_the_descriptor() {
    let inner = dump(MULTI_ANGLE);
    let prober = inner.streams();
    let mut src = Flaky {
        inner,
        refuse_select: true,
        lose_title: None,
    };
    let (result, counter) = counted_build(&mut src, &prober);
    let err = result.unwrap_err();
    assert!(err.to_string().contains("cannot select"), "{err}");
    assert!(counter.is_balanced());
    assert_eq!(src.inner.outstanding_descriptors(), 0);
}

#[test]
fn prober_failure_propagates_unchanged() {
    let mut src = dump(MULTI_ANGLE);
    let (result, counter) = counted_build(&mut src, &BrokenProber);
    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "Source error: demuxer could not open the title");
    assert!(counter.is_balanced());
    assert_eq!(src.outstanding_descriptors(), 0);
}

// ---------------------------------------------------------------------------
// Clip names
// ---------------------------------------------------------------------------

fn disc_dir(clips: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let stream = dir.path().join("BDMV").join("STREAM");
    std::fs::create_dir_all(&stream).unwrap();
    for c in clips {
        std::fs::write(stream.join(c), b"").unwrap();
    }
    dir
}

#[test]
fn unreadable_descriptor_dir_aborts() {
    let disc = disc_dir(&["00001.m2ts"]);
    let mut src = dump(ONE_TITLE).with_root(disc.path());
    let prober = src.streams();
    let err = PileBuilder::new()
        .clip_names(disc.path())
        .fd_dir(disc.path().join("no-such-fd-dir"))
        .build(&mut src, &prober, &Selection::playlist(1))
        .unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
    assert_eq!(src.outstanding_descriptors(), 0);
}

#[test]
fn missing_stream_dir_means_no_names() {
    let disc = tempfile::tempdir().unwrap();
    let mut src = dump(ONE_TITLE);
    let prober = src.streams();
    let pile = PileBuilder::new()
        .clip_names(disc.path())
        .build(&mut src, &prober, &Selection::playlist(1))
        .unwrap();
    assert!(pile.clip_names().is_none());
    let t = pile.title(0).unwrap();
    assert!(t.clips().iter().all(|c| t.clip_name(c).is_none()));
}

#[cfg(target_os = "linux")]
#[test]
fn clip_names_follow_the_open_stream_file() {
    let disc = disc_dir(&["00001.m2ts", "00002.m2ts"]);
    let mut src = dump(ONE_TITLE).with_root(disc.path());
    let prober = src.streams();
    let pile = PileBuilder::new()
        .clip_names(disc.path())
        .build(&mut src, &prober, &Selection::playlist(1))
        .unwrap();

    let t = pile.title(0).unwrap();
    let names: Vec<Option<&str>> = t.clips().iter().map(|c| t.clip_name(c)).collect();
    assert_eq!(names, vec![Some("00001.m2ts"), Some("00002.m2ts")]);
    assert_eq!(pile.clip_names().map(|n| n.len()), Some(2));
}
