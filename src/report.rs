//! Human-readable title listing.
//!
//! Each title is one YAML-ish document so the output stays greppable and can
//! be fed to a YAML parser in a pinch.

use std::io::{self, Write};

use bdp_core::{ticks_to_timestamp, CodecHint, StreamKind};
use bdp_pile::{Pile, TitleView};

const KINDS: [(StreamKind, &str); 4] = [
    (StreamKind::Video, "video"),
    (StreamKind::Audio, "audio"),
    (StreamKind::Subtitle, "subtitle"),
    (StreamKind::Other, "other"),
];

/// Write every title of `pile`. `info` adds per-stream detail.
pub fn write_pile<W: Write>(out: &mut W, pile: &Pile, info: bool) -> io::Result<()> {
    for title in pile.titles() {
        write_title(out, title, info)?;
    }
    Ok(())
}

pub fn write_title<W: Write>(out: &mut W, t: TitleView<'_>, info: bool) -> io::Result<()> {
    writeln!(out, "---")?;
    writeln!(out, "playlist: {:05}.mpls", t.playlist)?;
    writeln!(out, "angle:    {} of {}", t.angle, t.angle_count)?;
    writeln!(out, "duration: {}", ticks_to_timestamp(t.duration))?;
    writeln!(out, "chapters: {}", t.chapter_count())?;

    match t.clip_count() {
        0 => writeln!(out, "clips:    []")?,
        1 => writeln!(out, "clips:")?,
        n => writeln!(out, "clips:    # {n}")?,
    }
    for clip in t.clips() {
        writeln!(out, "  - {}", t.clip_name(clip).unwrap_or("~"))?;
    }

    if t.stream_count() == 0 {
        return writeln!(out, "streams:  []");
    }
    writeln!(out, "streams:")?;
    if info {
        for s in t.streams() {
            writeln!(out, "  - pid:      0x{:04x}", s.id)?;
            writeln!(out, "    index:    {}", s.index)?;
            writeln!(out, "    kind:     {}", kind_name(s.kind))?;
            if !s.lang.is_undetermined() {
                writeln!(out, "    language: {}", s.lang)?;
            }
            if s.codec == CodecHint::Pcm {
                writeln!(out, "    codec:    {}", s.codec)?;
            }
        }
        return Ok(());
    }

    for (kind, name) in KINDS {
        let langs: Vec<&str> = t.streams_of(kind).map(|s| s.lang.preferred()).collect();
        if langs.is_empty() {
            continue;
        }
        let pad = " ".repeat("subtitle".len() - name.len());
        writeln!(out, "  {name}:{pad} [{}]", langs.join(", "))?;
    }
    Ok(())
}

fn kind_name(kind: StreamKind) -> &'static str {
    KINDS
        .iter()
        .find(|(k, _)| *k == kind)
        .map_or("other", |&(_, n)| n)
}
