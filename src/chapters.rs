//! Chapter export as Matroska chapter XML or FFMETADATA.

use std::io::{self, Write};

use bdp_core::ticks_to_timestamp;

/// Output format of the `chapters` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ChapterFormat {
    /// Matroska chapter XML, as read by mkvmerge.
    #[default]
    Xml,
    /// ffmpeg's metadata file format.
    Ffmetadata,
}

/// One chapter of a title, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterSpan {
    pub start: u64,
    pub end: u64,
}

/// Pair chapter starts with their ends.
///
/// A chapter lasts its own `durations` entry when the disc records one;
/// otherwise it runs to the next start, and the last one to the end of the
/// title. No chapter ends before it starts.
pub fn spans(starts: &[u64], durations: &[u64], title_duration: u64) -> Vec<ChapterSpan> {
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = match durations.get(i) {
                Some(&d) if d > 0 => start.saturating_add(d),
                _ => starts.get(i + 1).copied().unwrap_or(title_duration),
            };
            ChapterSpan {
                start,
                end: end.max(start),
            }
        })
        .collect()
}

/// Write chapters in `format`.
pub fn write_chapters<W: Write>(
    out: &mut W,
    format: ChapterFormat,
    chapters: &[ChapterSpan],
) -> io::Result<()> {
    match format {
        ChapterFormat::Xml => write_xml(out, chapters),
        ChapterFormat::Ffmetadata => write_ffmetadata(out, chapters),
    }
}

/// Matroska chapter XML with one atom per chapter start.
pub fn write_xml<W: Write>(out: &mut W, chapters: &[ChapterSpan]) -> io::Result<()> {
    out.write_all(
        b"<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
          <Chapters>\n\
          \t<EditionEntry>\n\
          \t\t<EditionFlagHidden>0</EditionFlagHidden>\n\
          \t\t<EditionFlagDefault>0</EditionFlagDefault>\n",
    )?;
    for chapter in chapters {
        write!(
            out,
            "\t\t<ChapterAtom>\n\
             \t\t\t<ChapterTimeStart>{}</ChapterTimeStart>\n\
             \t\t\t<ChapterFlagHidden>0</ChapterFlagHidden>\n\
             \t\t\t<ChapterFlagEnabled>1</ChapterFlagEnabled>\n\
             \t\t</ChapterAtom>\n",
            ticks_to_timestamp(chapter.start)
        )?;
    }
    out.write_all(b"\t</EditionEntry>\n</Chapters>\n")
}

/// FFMETADATA in ticks.
pub fn write_ffmetadata<W: Write>(out: &mut W, chapters: &[ChapterSpan]) -> io::Result<()> {
    out.write_all(b";FFMETADATA1\n")?;
    for ChapterSpan { start, end } in chapters {
        write!(
            out,
            "[CHAPTER]\nTIMEBASE=1/90000\nSTART={start}\nEND={end}\n"
        )?;
    }
    Ok(())
}

/// FFMETADATA as bytes, for feeding a child process.
pub fn ffmetadata(chapters: &[ChapterSpan]) -> Vec<u8> {
    let mut buf = Vec::new();
    // Writing to a Vec cannot fail.
    let _ = write_ffmetadata(&mut buf, chapters);
    buf
}
