//! ffmpeg invocations that copy one title out of a disc.

use std::path::Path;

use bdp_core::config::RemuxConfig;
use bdp_core::{CodecHint, LanguageCode};
use bdp_nav::bluray_url;
use bdp_pile::{Stream, TitleView};

/// Whether a stream is kept for `languages`: untagged streams always are.
pub fn wanted(stream: &Stream, languages: &[LanguageCode]) -> bool {
    stream.lang.is_undetermined() || languages.contains(&stream.lang)
}

/// The argument vector, `ffmpeg` first, that copies `title` from `src` to
/// `dst`.
///
/// Streams are mapped by PID in pile order. With `chapters_on_stdin` a
/// second input `-` supplies FFMETADATA chapters.
pub fn ffmpeg_argv(
    title: TitleView<'_>,
    languages: &[LanguageCode],
    src: &Path,
    dst: &Path,
    chapters_on_stdin: bool,
    remux: &RemuxConfig,
) -> Vec<String> {
    let mut argv: Vec<String> = vec![
        "ffmpeg".into(),
        "-playlist".into(),
        title.playlist.to_string(),
        "-angle".into(),
        title.angle.to_string(),
        "-i".into(),
        bluray_url(src),
    ];
    if chapters_on_stdin {
        argv.extend(["-i".into(), "-".into()]);
    }
    argv.extend(["-c".into(), "copy".into()]);

    let mut out_index = 0u32;
    for s in title.streams().iter().filter(|s| wanted(s, languages)) {
        argv.push("-map".into());
        argv.push(format!("0:i:0x{:04x}", s.id));
        if !s.lang.is_undetermined() {
            argv.push(format!("-metadata:s:{out_index}"));
            argv.push(format!("language={}", s.lang));
        }
        if s.codec == CodecHint::Pcm {
            argv.push(format!("-c:{out_index}"));
            argv.push(remux.pcm_codec.clone());
            argv.push("-compression_level".into());
            argv.push(remux.pcm_compression_level.to_string());
        }
        out_index += 1;
    }

    if chapters_on_stdin {
        argv.extend(["-map_chapters".into(), "1".into()]);
    }
    argv.push(dst.to_string_lossy().into_owned());
    argv
}

/// Quote `arg` for a POSIX shell if it contains anything outside a safe set.
pub fn shell_escape(arg: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || "+,-./:@_".contains(c);
    if !arg.is_empty() && arg.chars().all(safe) {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// `argv` as one shell command line.
pub fn shell_line(argv: &[String]) -> String {
    argv.iter()
        .map(|a| shell_escape(a))
        .collect::<Vec<_>>()
        .join(" ")
}
