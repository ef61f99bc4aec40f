//! Running ffmpeg on a title.

use std::path::Path;

use bdp_core::config::RemuxConfig;
use bdp_core::LanguageCode;
use bdp_nav::ToolCommand;
use bdp_pile::TitleView;

use crate::chapters::{ffmetadata, ChapterSpan};
use crate::ffargs::ffmpeg_argv;

/// The ffmpeg command for `title`, with `chapters` queued for stdin.
///
/// `ffmpeg` replaces the bare program name of the argument vector. A remux
/// runs as long as the title takes, so the command has no time limit.
pub fn remux_command(
    ffmpeg: &Path,
    title: TitleView<'_>,
    chapters: &[ChapterSpan],
    languages: &[LanguageCode],
    src: &Path,
    dst: &Path,
    remux: &RemuxConfig,
) -> ToolCommand {
    let with_chapters = !chapters.is_empty();
    let argv = ffmpeg_argv(title, languages, src, dst, with_chapters, remux);

    let mut cmd = ToolCommand::new(ffmpeg.to_path_buf());
    cmd.args(argv.into_iter().skip(1)).timeout(None);
    if with_chapters {
        cmd.stdin(ffmetadata(chapters));
    }
    cmd
}

/// Start ffmpeg and wait for it.
pub async fn run(cmd: &ToolCommand) -> bdp_core::Result<()> {
    tracing::info!(argv = ?cmd.argv(), "Starting ffmpeg");
    let status = cmd.run().await?;
    tracing::info!(%status, "ffmpeg finished");
    Ok(())
}
