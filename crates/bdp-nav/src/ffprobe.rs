//! FFprobe-based [`StreamProber`] implementation.
//!
//! Shells out to
//! `ffprobe -v quiet -print_format json -show_streams -playlist P -angle A bluray:<root>`
//! and maps the JSON streams into [`ElementaryStream`]s.

use std::path::{Path, PathBuf};

use bdp_core::Error;
use serde::Deserialize;

use crate::command::ToolCommand;
use crate::prober::{ElementaryStream, StreamProber};

/// A prober backed by the `ffprobe` CLI reading a disc through libbluray.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
    disc_root: PathBuf,
}

impl FfprobeProber {
    /// Create a prober using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf, disc_root: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path,
            disc_root: disc_root.into(),
        }
    }

    /// Create a prober that finds ffprobe on `PATH`.
    pub fn from_path(disc_root: impl Into<PathBuf>) -> Option<Self> {
        which::which("ffprobe")
            .ok()
            .map(|p| Self::new(p, disc_root))
    }

    /// The command that lists the streams of `playlist` at `angle`.
    pub fn command(&self, playlist: u32, angle: u8) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.args(["-v", "quiet", "-print_format", "json", "-show_streams"])
            .arg("-playlist")
            .arg(playlist.to_string())
            .arg("-angle")
            .arg(angle.to_string())
            .arg(bluray_url(&self.disc_root));
        cmd
    }

    async fn probe_async(&self, playlist: u32, angle: u8) -> bdp_core::Result<Vec<ElementaryStream>> {
        let output = self.command(playlist, angle).execute().await?;
        parse_ffprobe_streams(&output.stdout)
    }
}

/// The libbluray input URL for a disc directory.
pub fn bluray_url(disc_root: &Path) -> String {
    format!("bluray:{}", disc_root.display())
}

impl StreamProber for FfprobeProber {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    fn probe_title(&self, playlist: u32, angle: u8) -> bdp_core::Result<Vec<ElementaryStream>> {
        // The trait is sync; bridge onto a runtime.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => tokio::task::block_in_place(|| {
                handle.block_on(self.probe_async(playlist, angle))
            }),
            Err(_) => {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| Error::tool("ffprobe", format!("failed to create tokio runtime: {e}")))?;
                rt.block_on(self.probe_async(playlist, angle))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: Option<u32>,
    /// Hex PID, e.g. `"0x1011"`.
    id: Option<String>,
    codec_type: Option<String>,
    codec_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Map ffprobe `-show_streams` JSON to elementary streams, in ffprobe order.
///
/// Streams without a parseable PID are skipped.
pub fn parse_ffprobe_streams(json: &str) -> bdp_core::Result<Vec<ElementaryStream>> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| Error::source(format!("ffprobe JSON parse error: {e}")))?;

    let streams = output
        .streams
        .into_iter()
        .filter_map(|s| {
            let Some(id) = s.id.as_deref().and_then(parse_pid) else {
                tracing::warn!(index = ?s.index, id = ?s.id, "Skipping stream without PID");
                return None;
            };
            Some(ElementaryStream {
                id,
                media_type: s.codec_type.unwrap_or_default(),
                codec_name: s.codec_name.unwrap_or_default(),
            })
        })
        .collect();
    Ok(streams)
}

fn parse_pid(s: &str) -> Option<u16> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}
