use bdpile::chapters::ChapterFormat;
use bdpile::disc::PlaylistArg;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bdpile")]
#[command(author, version, about = "Blu-ray title listing, chapter export and ffmpeg remux helper")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where a disc's navigation data and streams come from.
#[derive(Args)]
pub struct SourceArgs {
    /// Disc directory (the one containing BDMV)
    #[arg(required = true)]
    pub source: PathBuf,

    /// Navigation dump to read instead of <SOURCE>/bdpile.json
    #[arg(long)]
    pub dump: Option<PathBuf>,

    /// Enumerate streams with ffprobe instead of the dump
    #[arg(long)]
    pub ffprobe: bool,
}

/// Settings shared by the commands that write one title with ffmpeg.
#[derive(Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Playlist to extract, optionally with an angle (N or N:ANGLE)
    #[arg(short, long, required = true)]
    pub playlist: PlaylistArg,

    /// Languages to keep, comma separated; untagged streams are always kept
    #[arg(short, long, value_delimiter = ',')]
    pub languages: Option<Vec<String>>,

    /// Destination file
    #[arg(required = true)]
    pub output: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List titles with their clips, chapters and streams
    List {
        #[command(flatten)]
        source: SourceArgs,

        /// Only titles at least this many seconds long
        #[arg(short, long)]
        time: Option<u32>,

        /// Only these playlists (N or N:ANGLE, repeatable)
        #[arg(short, long, conflicts_with = "time", action = ArgAction::Append)]
        playlist: Vec<PlaylistArg>,

        /// Do not omit duplicate titles
        #[arg(short, long)]
        all: bool,

        /// Print per-stream details
        #[arg(short, long)]
        info: bool,

        /// Output as JSON
        #[arg(long, conflicts_with = "info")]
        json: bool,
    },

    /// Print a title's chapters
    Chapters {
        #[command(flatten)]
        source: SourceArgs,

        /// Playlist (N or N:ANGLE)
        #[arg(short, long, required = true)]
        playlist: PlaylistArg,

        /// Chapter format
        #[arg(short, long, value_enum, default_value_t = ChapterFormat::Xml)]
        format: ChapterFormat,
    },

    /// Print the ffmpeg command that extracts a title
    Ffmpeg(ExtractArgs),

    /// Extract a title with ffmpeg
    Remux(ExtractArgs),

    /// Check that required external tools are available
    CheckTools,
}
