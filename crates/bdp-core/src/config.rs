//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON. Every section
//! defaults sensibly so a completely empty `{}` file is valid, and command
//! line flags override whatever the file says.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pile: PileConfig,
    pub selection: SelectionConfig,
    pub tools: ToolsConfig,
    pub remux: RemuxConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str).map_err(|e| Error::Config(format!("parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None`, the file does not exist, or it fails to parse.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.pile.chunk_objects == 0 {
            warnings.push("pile.chunk_objects is 0; the default of 32 will be used".into());
        }

        for lang in &self.remux.languages {
            if lang.len() != 3 || !lang.bytes().all(|b| b.is_ascii_lowercase()) {
                warnings.push(format!(
                    "remux.languages entry '{lang}' is not a three-letter ISO 639-2 code"
                ));
            }
        }

        if let Some(ref p) = self.tools.ffmpeg_path {
            if !p.exists() {
                warnings.push(format!("tools.ffmpeg_path {} does not exist", p.display()));
            }
        }
        if let Some(ref p) = self.tools.ffprobe_path {
            if !p.exists() {
                warnings.push(format!("tools.ffprobe_path {} does not exist", p.display()));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Pile builder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PileConfig {
    /// Objects per staging pool chunk.
    pub chunk_objects: usize,
    /// Scan `BDMV/STREAM` and recover clip file names.
    pub clip_names: bool,
    /// Directory listing this process's open file descriptors.
    pub fd_dir: PathBuf,
}

/// Objects per pool chunk when nothing else is configured.
pub const DEFAULT_CHUNK_OBJECTS: usize = 32;

impl Default for PileConfig {
    fn default() -> Self {
        Self {
            chunk_objects: DEFAULT_CHUNK_OBJECTS,
            clip_names: true,
            fd_dir: PathBuf::from("/proc/self/fd"),
        }
    }
}

impl PileConfig {
    /// Chunk size with the zero case mapped to the default.
    pub fn effective_chunk_objects(&self) -> usize {
        if self.chunk_objects == 0 {
            DEFAULT_CHUNK_OBJECTS
        } else {
            self.chunk_objects
        }
    }
}

/// Default title selection when no playlist is named.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub min_duration_secs: u32,
    pub filter_duplicates: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: 0,
            filter_duplicates: true,
        }
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

/// ffmpeg remux defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemuxConfig {
    /// Languages kept when none are given on the command line.
    pub languages: Vec<String>,
    /// Codec that LPCM audio is re-encoded to.
    #[serde(default = "default_pcm_codec")]
    pub pcm_codec: String,
    #[serde(default = "default_pcm_compression_level")]
    pub pcm_compression_level: u32,
}

fn default_pcm_codec() -> String {
    "flac".into()
}

fn default_pcm_compression_level() -> u32 {
    12
}

impl Default for RemuxConfig {
    fn default() -> Self {
        Self {
            languages: Vec::new(),
            pcm_codec: default_pcm_codec(),
            pcm_compression_level: default_pcm_compression_level(),
        }
    }
}
