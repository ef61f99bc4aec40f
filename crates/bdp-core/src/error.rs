//! Unified error type for bdpile.
//!
//! The navigation source, the pool allocator and the pile builder all funnel
//! their failures into [`Error`]. The builder only ever surfaces
//! [`Error::OutOfMemory`], [`Error::Source`] and [`Error::Io`]; the others
//! belong to the outer layers.

/// Unified error type covering all failure modes in bdpile.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A memory backend refused an allocation.
    #[error("Out of memory: {requested} bytes requested")]
    OutOfMemory {
        /// Size of the refused request in bytes.
        requested: usize,
    },

    /// The navigation or media-enumeration source reported a failure.
    #[error("Source error: {0}")]
    Source(String),

    /// A slot handle was released to a pool that does not own it.
    #[error("Slot not owned by this pool")]
    NotOwned,

    /// User-supplied data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration could not be parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool (ffmpeg, ffprobe) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },
}

impl Error {
    /// Convenience constructor for [`Error::Source`].
    pub fn source(message: impl Into<String>) -> Self {
        Error::Source(message.into())
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Whether this error is an allocation failure.
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Error::OutOfMemory { .. })
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
