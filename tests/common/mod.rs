//! Shared fixture for CLI integration tests.
//!
//! [`TestDisc`] lays out a disc directory in a temp dir: the navigation dump
//! from `tests/fixtures/bdpile.json` plus empty stream files under
//! `BDMV/STREAM` so clip names can be recovered.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

pub const CLIPS: [&str; 3] = ["00001.m2ts", "00002.m2ts", "00010.m2ts"];

pub fn fixture_dump() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/bdpile.json")
}

/// A disc directory that lives as long as the value.
pub struct TestDisc {
    dir: TempDir,
}

impl TestDisc {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let stream = dir.path().join("BDMV").join("STREAM");
        fs::create_dir_all(&stream).unwrap();
        for clip in CLIPS {
            fs::write(stream.join(clip), b"").unwrap();
        }
        fs::copy(fixture_dump(), dir.path().join("bdpile.json")).unwrap();
        Self { dir }
    }

    /// A disc directory with no dump and no streams.
    pub fn bare() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn arg(&self) -> &str {
        self.dir.path().to_str().unwrap()
    }

    /// Write a config file next to the disc and return its path.
    pub fn config(&self, json: &str) -> PathBuf {
        let path = self.dir.path().join("config.json");
        fs::write(&path, json).unwrap();
        path
    }
}
