//! External tool detection.
//!
//! The [`ToolRegistry`] locates ffmpeg and ffprobe once, honouring paths
//! from [`ToolsConfig`], and hands them to the prober and the remuxer.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bdp_core::config::ToolsConfig;
use serde::{Deserialize, Serialize};

/// Tools the registry manages.
pub const KNOWN_TOOLS: &[&str] = &["ffmpeg", "ffprobe"];

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
    /// First line of `-version` output, if available.
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

/// Registry of discovered tool paths.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, PathBuf>,
}

impl ToolRegistry {
    /// Discover tools by searching `PATH` (or using overrides from config).
    ///
    /// A configured path is used only if it exists; otherwise
    /// [`which::which`] searches `PATH`. Tools that are not found are left
    /// out of the registry.
    pub fn discover(tools_config: &ToolsConfig) -> Self {
        let mut tools = HashMap::new();

        for &name in KNOWN_TOOLS {
            let custom_path = match name {
                "ffmpeg" => tools_config.ffmpeg_path.as_deref(),
                "ffprobe" => tools_config.ffprobe_path.as_deref(),
                _ => None,
            };

            let resolved = match custom_path {
                Some(p) if p.exists() => Some(p.to_path_buf()),
                Some(p) => {
                    tracing::warn!("Configured {name} path {} does not exist", p.display());
                    which::which(name).ok()
                }
                None => which::which(name).ok(),
            };

            match resolved {
                Some(path) => {
                    tracing::debug!(tool = name, path = %path.display(), "Found tool");
                    tools.insert(name.to_string(), path);
                }
                None => tracing::debug!(tool = name, "Tool not found"),
            }
        }

        Self { tools }
    }

    /// Path of `name`, or an [`bdp_core::Error::Tool`] if it was not found.
    pub fn require(&self, name: &str) -> bdp_core::Result<&Path> {
        self.tools.get(name).map(PathBuf::as_path).ok_or_else(|| {
            bdp_core::Error::tool(name, format!("{name} not found; is it installed and in PATH?"))
        })
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        KNOWN_TOOLS
            .iter()
            .map(|&name| match self.tools.get(name) {
                Some(path) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(path),
                    path: Some(path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

/// Run `<tool> -version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path).arg("-version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_with_default_config() {
        let registry = ToolRegistry::discover(&ToolsConfig::default());
        // No tool is guaranteed to be installed; the call must not panic.
        let _ = registry.check_all();
    }

    #[test]
    fn require_unknown_tool_returns_error() {
        let registry = ToolRegistry::discover(&ToolsConfig::default());
        let err = registry.require("nonexistent_tool_xyz").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn check_all_reports_known_tools() {
        let infos = ToolRegistry::default().check_all();
        let names: Vec<&str> = infos.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["ffmpeg", "ffprobe"]);
        assert!(infos.iter().all(|i| !i.available && i.path.is_none()));
    }

    #[test]
    fn configured_path_is_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("my-ffprobe");
        std::fs::write(&fake, b"").unwrap();
        let cfg = ToolsConfig {
            ffmpeg_path: None,
            ffprobe_path: Some(fake.clone()),
        };
        let registry = ToolRegistry::discover(&cfg);
        assert_eq!(registry.require("ffprobe").unwrap(), fake.as_path());
    }
}
