use serde::{Deserialize, Serialize};
use std::fmt;

/// Bounds used before the first release of a tool platform has been recorded.
pub const EARLIEST_SENTINEL: &str = "42.0.0";
pub const LATEST_SENTINEL: &str = "0.0.0";

/// One platform-specific release of one tool. `version` stays empty until it
/// has been resolved against the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tool {
    pub name: String,
    pub version: String,
    pub os: String,
    pub arch: String,
}

impl Tool {
    pub fn new(name: &str, os: &str, arch: &str) -> Self {
        Self {
            name: name.to_string(),
            version: String::new(),
            os: os.to_string(),
            arch: arch.to_string(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn platform(&self) -> String {
        format!("{}-{}", self.os, self.arch)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.name, self.os, self.arch)?;
        if !self.version.is_empty() {
            write!(f, " v{}", self.version)?;
        }
        Ok(())
    }
}

/// Catalog of all known tool names (`meta.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GlobalMeta {
    #[serde(default)]
    pub tools: Vec<String>,
}

/// Curated, per-tool metadata (`{tool}/meta.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ToolMeta {
    #[serde(default)]
    pub description: String,
    #[serde(rename = "downloadURLTemplate", default)]
    pub download_url_template: String,
    #[serde(default)]
    pub homepage: String,
    #[serde(rename = "ignoredVersions", default)]
    pub ignored_versions: Vec<String>,
    #[serde(rename = "versionArgs", default)]
    pub version_args: Vec<String>,
}

/// Observed version bounds of a tool platform (`{tool}/{os}-{arch}/meta.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ToolPlatformMeta {
    #[serde(default)]
    pub version: VersionRange,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionRange {
    pub earliest: String,
    pub latest: String,
}

impl Default for VersionRange {
    fn default() -> Self {
        Self {
            earliest: EARLIEST_SENTINEL.to_string(),
            latest: LATEST_SENTINEL.to_string(),
        }
    }
}

/// Immutable release record (`{tool}/{os}-{arch}/{version}.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ToolPlatformVersionMeta {
    pub url: String,
    pub sha256: String,
}
