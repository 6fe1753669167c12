//! Fixtures shared by the unit tests.

use crate::api::{self, LocalStore};
use crate::types::*;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Shell script that reports `version` the way real tools do.
pub fn fake_binary(version: &str) -> String {
    format!("#!/bin/sh\necho \"t version {}\"\n", version)
}

pub fn write_tool_meta(root: &Path, name: &str, template: &str, ignored: &[&str]) {
    let meta = ToolMeta {
        description: format!("{} test tool", name),
        download_url_template: template.to_string(),
        homepage: format!("https://example.com/{}", name),
        ignored_versions: ignored.iter().map(|v| v.to_string()).collect(),
        version_args: vec!["--version".to_string()],
    };
    fs::create_dir_all(root.join(name)).unwrap();
    fs::write(
        root.join(name).join("meta.yaml"),
        serde_yaml::to_string(&meta).unwrap(),
    )
    .unwrap();
}

pub async fn write_platform_meta(store: &LocalStore, tool: &Tool, earliest: &str, latest: &str) {
    let meta = ToolPlatformMeta {
        version: VersionRange {
            earliest: earliest.to_string(),
            latest: latest.to_string(),
        },
    };
    api::save_tool_platform_meta(store, tool, &meta).await.unwrap();
}

pub async fn write_release(store: &LocalStore, tool: &Tool, url: &str, artifact: &[u8]) {
    let release = ToolPlatformVersionMeta {
        url: url.to_string(),
        sha256: sha256_hex(artifact),
    };
    api::save_tool_platform_version_meta(store, tool, &release)
        .await
        .unwrap();
}

/// Place an executable fake binary at `dir/name`.
#[cfg(unix)]
pub fn install_fake_binary(dir: &Path, name: &str, version: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, fake_binary(version)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
