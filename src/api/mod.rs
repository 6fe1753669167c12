//! Metadata store access.
//!
//! Records live at fixed, human-readable YAML paths so that existing catalogs
//! keep resolving:
//!
//! - `meta.yaml`: [`GlobalMeta`]
//! - `{tool}/meta.yaml`: [`ToolMeta`]
//! - `{tool}/{os}-{arch}/meta.yaml`: [`ToolPlatformMeta`]
//! - `{tool}/{os}-{arch}/{version}.yaml`: [`ToolPlatformVersionMeta`]

mod local;
mod remote;

pub use local::LocalStore;
pub use remote::RemoteStore;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::types::*;
use crate::version::parse_version;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Local,
    Remote,
}

/// Key-path read/write access to the record store.
///
/// `get` reports an absent path as `Ok(None)`; every other failure is an
/// error. Writes are only guaranteed on the local backend.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    fn location(&self) -> Location;

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>>;

    async fn put(&self, path: &str, contents: &[u8]) -> Result<()>;
}

/// Open the store selected by `--local` (or forced by the command).
pub fn open_store(
    settings: &Settings,
    client: &reqwest::Client,
    location: Location,
) -> Result<Box<dyn MetadataStore>> {
    match location {
        Location::Local => {
            let base_path = settings.require_local_api_base_path()?;
            tracing::debug!("Using local API at {}", base_path.display());
            Ok(Box::new(LocalStore::new(base_path)))
        }
        Location::Remote => {
            tracing::debug!("Using remote API at {}", settings.remote_api_base_url);
            Ok(Box::new(RemoteStore::new(
                client.clone(),
                &settings.remote_api_base_url,
            )?))
        }
    }
}

pub const GLOBAL_META_PATH: &str = "meta.yaml";

pub fn tool_meta_path(tool: &Tool) -> String {
    format!("{}/meta.yaml", tool.name)
}

pub fn tool_platform_meta_path(tool: &Tool) -> String {
    format!("{}/{}/meta.yaml", tool.name, tool.platform())
}

pub fn tool_platform_version_meta_path(tool: &Tool) -> String {
    format!("{}/{}/{}.yaml", tool.name, tool.platform(), tool.version)
}

async fn get_record<T: DeserializeOwned>(
    store: &dyn MetadataStore,
    path: &str,
    missing: impl FnOnce() -> String,
) -> Result<T> {
    match store.get(path).await? {
        Some(bytes) => Ok(serde_yaml::from_slice(&bytes)?),
        None => Err(Error::NotFound(missing())),
    }
}

async fn save_record<T: Serialize>(store: &dyn MetadataStore, path: &str, record: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(record)?;
    store.put(path, yaml.as_bytes()).await
}

pub async fn get_meta(store: &dyn MetadataStore) -> Result<GlobalMeta> {
    get_record(store, GLOBAL_META_PATH, || "global metadata".to_string()).await
}

pub async fn save_meta(store: &dyn MetadataStore, meta: &GlobalMeta) -> Result<()> {
    save_record(store, GLOBAL_META_PATH, meta).await
}

pub async fn get_tool_meta(store: &dyn MetadataStore, tool: &Tool) -> Result<ToolMeta> {
    get_record(store, &tool_meta_path(tool), || tool.name.clone()).await
}

pub async fn get_tool_platform_meta(
    store: &dyn MetadataStore,
    tool: &Tool,
) -> Result<ToolPlatformMeta> {
    get_record(store, &tool_platform_meta_path(tool), || {
        format!("{} {}", tool.name, tool.platform())
    })
    .await
}

pub async fn save_tool_platform_meta(
    store: &dyn MetadataStore,
    tool: &Tool,
    meta: &ToolPlatformMeta,
) -> Result<()> {
    save_record(store, &tool_platform_meta_path(tool), meta).await
}

pub async fn get_tool_platform_version_meta(
    store: &dyn MetadataStore,
    tool: &Tool,
) -> Result<ToolPlatformVersionMeta> {
    get_record(store, &tool_platform_version_meta_path(tool), || {
        format!("{} v{}", tool.name, tool.version)
    })
    .await
}

pub async fn save_tool_platform_version_meta(
    store: &dyn MetadataStore,
    tool: &Tool,
    meta: &ToolPlatformVersionMeta,
) -> Result<()> {
    save_record(store, &tool_platform_version_meta_path(tool), meta).await
}

/// Latest recorded version of a tool on the tool's platform.
pub async fn get_latest_version(
    store: &dyn MetadataStore,
    tool: &Tool,
) -> Result<semver::Version> {
    let meta = get_tool_platform_meta(store, tool).await?;
    parse_version(&meta.version.latest)
}
