use super::{Location, MetadataStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use url::Url;

/// Read-only store served over HTTP, e.g. a raw GitHub mirror of the catalog.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: reqwest::Client,
    base_url: Url,
}

impl RemoteStore {
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self> {
        // Relative joins drop the last path segment unless the base ends in '/'.
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl MetadataStore for RemoteStore {
    fn location(&self) -> Location {
        Location::Remote
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let url = self.base_url.join(path)?;
        tracing::debug!("Fetching {}", url);

        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            tracing::debug!("{} returned {}", url, response.status());
            return Ok(None);
        }

        Ok(Some(response.bytes().await?.to_vec()))
    }

    async fn put(&self, _path: &str, _contents: &[u8]) -> Result<()> {
        Err(Error::Unsupported("saving contents"))
    }
}
