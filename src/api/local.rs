use super::{Location, MetadataStore};
use crate::error::Result;
use async_trait::async_trait;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Mutable store rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[async_trait]
impl MetadataStore for LocalStore {
    fn location(&self) -> Location {
        Location::Local
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let absolute = self.base_path.join(path);
        match fs::read(&absolute) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::trace!("{} does not exist", absolute.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, path: &str, contents: &[u8]) -> Result<()> {
        let absolute = self.base_path.join(path);
        let parent = absolute.parent().unwrap_or(&self.base_path);
        fs::create_dir_all(parent)?;

        // Whole-file replace: readers see either the old or the new record.
        let mut staged = NamedTempFile::new_in(parent)?;
        staged.write_all(contents)?;
        staged.flush()?;
        staged.persist(&absolute).map_err(|e| e.error)?;

        tracing::debug!("Saved {}", absolute.display());
        Ok(())
    }
}
