use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// The directories searched for installed tools, `$PATH` by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    paths: Option<OsString>,
}

impl SearchPath {
    pub fn from_env() -> Self {
        Self {
            paths: env::var_os("PATH"),
        }
    }

    #[cfg(test)]
    pub fn new(dirs: &[&Path]) -> Self {
        Self {
            paths: env::join_paths(dirs).ok(),
        }
    }

    /// Absolute path of `name` on the search path, if any.
    pub fn which(&self, name: &str) -> Option<PathBuf> {
        let paths = self.paths.as_ref()?;
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        match which::which_in(name, Some(paths), cwd) {
            Ok(path) => {
                tracing::debug!("Resolved {} to {}", name, path.display());
                Some(path)
            }
            Err(e) => {
                tracing::trace!("{} not found on search path: {}", name, e);
                None
            }
        }
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.paths
            .as_ref()
            .map(|paths| env::split_paths(paths).any(|p| p == dir))
            .unwrap_or(false)
    }
}
