use crate::api::{self, LocalStore, MetadataStore};
use crate::error::Result;
use crate::search_path::SearchPath;
use crate::types::GlobalMeta;
use std::io::Write;
use walkdir::WalkDir;

/// Rebuild `meta.yaml` from the tool directories of the local store.
///
/// Hidden directories (`.git` and friends) are not tools.
pub async fn sync(store: &LocalStore) -> Result<GlobalMeta> {
    let mut tools = Vec::new();
    for entry in WalkDir::new(store.base_path())
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        tools.push(name);
    }

    tracing::info!("Found {} tools", tools.len());
    let meta = GlobalMeta { tools };
    api::save_meta(store, &meta).await?;
    Ok(meta)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListLayout {
    /// One name per line, for pipes.
    Lines,
    /// Padded columns filling a terminal of the given width.
    Columns(usize),
}

impl ListLayout {
    pub fn for_stdout() -> Self {
        let term = console::Term::stdout();
        if term.is_term() {
            let (_rows, cols) = term.size();
            ListLayout::Columns(cols as usize)
        } else {
            ListLayout::Lines
        }
    }
}

pub async fn list(
    out: &mut dyn Write,
    store: &dyn MetadataStore,
    search_path: &SearchPath,
    all: bool,
    layout: ListLayout,
) -> Result<()> {
    let meta = api::get_meta(store).await?;

    let names: Vec<&String> = if all {
        meta.tools.iter().collect()
    } else {
        meta.tools
            .iter()
            .filter(|name| search_path.which(name).is_some())
            .collect()
    };

    if names.is_empty() && !all {
        writeln!(out, "No tools installed")?;
        return Ok(());
    }

    match layout {
        ListLayout::Lines => {
            for name in names {
                writeln!(out, "{}", name)?;
            }
        }
        ListLayout::Columns(width) => {
            let longest = names.iter().map(|n| n.len()).max().unwrap_or(0);
            let per_line = (width / (longest + 3)).max(1);
            for (i, name) in names.iter().enumerate() {
                write!(out, "{:<longest$}   ", name, longest = longest)?;
                if (i + 1) % per_line == 0 {
                    writeln!(out)?;
                }
            }
            writeln!(out)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_sync_lists_tool_directories_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["kustomize", "k9s", ".git", "gh"] {
            fs::create_dir_all(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("README.md"), "catalog").unwrap();
        let store = LocalStore::new(dir.path());

        let meta = sync(&store).await.unwrap();

        assert_eq!(meta.tools, vec!["gh", "k9s", "kustomize"]);
        assert_eq!(api::get_meta(&store).await.unwrap(), meta);
    }

    async fn store_with_tools(tools: &[&str]) -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let meta = GlobalMeta {
            tools: tools.iter().map(|t| t.to_string()).collect(),
        };
        api::save_meta(&store, &meta).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_list_all_as_lines() {
        let (_dir, store) = store_with_tools(&["gh", "k9s"]).await;
        let mut out = Vec::new();
        list(&mut out, &store, &SearchPath::new(&[]), true, ListLayout::Lines)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "gh\nk9s\n");
    }

    #[tokio::test]
    async fn test_list_installed_only() {
        let (_dir, store) = store_with_tools(&["gh", "k9s"]).await;
        let mut out = Vec::new();
        list(&mut out, &store, &SearchPath::new(&[]), false, ListLayout::Lines)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No tools installed\n");

        #[cfg(unix)]
        {
            let bin = tempfile::tempdir().unwrap();
            crate::test_support::install_fake_binary(bin.path(), "k9s", "1.0.0");
            let mut out = Vec::new();
            list(&mut out, &store, &SearchPath::new(&[bin.path()]), false, ListLayout::Lines)
                .await
                .unwrap();
            assert_eq!(String::from_utf8(out).unwrap(), "k9s\n");
        }
    }

    #[tokio::test]
    async fn test_list_columns() {
        let (_dir, store) = store_with_tools(&["gh", "k9s", "kustomize"]).await;
        let mut out = Vec::new();
        list(&mut out, &store, &SearchPath::new(&[]), true, ListLayout::Columns(24))
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "gh          k9s         \nkustomize   \n"
        );
    }
}
