use crate::api::{self, MetadataStore};
use crate::error::{Error, Result};
use crate::output::{quote_if_spaced, ToolPrefix};
use crate::search_path::SearchPath;
use crate::types::Tool;
use crate::version::get_binary_version;
use std::fs;
use std::io::Write;

/// Print what is known about `tool` and how it is installed locally.
pub async fn show_info(
    out: &mut dyn Write,
    store: &dyn MetadataStore,
    search_path: &SearchPath,
    prefix: ToolPrefix,
    tool: &Tool,
) -> Result<()> {
    let tool_meta = api::get_tool_meta(store, tool).await?;

    let latest = match api::get_latest_version(store, tool).await {
        Ok(latest) => latest,
        Err(e) if e.is_not_found() => {
            return Err(Error::InvalidArgument(format!(
                "{} not supported on this platform",
                tool.name
            )))
        }
        Err(e) => return Err(e),
    };

    let line = |message: &str| prefix.line(&tool.name, message);

    writeln!(
        out,
        "{}",
        line(&format!("✨ {} v{}: {}", tool.name, latest, tool_meta.description))
    )?;

    let Some(installed_path) = search_path.which(&tool.name) else {
        writeln!(out, "{}", line(&format!("🏠 {}", tool_meta.homepage)))?;
        writeln!(out, "{}", line("❌ Not installed"))?;
        return Ok(());
    };

    let shown_path = quote_if_spaced(&installed_path.to_string_lossy());
    match get_binary_version(&installed_path, &tool_meta.version_args) {
        Ok(installed) => {
            let mark = if installed == latest { "✅" } else { "🔄" };
            writeln!(
                out,
                "{}",
                line(&format!(
                    "{} {} v{} is installed at {}",
                    mark, tool.name, installed, shown_path
                ))
            )?;
        }
        Err(e @ Error::VersionCommand { .. }) => {
            writeln!(out, "{}", line(&e.to_string()))?;
        }
        Err(e) => return Err(e),
    }

    if fs::symlink_metadata(&installed_path)?.file_type().is_symlink() {
        let target = fs::canonicalize(&installed_path)?;
        writeln!(
            out,
            "{}",
            line(&format!(
                "🔗 Symlinked from {}",
                quote_if_spaced(&target.to_string_lossy())
            ))
        )?;
    }

    Ok(())
}
