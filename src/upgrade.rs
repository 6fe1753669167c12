use crate::api;
use crate::error::{Error, Result};
use crate::install::Installer;
use crate::output::quote_if_spaced;
use crate::types::Tool;
use crate::version::get_binary_version;
use semver::Version;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// What an upgrade did. The two `Skipped*` variants mean no action was taken;
/// they are neither success nor failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    Upgraded { from: Version, to: Version },
    UpToDate(Version),
    SkippedForeignDir { path: PathBuf },
    SkippedSymlink { path: PathBuf, target: PathBuf },
}

/// Replaces outdated binaries, but only ones that live directly in the
/// install directory and are not symlinks.
pub struct UpgradeGuard<'a, 'b> {
    installer: &'b Installer<'a>,
}

impl<'a, 'b> UpgradeGuard<'a, 'b> {
    pub fn new(installer: &'b Installer<'a>) -> Self {
        Self { installer }
    }

    pub async fn upgrade(&self, out: &mut dyn Write, tool: &Tool) -> Result<UpgradeOutcome> {
        let store = self.installer.store();
        let prefix = self.installer.prefix();
        let install_dir = self.installer.install_dir();

        let tool_meta = api::get_tool_meta(store, tool).await?;

        let installed_path = self
            .installer
            .search_path()
            .which(&tool.name)
            .ok_or_else(|| Error::NotInstalled(tool.name.clone()))?;

        let installed_dir = installed_path.parent().unwrap_or_else(|| Path::new("."));
        if !same_dir(installed_dir, install_dir) {
            writeln!(
                out,
                "{}",
                prefix.line(
                    &tool.name,
                    &format!(
                        "⏭️  skipped: {} is currently installed in {}, not in {}",
                        tool.name,
                        quote_if_spaced(&installed_dir.to_string_lossy()),
                        quote_if_spaced(&install_dir.to_string_lossy()),
                    )
                )
            )?;
            return Ok(UpgradeOutcome::SkippedForeignDir {
                path: installed_path,
            });
        }

        let latest = api::get_latest_version(store, tool).await?;
        let installed = get_binary_version(&installed_path, &tool_meta.version_args)?;

        if installed > latest {
            return Err(Error::InstalledAhead {
                name: tool.name.clone(),
                installed,
                latest,
            });
        }

        if installed == latest {
            writeln!(out, "{}", prefix.line(&tool.name, "✅ already up-to-date"))?;
            return Ok(UpgradeOutcome::UpToDate(installed));
        }

        if fs::symlink_metadata(&installed_path)?.file_type().is_symlink() {
            let target = fs::canonicalize(&installed_path)?;
            writeln!(
                out,
                "{}",
                prefix.line(
                    &tool.name,
                    &format!(
                        "⏭️  skipped: {} is symlinked from {}",
                        quote_if_spaced(&installed_path.to_string_lossy()),
                        quote_if_spaced(&target.to_string_lossy()),
                    )
                )
            )?;
            return Ok(UpgradeOutcome::SkippedSymlink {
                path: installed_path,
                target,
            });
        }

        // Everything that can reject the release is checked before removal.
        let resolved = self
            .installer
            .resolve(&Tool {
                version: String::new(),
                ..tool.clone()
            })
            .await?;

        writeln!(
            out,
            "{}",
            prefix.line(
                &tool.name,
                &format!("👷 Upgrading from v{} to v{} ...", installed, latest)
            )
        )?;
        writeln!(
            out,
            "{}",
            prefix.line(&tool.name, &format!("👷 Removing v{} ...", installed))
        )?;
        fs::remove_file(&installed_path)?;
        tracing::info!("Removed {}", installed_path.display());

        // A copy further down the search path must not stand in for the
        // removed one, so the search path is not consulted again.
        let (to, _path) = self.installer.place(out, resolved).await?;
        Ok(UpgradeOutcome::Upgraded {
            from: installed,
            to,
        })
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
