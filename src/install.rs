use crate::api::{self, MetadataStore};
use crate::archive::{prepare_binary, set_executable};
use crate::download::download_file;
use crate::error::{Error, Result};
use crate::output::{quote_if_spaced, ToolPrefix};
use crate::search_path::SearchPath;
use crate::types::*;
use crate::version::{get_binary_version, parse_version};
use semver::Version;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed { version: Version, path: PathBuf },
    /// Something named like the tool is already on the search path; it was
    /// left untouched. `version` is `None` when it could not report one.
    AlreadyInstalled {
        path: PathBuf,
        version: Option<Version>,
    },
}

/// A tool pinned to the version about to be installed.
pub(crate) struct Resolved {
    tool: Tool,
    tool_meta: ToolMeta,
    latest: Option<Version>,
    target: Version,
}

/// Resolves release records and places verified binaries into the install
/// directory.
pub struct Installer<'a> {
    store: &'a dyn MetadataStore,
    client: reqwest::Client,
    install_dir: PathBuf,
    search_path: SearchPath,
    prefix: ToolPrefix,
}

impl<'a> Installer<'a> {
    pub fn new(
        store: &'a dyn MetadataStore,
        client: reqwest::Client,
        install_dir: impl Into<PathBuf>,
        search_path: SearchPath,
    ) -> Self {
        Self {
            store,
            client,
            install_dir: install_dir.into(),
            search_path,
            prefix: ToolPrefix::default(),
        }
    }

    pub fn with_prefix(mut self, prefix: ToolPrefix) -> Self {
        self.prefix = prefix;
        self
    }

    pub(crate) fn store(&self) -> &'a dyn MetadataStore {
        self.store
    }

    pub(crate) fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub(crate) fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    pub(crate) fn prefix(&self) -> ToolPrefix {
        self.prefix
    }

    pub async fn install(&self, out: &mut dyn Write, tool: &Tool) -> Result<InstallOutcome> {
        let resolved = self.resolve(tool).await?;

        if let Some(installed_path) = self.search_path.which(&resolved.tool.name) {
            return self.report_installed(
                out,
                &resolved.tool,
                &resolved.tool_meta,
                installed_path,
                resolved.latest.as_ref(),
            );
        }

        let (version, path) = self.place(out, resolved).await?;
        Ok(InstallOutcome::Installed { version, path })
    }

    /// Pin `tool` to a concrete version: the requested one, or the latest.
    pub(crate) async fn resolve(&self, tool: &Tool) -> Result<Resolved> {
        let tool_meta = api::get_tool_meta(self.store, tool).await?;

        let latest = match api::get_latest_version(self.store, tool).await {
            Ok(latest) => Some(latest),
            Err(e) if e.is_not_found() && !tool.version.is_empty() => None,
            Err(e) => return Err(e),
        };

        let mut tool = tool.clone();
        let target = match &latest {
            Some(latest) if tool.version.is_empty() => latest.clone(),
            _ => parse_version(&tool.version)?,
        };
        tool.version = target.to_string();

        let ignored = tool_meta
            .ignored_versions
            .iter()
            .any(|v| parse_version(v).is_ok_and(|v| v == target));
        if ignored {
            return Err(Error::IgnoredVersion {
                name: tool.name,
                version: target,
            });
        }

        Ok(Resolved {
            tool,
            tool_meta,
            latest,
            target,
        })
    }

    /// Download, verify and move the resolved release into the install
    /// directory. The search path is not consulted.
    pub(crate) async fn place(
        &self,
        out: &mut dyn Write,
        resolved: Resolved,
    ) -> Result<(Version, PathBuf)> {
        let Resolved {
            tool,
            tool_meta,
            target,
            ..
        } = resolved;

        writeln!(
            out,
            "{}",
            self.prefix.line(&tool.name, &format!("👷 Installing v{} ...", target))
        )?;

        let release = api::get_tool_platform_version_meta(self.store, &tool).await?;

        let temp_dir = tempfile::Builder::new().prefix("toolctl-install-").tempdir()?;
        let (downloaded, sha256) = download_file(&self.client, &release.url, temp_dir.path()).await?;
        if !sha256.eq_ignore_ascii_case(&release.sha256) {
            return Err(Error::ChecksumMismatch {
                expected: release.sha256,
                actual: sha256,
            });
        }

        let binary = prepare_binary(&tool, &downloaded)?;
        let install_path = self.install_dir.join(&tool.name);
        move_into_place(&binary, &install_path)?;
        tracing::info!("Installed {} to {}", tool, install_path.display());

        // The binary stays in place on mismatch so it can be inspected.
        let installed = get_binary_version(&install_path, &tool_meta.version_args)?;
        if installed != target {
            return Err(Error::InstalledVersionMismatch {
                expected: target,
                actual: installed,
            });
        }

        writeln!(out, "{}", self.prefix.line(&tool.name, "🎉 Successfully installed"))?;

        Ok((target, install_path))
    }

    fn report_installed(
        &self,
        out: &mut dyn Write,
        tool: &Tool,
        tool_meta: &ToolMeta,
        installed_path: PathBuf,
        latest: Option<&Version>,
    ) -> Result<InstallOutcome> {
        let version = match get_binary_version(&installed_path, &tool_meta.version_args) {
            Ok(version) => {
                let mut message = format!("🤷 v{} is already installed", version);
                if latest == Some(&version) {
                    message = format!("🤷 v{} (the latest version) is already installed", version);
                }
                writeln!(out, "{}", self.prefix.line(&tool.name, &message))?;
                Some(version)
            }
            Err(Error::VersionCommand { .. }) => {
                writeln!(
                    out,
                    "{}",
                    self.prefix
                        .line(&tool.name, "🤷 Unknown version is already installed")
                )?;
                None
            }
            Err(e) => return Err(e),
        };

        writeln!(
            out,
            "{}",
            self.prefix.line(
                &tool.name,
                &format!("💁 For more details run: toolctl info {}", tool.name)
            )
        )?;

        Ok(InstallOutcome::AlreadyInstalled {
            path: installed_path,
            version,
        })
    }
}

/// Copy `src` next to `dest` and rename it over `dest`, so the install
/// directory never holds a partially written binary.
fn move_into_place(src: &Path, dest: &Path) -> Result<()> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let staged = NamedTempFile::new_in(dir)?;
    fs::copy(src, staged.path())?;
    set_executable(staged.path())?;
    // Dropping the returned handle closes the file before anything runs it.
    drop(staged.persist(dest).map_err(|e| e.error)?);
    Ok(())
}

/// The install directory must exist and be writable. Not being on the search
/// path only earns a warning.
pub fn check_install_dir(
    out: &mut dyn Write,
    install_dir: &Path,
    search_path: &SearchPath,
    command: &'static str,
    tools: &[Tool],
) -> Result<()> {
    let display = quote_if_spaced(&install_dir.to_string_lossy());

    if !install_dir.is_dir() {
        return Err(Error::InstallDirMissing(display));
    }

    if tempfile::tempfile_in(install_dir).is_err() {
        let args: Vec<String> = tools.iter().map(|t| t.name.clone()).collect();
        return Err(Error::InstallDirNotWritable {
            dir: display,
            command,
            args: args.join(" "),
        });
    }

    if !search_path.contains(install_dir) {
        writeln!(out, "🚨 {} is not in $PATH", display)?;
    }

    Ok(())
}
