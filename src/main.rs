mod api;
mod archive;
mod catalog;
mod cli;
mod config;
mod discover;
mod download;
mod error;
mod info;
mod install;
mod output;
mod platform;
mod search_path;
mod template;
mod tool_id;
mod types;
mod upgrade;
mod version;

#[cfg(test)]
mod test_support;

use anyhow::{anyhow, Result};
use api::{LocalStore, Location, MetadataStore};
use catalog::ListLayout;
use clap::Parser;
use cli::{ApiAction, Cli, Commands, DiscoverArgs};
use config::Settings;
use discover::{Discoverer, StartVersion};
use install::{check_install_dir, InstallOutcome, Installer};
use output::ToolPrefix;
use platform::get_system_info;
use search_path::SearchPath;
use serde::Serialize;
use std::io::{self, Write};
use tool_id::{parse_tool_args, strip_versions};
use types::Tool;
use upgrade::{UpgradeGuard, UpgradeOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli)?;

    let settings = config::load_settings(cli.config.as_deref())?;
    tracing::debug!("Install directory: {}", settings.install_dir.display());

    let mut out = io::stdout();
    run(&cli, &settings, &mut out).await
}

async fn run(cli: &Cli, settings: &Settings, out: &mut dyn Write) -> Result<()> {
    let location = if cli.local {
        Location::Local
    } else {
        Location::Remote
    };
    let client = download::http_client()?;

    match &cli.command {
        Commands::Version { short } => print_version(out, *short)?,

        Commands::Install { tools } => {
            let tools = parse_args(tools, "install", true)?;
            let store = api::open_store(settings, &client, location)?;
            tracing::debug!("Installing from the {:?} API", store.location());
            let search_path = SearchPath::from_env();
            check_install_dir(out, &settings.install_dir, &search_path, "install", &tools)?;

            let installer = Installer::new(store.as_ref(), client, &settings.install_dir, search_path)
                .with_prefix(ToolPrefix::for_tools(&tools));
            for tool in &tools {
                match installer.install(out, tool).await? {
                    InstallOutcome::Installed { version, path } => {
                        tracing::info!("{} v{} installed at {}", tool.name, version, path.display())
                    }
                    InstallOutcome::AlreadyInstalled { path, version } => tracing::info!(
                        "{} left in place at {} ({:?})",
                        tool.name,
                        path.display(),
                        version
                    ),
                }
            }
        }

        Commands::Upgrade { tools } => {
            let tools = parse_args(tools, "upgrade", false)?;
            let store = api::open_store(settings, &client, location)?;
            let search_path = SearchPath::from_env();
            check_install_dir(out, &settings.install_dir, &search_path, "upgrade", &tools)?;

            let installer = Installer::new(store.as_ref(), client, &settings.install_dir, search_path)
                .with_prefix(ToolPrefix::for_tools(&tools));
            let guard = UpgradeGuard::new(&installer);
            for tool in &tools {
                match guard.upgrade(out, tool).await? {
                    UpgradeOutcome::Upgraded { from, to } => {
                        tracing::info!("Upgraded {} from v{} to v{}", tool.name, from, to)
                    }
                    UpgradeOutcome::UpToDate(version) => {
                        tracing::debug!("{} is at v{}", tool.name, version)
                    }
                    UpgradeOutcome::SkippedForeignDir { path } => {
                        tracing::warn!("Not upgrading {}", path.display())
                    }
                    UpgradeOutcome::SkippedSymlink { path, target } => tracing::warn!(
                        "Not upgrading {} (links to {})",
                        path.display(),
                        target.display()
                    ),
                }
            }
        }

        Commands::Info { tools } => {
            let tools = parse_args(tools, "info", false)?;
            let store = api::open_store(settings, &client, location)?;
            let search_path = SearchPath::from_env();
            let prefix = ToolPrefix::for_tools(&tools);
            for tool in &tools {
                info::show_info(out, store.as_ref(), &search_path, prefix, tool).await?;
            }
        }

        Commands::List { all } => {
            let store = api::open_store(settings, &client, location)?;
            catalog::list(
                out,
                store.as_ref(),
                &SearchPath::from_env(),
                *all,
                ListLayout::for_stdout(),
            )
            .await?;
        }

        Commands::Api { action } => {
            // Writing records needs the local store regardless of --local.
            let store = LocalStore::new(settings.require_local_api_base_path()?);
            match action {
                ApiAction::Discover(args) => discover_all(out, &store, client, args).await?,
                ApiAction::Sync => {
                    let meta = catalog::sync(&store).await?;
                    tracing::info!("Synced {} tools", meta.tools.len());
                }
            }
        }
    }

    Ok(())
}

async fn discover_all(
    out: &mut dyn Write,
    store: &LocalStore,
    client: reqwest::Client,
    args: &DiscoverArgs,
) -> Result<()> {
    let names = if args.tools.is_empty() {
        api::get_meta(store).await?.tools
    } else {
        args.tools.clone()
    };

    let discoverer = Discoverer::new(store as &dyn MetadataStore, client);
    for name in &names {
        for os in &args.os {
            for arch in &args.arch {
                let requested = tool_id::parse_tool_arg(name, os, arch, true)?;
                let start = StartVersion::parse(&requested.version)?;
                let tool = Tool::new(&requested.name, os, arch);
                let report = discoverer.discover(out, &tool, &start).await?;
                tracing::info!("Added {} versions of {}", report.added.len(), tool);
            }
        }
    }

    Ok(())
}

/// Parse tool arguments for the host platform, suggesting a corrected command
/// line when versions are given where none are allowed.
fn parse_args(args: &[String], command: &str, version_allowed: bool) -> Result<Vec<Tool>> {
    let host = get_system_info();
    parse_tool_args(args, &host.os, &host.arch, version_allowed).map_err(|e| {
        anyhow!(
            "{}, try this instead:\n  toolctl {} {}",
            e,
            command,
            strip_versions(args).join(" ")
        )
    })
}

#[derive(Serialize)]
struct VersionInfo {
    #[serde(rename = "GitVersion")]
    git_version: &'static str,
    #[serde(rename = "GitCommit")]
    git_commit: &'static str,
}

fn print_version(out: &mut dyn Write, short: bool) -> Result<()> {
    let info = VersionInfo {
        git_version: cli::git_version(),
        git_commit: cli::git_commit(),
    };
    if short {
        writeln!(out, "{}", info.git_version)?;
    } else {
        writeln!(out, "{}", serde_json::to_string_pretty(&info)?)?;
    }
    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}
