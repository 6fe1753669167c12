//! Release discovery.
//!
//! Walks the version space of one tool platform forward, probing the download
//! host for each candidate. Any hit resets the walk to patch steps; two misses
//! in a row escalate to the next coarser component, and two misses at the
//! major level end the walk.

use crate::api::{self, MetadataStore};
use crate::archive::prepare_binary;
use crate::download::{download_file, is_loopback, probe};
use crate::error::{Error, Result};
use crate::platform::{get_system_info, PlatformInfo};
use crate::template::DownloadUrlTemplate;
use crate::types::*;
use crate::version::{get_binary_version, increment, parse_version, Component};
use semver::Version;
use std::io::Write;
use std::time::Duration;

/// Pause between probes against a remote download host.
pub const PROBE_DELAY: Duration = Duration::from_millis(500);

/// Misses tolerated at one granularity before escalating.
const MISSES_BEFORE_ESCALATION: u32 = 1;

/// Where a discovery run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartVersion {
    /// One patch above the recorded latest version, or `0.0.1`.
    Next,
    /// The recorded earliest version, re-checking everything after it.
    Earliest,
    Exact(Version),
}

impl StartVersion {
    /// `""` means [`StartVersion::Next`], `"earliest"` selects
    /// [`StartVersion::Earliest`]; anything else must be a version.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "" => Ok(StartVersion::Next),
            "earliest" => Ok(StartVersion::Earliest),
            other => Ok(StartVersion::Exact(parse_version(other)?)),
        }
    }
}

/// Escalation state of one tool platform walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeState {
    pub version: Version,
    pub step: Component,
    pub miss_streak: u32,
}

impl ProbeState {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            step: Component::Patch,
            miss_streak: 0,
        }
    }

    pub fn record_hit(&mut self) {
        self.step = Component::Patch;
        self.miss_streak = 0;
    }

    /// Count a miss. Returns `false` once the major component is exhausted
    /// and the walk is over.
    pub fn record_miss(&mut self) -> bool {
        self.miss_streak += 1;
        if self.miss_streak > MISSES_BEFORE_ESCALATION {
            match self.step.escalate() {
                Some(next) => {
                    self.step = next;
                    self.miss_streak = 0;
                }
                None => return false,
            }
        }
        true
    }

    pub fn advance(&mut self) {
        self.version = increment(&self.version, self.step);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ProbeResult {
    Skipped,
    Added,
    Missed,
}

/// Versions recorded by one discovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub added: Vec<Version>,
}

pub struct Discoverer<'a> {
    store: &'a dyn MetadataStore,
    client: reqwest::Client,
    host: PlatformInfo,
}

impl<'a> Discoverer<'a> {
    pub fn new(store: &'a dyn MetadataStore, client: reqwest::Client) -> Self {
        Self {
            store,
            client,
            host: get_system_info(),
        }
    }

    /// Discover new releases of `tool` on its platform and record them.
    pub async fn discover(
        &self,
        out: &mut dyn Write,
        tool: &Tool,
        start: &StartVersion,
    ) -> Result<DiscoveryReport> {
        let tool_meta = api::get_tool_meta(self.store, tool).await?;
        let template = DownloadUrlTemplate::parse(&tool_meta.download_url_template)?;
        let ignored: Vec<Version> = tool_meta
            .ignored_versions
            .iter()
            .filter_map(|v| match parse_version(v) {
                Ok(version) => Some(version),
                Err(_) => {
                    tracing::warn!("Ignoring unparsable ignored version '{}' of {}", v, tool.name);
                    None
                }
            })
            .collect();

        let mut state = ProbeState::new(self.initial_version(tool, start).await?);
        let mut report = DiscoveryReport::default();
        tracing::info!("Discovering {} starting at v{}", tool, state.version);

        loop {
            let candidate = tool.clone().with_version(state.version.to_string());

            let (result, url) = if ignored.contains(&state.version) {
                writeln!(out, "{} ignored", candidate)?;
                (ProbeResult::Skipped, None)
            } else {
                self.probe_version(out, &tool_meta, &template, &candidate, &mut report)
                    .await?
            };

            match result {
                ProbeResult::Skipped | ProbeResult::Added => state.record_hit(),
                ProbeResult::Missed => {
                    if !state.record_miss() {
                        tracing::info!("Finished discovering {}", tool);
                        return Ok(report);
                    }
                }
            }

            state.advance();

            if let Some(delay) = delay_after(url.as_deref()) {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Check one candidate version. Returns the outcome and the probed URL
    /// (`None` when the network was not touched).
    async fn probe_version(
        &self,
        out: &mut dyn Write,
        tool_meta: &ToolMeta,
        template: &DownloadUrlTemplate,
        candidate: &Tool,
        report: &mut DiscoveryReport,
    ) -> Result<(ProbeResult, Option<String>)> {
        match api::get_tool_platform_version_meta(self.store, candidate).await {
            Ok(_) => {
                writeln!(out, "{} already added", candidate)?;
                return Ok((ProbeResult::Skipped, None));
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let url = template.render(candidate);
        writeln!(out, "{} ...", candidate)?;
        writeln!(out, "URL: {}", url)?;

        let status = probe(&self.client, &url).await?;
        if !status.is_success() {
            writeln!(out, "HTTP status: {}", status.as_u16())?;
            return Ok((ProbeResult::Missed, Some(url)));
        }

        self.add_version(out, tool_meta, candidate, &url).await?;
        report.added.push(parse_version(&candidate.version)?);
        Ok((ProbeResult::Added, Some(url)))
    }

    async fn initial_version(&self, tool: &Tool, start: &StartVersion) -> Result<Version> {
        match start {
            StartVersion::Exact(version) => Ok(version.clone()),
            StartVersion::Earliest => match api::get_tool_platform_meta(self.store, tool).await {
                Ok(meta) => parse_version(&meta.version.earliest),
                Err(e) if e.is_not_found() => {
                    tracing::info!("No releases of {} recorded yet, starting from scratch", tool);
                    Ok(increment(&Version::new(0, 0, 0), Component::Patch))
                }
                Err(e) => Err(e),
            },
            StartVersion::Next => {
                let latest = match api::get_latest_version(self.store, tool).await {
                    Ok(version) => version,
                    Err(e) if e.is_not_found() => Version::new(0, 0, 0),
                    Err(Error::InvalidVersion(raw)) => {
                        tracing::warn!("Invalid latest version '{}' recorded for {}", raw, tool);
                        Version::new(0, 0, 0)
                    }
                    Err(e) => return Err(e),
                };
                Ok(increment(&latest, Component::Patch))
            }
        }
    }

    /// Download a newly found release, verify it when it can run on this
    /// machine, and record it.
    async fn add_version(
        &self,
        out: &mut dyn Write,
        tool_meta: &ToolMeta,
        tool: &Tool,
        url: &str,
    ) -> Result<()> {
        let temp_dir = tempfile::Builder::new().prefix("toolctl-").tempdir()?;
        let (downloaded, sha256) = download_file(&self.client, url, temp_dir.path()).await?;

        if self.host.matches(&tool.os, &tool.arch) {
            let binary = prepare_binary(tool, &downloaded)?;
            let expected = parse_version(&tool.version)?;
            let actual = get_binary_version(&binary, &tool_meta.version_args)?;
            if actual != expected {
                return Err(Error::VersionMismatch { expected, actual });
            }
        } else {
            tracing::debug!("Not verifying {} on {}/{}", tool, self.host.os, self.host.arch);
        }

        writeln!(out, "SHA256: {}", sha256)?;

        let release = ToolPlatformVersionMeta {
            url: url.to_string(),
            sha256,
        };
        api::save_tool_platform_version_meta(self.store, tool, &release).await?;
        update_tool_platform_meta(self.store, tool).await
    }
}

/// Pause owed to the download host after probing `url`. Nothing is owed when
/// the network was not touched or the host is a loopback address.
fn delay_after(url: Option<&str>) -> Option<Duration> {
    match url {
        Some(url) if !is_loopback(url) => Some(PROBE_DELAY),
        _ => None,
    }
}

/// Widen the recorded `[earliest, latest]` bounds to include `tool.version`.
/// Unparsable bounds are treated as unset.
pub async fn update_tool_platform_meta(store: &dyn MetadataStore, tool: &Tool) -> Result<()> {
    let mut meta = match api::get_tool_platform_meta(store, tool).await {
        Ok(meta) => meta,
        Err(e) if e.is_not_found() => ToolPlatformMeta::default(),
        Err(e) => return Err(e),
    };

    let version = parse_version(&tool.version)?;
    let earliest = parse_version(&meta.version.earliest)
        .unwrap_or_else(|_| Version::new(42, 0, 0));
    let latest = parse_version(&meta.version.latest).unwrap_or_else(|_| Version::new(0, 0, 0));

    meta.version.earliest = earliest.min(version.clone()).to_string();
    meta.version.latest = latest.max(version).to_string();

    api::save_tool_platform_meta(store, tool, &meta).await
}
