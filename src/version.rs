use crate::error::{Error, Result};
use regex::Regex;
use semver::Version;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

/// The part of a semantic version that the discovery walk increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Patch,
    Minor,
    Major,
}

impl Component {
    /// Next coarser component, `None` once `Major` is exhausted.
    pub fn escalate(self) -> Option<Component> {
        match self {
            Component::Patch => Some(Component::Minor),
            Component::Minor => Some(Component::Major),
            Component::Major => None,
        }
    }
}

pub fn increment(version: &Version, component: Component) -> Version {
    match component {
        Component::Patch => Version::new(version.major, version.minor, version.patch + 1),
        Component::Minor => Version::new(version.major, version.minor + 1, 0),
        Component::Major => Version::new(version.major + 1, 0, 0),
    }
}

/// Lenient parse for version strings coming from curated records and the
/// command line: a leading `v` is accepted and missing minor/patch parts
/// default to zero.
pub fn parse_version(raw: &str) -> Result<Version> {
    let trimmed = raw.trim();
    let clean = trimmed.strip_prefix('v').unwrap_or(trimmed);

    if let Ok(version) = Version::parse(clean) {
        return Ok(version);
    }

    let parts: Vec<&str> = clean.split('.').collect();
    if parts.len() < 3 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit())) {
        let mut padded = parts.join(".");
        for _ in parts.len()..3 {
            padded.push_str(".0");
        }
        if let Ok(version) = Version::parse(&padded) {
            return Ok(version);
        }
    }

    Err(Error::InvalidVersion(raw.to_string()))
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+\.\d+\.\d+)").expect("static regex"))
}

/// Extract the first `X.Y.Z` from a binary's version output.
pub fn find_version(output: &str) -> Option<Version> {
    version_regex()
        .captures(output)
        .and_then(|caps| Version::parse(&caps[1]).ok())
}

/// Run `binary version_args...` and parse the version it reports about itself.
pub fn get_binary_version(binary: &Path, version_args: &[String]) -> Result<Version> {
    tracing::debug!(
        "Executing {} {}",
        binary.display(),
        version_args.join(" ")
    );

    let output = Command::new(binary).args(version_args).output()?;

    if !output.status.success() {
        return Err(Error::VersionCommand {
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    if let Some(version) = find_version(&stdout) {
        return Ok(version);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    find_version(&stderr).ok_or_else(|| Error::VersionNotReported(stdout.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_standard_rules() {
        let v = Version::new(0, 1, 3);
        assert_eq!(increment(&v, Component::Patch), Version::new(0, 1, 4));
        assert_eq!(increment(&v, Component::Minor), Version::new(0, 2, 0));
        assert_eq!(increment(&v, Component::Major), Version::new(1, 0, 0));

        // Zero patch components still bump the requested component.
        let v = Version::new(0, 2, 0);
        assert_eq!(increment(&v, Component::Minor), Version::new(0, 3, 0));
        assert_eq!(increment(&v, Component::Major), Version::new(1, 0, 0));
    }

    #[test]
    fn test_increment_drops_prerelease() {
        let v = Version::parse("1.2.3-rc.1").unwrap();
        assert_eq!(increment(&v, Component::Patch), Version::new(1, 2, 4));
    }

    #[test]
    fn test_escalation_order() {
        assert_eq!(Component::Patch.escalate(), Some(Component::Minor));
        assert_eq!(Component::Minor.escalate(), Some(Component::Major));
        assert_eq!(Component::Major.escalate(), None);
    }

    #[test]
    fn test_parse_version_lenient() {
        assert_eq!(parse_version("1.2.3").unwrap(), Version::new(1, 2, 3));
        assert_eq!(parse_version("v1.2.3").unwrap(), Version::new(1, 2, 3));
        assert_eq!(parse_version("1.20").unwrap(), Version::new(1, 20, 0));
        assert_eq!(parse_version("2").unwrap(), Version::new(2, 0, 0));
        assert!(parse_version("latest").is_err());
        assert!(parse_version("").is_err());
        assert!(parse_version("1..2").is_err());
    }

    #[test]
    fn test_find_version_in_output() {
        assert_eq!(
            find_version("Client Version: v1.22.4\nKustomize Version: v4.2.0"),
            Some(Version::new(1, 22, 4))
        );
        assert_eq!(find_version("k9s version 0.25.18"), Some(Version::new(0, 25, 18)));
        assert_eq!(find_version("no version here"), None);
    }

    #[cfg(unix)]
    #[test]
    #[serial_test::serial]
    fn test_get_binary_version_runs_binary() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tool");
        std::fs::write(&path, "#!/bin/sh\necho \"tool version $1-0.3.1\"\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let version = get_binary_version(&path, &["x".to_string()]).unwrap();
        assert_eq!(version, Version::new(0, 3, 1));
    }

    #[cfg(unix)]
    #[test]
    #[serial_test::serial]
    fn test_get_binary_version_failing_command() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tool");
        std::fs::write(&path, "#!/bin/sh\necho broken >&2\nexit 3\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = get_binary_version(&path, &[]).unwrap_err();
        assert!(matches!(err, Error::VersionCommand { ref stderr } if stderr == "broken"));
    }
}
