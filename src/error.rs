use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while talking to the metadata store, the
/// download host or the local filesystem.
///
/// `NotFound` is the only recoverable kind; callers check for it with
/// [`Error::is_not_found`]. Every other variant aborts the current tool.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} could not be found")]
    NotFound(String),

    #[error("{0} is not supported by the read-only remote API")]
    Unsupported(&'static str),

    #[error("SHA256 hash mismatch, wanted {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        expected: semver::Version,
        actual: semver::Version,
    },

    #[error("installation failed: expected v{expected}, but installed v{actual}")]
    InstalledVersionMismatch {
        expected: semver::Version,
        actual: semver::Version,
    },

    #[error("failed to locate extracted binary for {0}")]
    BinaryNotLocated(String),

    #[error("{name} v{version} is an ignored version and cannot be installed")]
    IgnoredVersion {
        name: String,
        version: semver::Version,
    },

    #[error("{0} is not installed")]
    NotInstalled(String),

    #[error("{name} is already at v{installed}, but the latest version is v{latest}")]
    InstalledAhead {
        name: String,
        installed: semver::Version,
        latest: semver::Version,
    },

    #[error("could not determine installed version: {stderr}")]
    VersionCommand { stderr: String },

    #[error("could not find version in output: {0}")]
    VersionNotReported(String),

    #[error("invalid version '{0}'")]
    InvalidVersion(String),

    #[error("invalid download URL template: {0}")]
    Template(String),

    #[error("unexpected status code {status} for {url}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("unsupported archive format: {}", .0.display())]
    UnsupportedArchive(PathBuf),

    #[error("install directory {0} does not exist")]
    InstallDirMissing(String),

    #[error("{dir} is not writable, try running:\n  sudo toolctl {command} {args}")]
    InstallDirNotWritable {
        dir: String,
        command: &'static str,
        args: String,
    },

    #[error("config key '{0}' could not be found")]
    MissingConfig(&'static str),

    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
