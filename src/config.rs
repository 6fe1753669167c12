use crate::error::{Error, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "toolctl";
pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const DEFAULT_REMOTE_API_BASE_URL: &str = "https://raw.githubusercontent.com/toolctl/api/main/v0/";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(
        rename = "RemoteAPIBaseURL",
        alias = "remoteapibaseurl",
        default = "default_remote_api_base_url"
    )]
    pub remote_api_base_url: String,
    #[serde(rename = "InstallDir", alias = "installdir", default = "default_install_dir")]
    pub install_dir: PathBuf,
    #[serde(
        rename = "LocalAPIBasePath",
        alias = "localapibasepath",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub local_api_base_path: Option<PathBuf>,
}

fn default_remote_api_base_url() -> String {
    DEFAULT_REMOTE_API_BASE_URL.to_string()
}

fn default_install_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".local")
        .join("bin")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            remote_api_base_url: default_remote_api_base_url(),
            install_dir: default_install_dir(),
            local_api_base_path: None,
        }
    }
}

impl Settings {
    pub fn require_local_api_base_path(&self) -> Result<PathBuf> {
        match &self.local_api_base_path {
            Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
            _ => Err(Error::MissingConfig("LocalAPIBasePath")),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("TOOLCTL_REMOTE_API_BASE_URL") {
            self.remote_api_base_url = url;
        }

        if let Ok(dir) = std::env::var("TOOLCTL_INSTALL_DIR") {
            self.install_dir = PathBuf::from(dir);
        }

        if let Ok(path) = std::env::var("TOOLCTL_LOCAL_API_BASE_PATH") {
            self.local_api_base_path = Some(PathBuf::from(path));
        }
    }
}

pub fn get_config_file_path() -> anyhow::Result<PathBuf> {
    let path = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join(APP_NAME)
        .join(CONFIG_FILE_NAME);
    tracing::debug!("Config file path: {}", path.display());
    Ok(path)
}

/// Load settings from `explicit_path` or the default config file, then apply
/// `TOOLCTL_*` environment overrides. A missing default file yields defaults.
pub fn load_settings(explicit_path: Option<&Path>) -> anyhow::Result<Settings> {
    let config_path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => get_config_file_path()?,
    };

    let mut settings = if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Could not read config file at {}", config_path.display()))?;
        parse_settings(&content)
            .with_context(|| format!("Error reading config file {}", config_path.display()))?
    } else if explicit_path.is_some() {
        anyhow::bail!("Config file {} does not exist", config_path.display());
    } else {
        Settings::default()
    };

    settings.apply_env_overrides();
    Ok(settings)
}

fn parse_settings(content: &str) -> Result<Settings> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    Ok(serde_yaml::from_str(content)?)
}
