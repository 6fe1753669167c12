use crate::error::{Error, Result};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use url::{Host, Url};

pub fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("toolctl/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Cheap existence check for a release artifact (HEAD, no body).
pub async fn probe(client: &reqwest::Client, url: &str) -> Result<reqwest::StatusCode> {
    let response = client.head(url).send().await?;
    tracing::debug!("HEAD {} -> {}", url, response.status());
    Ok(response.status())
}

/// Loopback hosts are local test/dev servers and are never throttled.
pub fn is_loopback(url: &str) -> bool {
    match Url::parse(url).ok().as_ref().and_then(Url::host) {
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        Some(Host::Domain(domain)) => domain == "localhost",
        None => false,
    }
}

fn file_name_for(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "download".to_string())
}

/// Download `url` into `dir`, naming the file after the last URL path
/// segment. Returns the file path and the hex SHA256 of its contents.
pub async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dir: &Path,
) -> Result<(PathBuf, String)> {
    let local_path = dir.join(file_name_for(url));
    tracing::info!("Downloading {} to {}", url, local_path.display());

    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(Error::UnexpectedStatus {
            status: response.status(),
            url: url.to_string(),
        });
    }
    let total_size = response.content_length().unwrap_or(0);

    let pb = ProgressBar::new(total_size);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(format!("Downloading {}", file_name_for(url)));

    let mut file = fs::File::create(&local_path)?;
    let mut hasher = Sha256::new();
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        hasher.update(&chunk);
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }
    file.flush()?;
    drop(file);

    pb.finish_and_clear();

    let sha256 = hex::encode(hasher.finalize());
    tracing::debug!("SHA256 of {}: {}", local_path.display(), sha256);
    Ok((local_path, sha256))
}
