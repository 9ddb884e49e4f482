use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

pub const USER_AGENT: &str = concat!("SpicetifyMarketplaceInstaller/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("download of {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("failed to write {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub fn transport(url: &str, message: impl std::fmt::Display) -> Self {
        Self::Transport {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}

/// One-shot HTTPS downloads. No retries; callers decide what a failure means.
pub trait ArtifactFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Option<Duration>) -> anyhow::Result<Self> {
        // `None` clears reqwest's 30s blocking default: downloads are unbounded
        // unless a timeout is configured.
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| anyhow::anyhow!("failed to build HTTP client: {err}"))?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, FetchError> {
        tracing::info!(url, "downloading");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| FetchError::transport(url, err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::transport(url, format!("HTTP status {status}")));
        }
        Ok(response)
    }
}

impl ArtifactFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let bytes = self
            .get(url)?
            .bytes()
            .map_err(|err| FetchError::transport(url, err))?;
        tracing::info!(url, bytes = bytes.len(), "download complete");
        Ok(bytes.to_vec())
    }

    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let text = self
            .get(url)?
            .text()
            .map_err(|err| FetchError::transport(url, err))?;
        tracing::info!(url, chars = text.len(), "download complete");
        Ok(text)
    }
}

/// Downloads `url` as text and writes it to `path`, replacing any existing file.
pub fn fetch_text_to_path(
    fetcher: &dyn ArtifactFetcher,
    url: &str,
    path: &Path,
) -> Result<(), FetchError> {
    let text = fetcher.fetch_text(url)?;
    fs::write(path, text).map_err(|source| FetchError::Storage {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(url, path = %path.display(), "saved download");
    Ok(())
}
