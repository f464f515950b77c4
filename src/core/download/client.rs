use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::header::LOCATION;
use reqwest::{Client, Response, StatusCode, Url};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::{build_http_client, MAX_REDIRECTS};
use crate::core::error::{UtilError, UtilResult};

/// Where a successfully opened address reads from.
enum Body {
    Remote(Response),
    Local(PathBuf),
}

/// Fetches strings, bytes and files over HTTP(S) or from `file:` URLs.
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new() -> UtilResult<Self> {
        Ok(Self {
            client: build_http_client()?,
        })
    }

    /// Use a caller-built client. It should have redirects disabled, as
    /// [`super::http_client_builder`] does, or redirects are followed silently.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    // ── Fetching ────────────────────────────────────────

    pub async fn download_bytes(&self, url: &str) -> UtilResult<Vec<u8>> {
        match self.open(url).await? {
            Body::Remote(response) => Ok(response.bytes().await?.to_vec()),
            Body::Local(path) => tokio::fs::read(&path)
                .await
                .map_err(|e| UtilError::io(&path, e)),
        }
    }

    pub async fn download_string(&self, url: &str) -> UtilResult<String> {
        let bytes = self.download_bytes(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Download `url` to `target`, creating parent directories and replacing
    /// any existing file. A partially written file is removed on failure.
    pub async fn download_file(&self, target: &Path, url: &str) -> UtilResult<()> {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| UtilError::io(parent, e))?;
        }

        match self.open(url).await? {
            Body::Local(path) => {
                tokio::fs::copy(&path, target)
                    .await
                    .map_err(|e| UtilError::io(&path, e))?;
            }
            Body::Remote(response) => {
                if let Err(e) = write_body(response, target).await {
                    let _ = tokio::fs::remove_file(target).await;
                    return Err(e);
                }
            }
        }

        debug!("Downloaded {} -> {:?}", url, target);
        Ok(())
    }

    // ── Lenient variants ────────────────────────────────

    /// [`Self::download_string`], logging and swallowing failures.
    pub async fn try_download_string(&self, silent: bool, url: &str) -> Option<String> {
        match self.download_string(url).await {
            Ok(text) => Some(text),
            Err(e) => {
                if !silent {
                    warn!("Failed to download {}: {}", url, e);
                }
                None
            }
        }
    }

    /// [`Self::download_file`], logging and swallowing failures.
    pub async fn try_download_file(&self, silent: bool, target: &Path, url: &str) -> bool {
        match self.download_file(target, url).await {
            Ok(()) => true,
            Err(e) => {
                if !silent {
                    warn!("Failed to download {} to {:?}: {}", url, target, e);
                }
                false
            }
        }
    }

    // ── Connection ──────────────────────────────────────

    async fn open(&self, address: &str) -> UtilResult<Body> {
        let mut url = Url::parse(address).map_err(|e| UtilError::InvalidUrl {
            url: address.to_string(),
            reason: e.to_string(),
        })?;

        if url.scheme() == "file" {
            let path = url.to_file_path().map_err(|_| UtilError::InvalidUrl {
                url: address.to_string(),
                reason: "not a local file path".to_string(),
            })?;
            return Ok(Body::Local(path));
        }
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UtilError::InvalidUrl {
                url: address.to_string(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }

        let mut redirections: Vec<String> = Vec::new();
        loop {
            let response = self.client.get(url.clone()).send().await?;
            let status = response.status();

            if status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND {
                let Some(location) = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string)
                else {
                    return Err(UtilError::InvalidUrl {
                        url: url.to_string(),
                        reason: format!(
                            "no location header in redirect -- previous redirections: [{}]",
                            redirections.join(", ")
                        ),
                    });
                };

                debug!("Redirected {} -> {}", url, location);
                redirections.push(location.clone());
                if redirections.len() == MAX_REDIRECTS {
                    return Err(UtilError::TooManyRedirects {
                        url: address.to_string(),
                        redirections,
                    });
                }

                url = url.join(&location).map_err(|e| UtilError::InvalidUrl {
                    url: location,
                    reason: e.to_string(),
                })?;
                continue;
            }

            if status == StatusCode::NOT_FOUND {
                return Err(UtilError::NotFound(address.to_string()));
            }
            if !status.is_success() {
                return Err(UtilError::DownloadFailed {
                    url: address.to_string(),
                    status: status.as_u16(),
                });
            }
            return Ok(Body::Remote(response));
        }
    }
}

async fn write_body(response: Response, target: &Path) -> UtilResult<()> {
    let mut file = tokio::fs::File::create(target)
        .await
        .map_err(|e| UtilError::io(target, e))?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|e| UtilError::io(target, e))?;
    }
    file.flush().await.map_err(|e| UtilError::io(target, e))?;
    Ok(())
}
