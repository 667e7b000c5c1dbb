use crate::domain::ports::RemoteArchive;
use crate::utils::error::{Result, ToolkitError};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use url::Url;

pub const PRIDE_BASE_URL: &str = "https://ftp.pride.ebi.ac.uk/";

/// A dataset directory on the PRIDE archive's HTTPS mirror (or any server
/// laid out the same way).
#[derive(Debug, Clone)]
pub struct PrideArchive {
    client: Client,
    directory: Url,
    show_progress: bool,
}

impl PrideArchive {
    /// `base_url` is the server root; `path` the dataset directory under it.
    pub fn new(base_url: &str, path: &str) -> Result<Self> {
        let invalid = |reason: String| ToolkitError::InvalidConfigValueError {
            field: "download.base_url".to_string(),
            value: base_url.to_string(),
            reason,
        };

        let mut base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        let path = path.trim_start_matches('/');
        let path = if path.ends_with('/') || path.is_empty() {
            path.to_string()
        } else {
            format!("{}/", path)
        };
        let directory = base.join(&path).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            client: Client::new(),
            directory,
            show_progress: true,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn directory(&self) -> &Url {
        &self.directory
    }

    fn file_url(&self, file_name: &str) -> Result<Url> {
        self.directory
            .join(file_name)
            .map_err(|e| ToolkitError::ConfigError {
                message: format!("cannot build URL for {}: {}", file_name, e),
            })
    }

    fn progress_bar(&self, file_name: &str, total: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = match total {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::new_spinner(),
        };
        if let Ok(style) = ProgressStyle::with_template(
            "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
        ) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message(file_name.to_string());
        bar
    }
}

#[async_trait]
impl RemoteArchive for PrideArchive {
    async fn contains(&self, file_name: &str) -> Result<bool> {
        let url = self.file_url(file_name)?;
        let response = self.client.head(url).send().await?;
        tracing::debug!("HEAD {}: {}", file_name, response.status());

        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(ToolkitError::DownloadError {
                file: file_name.to_string(),
                status: s.as_u16(),
            }),
        }
    }

    async fn fetch(&self, file_name: &str, destination: &Path) -> Result<u64> {
        let url = self.file_url(file_name)?;
        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ToolkitError::DownloadError {
                file: file_name.to_string(),
                status: response.status().as_u16(),
            });
        }

        // Written next to the destination and renamed once complete.
        let partial = destination.with_file_name(format!("{}.part", file_name));
        let bar = self.progress_bar(file_name, response.content_length());
        let result = stream_to(&mut response, &partial, destination, &bar).await;
        bar.finish_and_clear();

        if result.is_err() {
            tracing::warn!("Download of {} failed, removing {}", file_name, partial.display());
            if let Err(e) = tokio::fs::remove_file(&partial).await {
                tracing::debug!("Could not remove {}: {}", partial.display(), e);
            }
        }
        result
    }
}

async fn stream_to(
    response: &mut reqwest::Response,
    partial: &Path,
    destination: &Path,
    bar: &ProgressBar,
) -> Result<u64> {
    let mut file = tokio::fs::File::create(partial).await?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        bar.set_position(written);
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(partial, destination).await?;
    Ok(written)
}
