use anyhow::{anyhow, Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use crate::file::FileFormat;

const FALLBACK_NAME: &str = "download";

/// A document downloaded from a direct URL.
#[derive(Debug)]
pub struct FetchedFile {
    pub file_name: String,
    pub content: Vec<u8>,
}

pub struct RemoteFetcher {
    client: Client,
    max_bytes: Option<u64>,
}

impl RemoteFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, max_bytes: None })
    }

    /// Rejects responses whose declared length is above `max_mb` before reading the body.
    pub fn with_size_limit(mut self, max_mb: f64) -> Self {
        self.max_bytes = Some((max_mb * 1024.0 * 1024.0) as u64);
        self
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedFile> {
        let parsed = Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
        let response = self
            .client
            .get(parsed.clone())
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Server refused {}", url))?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        if let (Some(limit), Some(length)) = (self.max_bytes, response.content_length()) {
            if length > limit {
                return Err(anyhow!(
                    "{} is {:.2} MB, above the {:.0} MB limit",
                    url,
                    length as f64 / (1024.0 * 1024.0),
                    limit as f64 / (1024.0 * 1024.0)
                ));
            }
        }
        let content = response.bytes().await?.to_vec();
        let file_name = suggested_file_name(&parsed, content_type.as_deref());

        info!(url, file_name = %file_name, bytes = content.len(), "fetched remote resource");
        Ok(FetchedFile { file_name, content })
    }
}

/// Last URL path segment, with an extension derived from `Content-Type` when it has none.
pub fn suggested_file_name(url: &Url, content_type: Option<&str>) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_NAME);

    if Path::new(segment).extension().is_some() {
        return segment.to_string();
    }

    let content_type = content_type.unwrap_or("").to_ascii_lowercase();
    let essence = content_type.split(';').next().unwrap_or("").trim();
    let format = FileFormat::ALL
        .iter()
        .copied()
        .find(|format| format.mime_type() == essence)
        .or_else(|| essence.starts_with("text/").then_some(FileFormat::Txt));

    match format {
        Some(format) => format!("{}.{}", segment, format.extension()),
        None => segment.to_string(),
    }
}

/// Wraps an external video downloader binary (yt-dlp compatible).
pub struct VideoDownloader {
    program: PathBuf,
}

impl VideoDownloader {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    /// Downloads `url` into `dest_dir` and returns the final file path reported by the tool.
    pub async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dest_dir).await?;
        let template = dest_dir.join("%(title)s.%(ext)s");

        debug!(program = %self.program.display(), url, "starting video download");
        let output = Command::new(&self.program)
            .arg("--no-playlist")
            .arg("-o")
            .arg(&template)
            .arg("--print")
            .arg("after_move:filepath")
            .arg(url)
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", self.program.display()))?;

        if !output.status.success() {
            let error_message = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Failed to download video: {}", error_message.trim()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let path = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("Downloader did not report an output file"))?;

        info!(url, path = %path.display(), "downloaded video");
        Ok(path)
    }
}
