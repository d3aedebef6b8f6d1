use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_UPLOAD_FOLDER: &str = "uploads";
pub const DEFAULT_MAX_FILE_SIZE_MB: f64 = 200.0;
pub const DEFAULT_LANGUAGE: &str = "English";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_VIDEO_DOWNLOADER: &str = "yt-dlp";

/// Environment keys read at startup.
pub mod keys {
    pub const API_KEY: &str = "OPENAI_API_KEY";
    pub const BASE_URL: &str = "OPENAI_BASE_URL";
    pub const MODEL: &str = "LLM_MODEL";
    pub const UPLOAD_FOLDER: &str = "UPLOAD_FOLDER";
    pub const MAX_FILE_SIZE: &str = "MAX_FILE_SIZE";
    pub const DEFAULT_LANGUAGE: &str = "DEFAULT_LANGUAGE";
    pub const REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT_SECS";
    pub const VIDEO_DOWNLOADER: &str = "VIDEO_DOWNLOADER";
}

#[derive(Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub upload_folder: PathBuf,
    pub max_file_size_mb: f64,
    pub default_language: String,
    pub request_timeout: Duration,
    pub video_downloader: PathBuf,
}

impl Settings {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            api_key: get(keys::API_KEY),
            base_url: get(keys::BASE_URL)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: get(keys::MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            upload_folder: get(keys::UPLOAD_FOLDER)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_FOLDER)),
            max_file_size_mb: parse_or(
                keys::MAX_FILE_SIZE,
                get(keys::MAX_FILE_SIZE),
                DEFAULT_MAX_FILE_SIZE_MB,
            ),
            default_language: get(keys::DEFAULT_LANGUAGE)
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            request_timeout: Duration::from_secs(parse_or(
                keys::REQUEST_TIMEOUT,
                get(keys::REQUEST_TIMEOUT),
                DEFAULT_TIMEOUT_SECS,
            )),
            video_downloader: get(keys::VIDEO_DOWNLOADER)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VIDEO_DOWNLOADER)),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

// The credential stays out of debug output.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("upload_folder", &self.upload_folder)
            .field("max_file_size_mb", &self.max_file_size_mb)
            .field("default_language", &self.default_language)
            .field("request_timeout", &self.request_timeout)
            .field("video_downloader", &self.video_downloader)
            .finish()
    }
}

fn parse_or<T: FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!(key, value = %value, "invalid value, falling back to default");
            default
        }),
        None => default,
    }
}
