use std::{env, fs, path::Path};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to write file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid GITHUB_TOKEN format")]
    InvalidToken,
}

pub struct ServerConfig {
    pub body_limit_bytes: usize,
    pub port: u16,
    pub static_dir: String,
}

async fn download_file(url: &str, path: &str) -> Result<(), DownloadError> {
    info!("Downloading {} from {}", path, url);

    let mut header_map = HeaderMap::new();

    if let Ok(token) = env::var("GITHUB_TOKEN") {
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| DownloadError::InvalidToken)?;
        header_map.insert(HeaderName::from_static("authorization"), auth_value);
    }
    header_map.insert(
        HeaderName::from_static("accept"),
        HeaderValue::from_static("application/octet-stream"),
    );

    let client = reqwest::Client::new();
    let response = client.get(url).headers(header_map).send().await?;

    if !response.status().is_success() {
        return Err(DownloadError::Status(response.status()));
    }

    let bytes = response.bytes().await?;
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;

    Ok(())
}

/// Fetches the model artifact and the remedy table when they are missing
/// and a download URL is configured. A file that stays missing is only a
/// degradation, never a startup failure.
pub async fn ensure_files_exist(model_path: &str, remedy_path: &str) {
    if !Path::new(model_path).exists() {
        match env::var("MODEL_URL") {
            Ok(url) => {
                if let Err(err) = download_file(&url, model_path).await {
                    warn!("Failed to download model: {}", err);
                }
            }
            Err(_) => warn!("{} is missing and MODEL_URL is not set", model_path),
        }
    }

    if !Path::new(remedy_path).exists() {
        match env::var("REMEDY_URL") {
            Ok(url) => {
                if let Err(err) = download_file(&url, remedy_path).await {
                    warn!("Failed to download remedy table: {}", err);
                }
            }
            Err(_) => warn!("{} is missing and REMEDY_URL is not set", remedy_path),
        }
    }
}

pub fn get_env() -> ServerConfig {
    let body_limit_bytes = {
        let mb = env::var("BODY_LIMIT_MB")
            .unwrap_or_else(|_| "5".into())
            .parse::<usize>()
            .expect("BODY_LIMIT_MB must be a valid integer");
        mb * 1024 * 1024
    };

    let port = env::var("PORT")
        .unwrap_or_else(|_| "5000".into())
        .parse::<u16>()
        .expect("PORT must be a valid number between 0 and 65535");

    let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| "./client/dist".into());

    ServerConfig {
        body_limit_bytes,
        port,
        static_dir,
    }
}
