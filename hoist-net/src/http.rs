use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use hoist_common::error::{HoistError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error};

const CONNECT_TIMEOUT_SECS: u64 = 10;
const USER_AGENT_STRING: &str = concat!("hoist launcher/", env!("CARGO_PKG_VERSION"));

/// Builds the client used for every request of a run. Only connecting is
/// bounded here; each request carries its own total timeout.
pub fn build_http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| HoistError::Generic(format!("Failed to build HTTP client: {e}")))
}

fn status_error(url: &str, status: StatusCode) -> HoistError {
    let reason = match status {
        StatusCode::NOT_FOUND => "Resource not found (404)".to_string(),
        StatusCode::FORBIDDEN => "Access forbidden (403)".to_string(),
        _ => format!("HTTP status {status}"),
    };
    HoistError::NetworkError(url.to_string(), reason)
}

/// GET `url` and return the body as text, all within `timeout`. Transport
/// failures and non-success statuses are `NetworkError`s.
pub async fn fetch_text(client: &Client, url: &str, timeout: Duration) -> Result<String> {
    let response = client.get(url).timeout(timeout).send().await.map_err(|e| {
        debug!("HTTP request failed for {url}: {e}");
        HoistError::NetworkError(url.to_string(), e.to_string())
    })?;
    let status = response.status();
    debug!("Received HTTP status: {} for {}", status, url);
    if !status.is_success() {
        return Err(status_error(url, status));
    }
    response
        .text()
        .await
        .map_err(|e| HoistError::NetworkError(url.to_string(), format!("Failed to read body: {e}")))
}

/// Streams the body of `url` into a new temporary file created in
/// `download_dir`. `timeout` bounds the whole transfer, body included. The
/// file is deleted when the returned handle is dropped.
pub async fn download_to_temp(
    client: &Client,
    url: &str,
    download_dir: &Path,
    timeout: Duration,
) -> Result<(NamedTempFile, u64)> {
    std::fs::create_dir_all(download_dir).map_err(|e| {
        HoistError::StorageError(format!(
            "Failed to create download directory {}: {}",
            download_dir.display(),
            e
        ))
    })?;
    let temp = tempfile::Builder::new()
        .prefix(".hoist-download-")
        .suffix(".zip")
        .tempfile_in(download_dir)?;
    debug!("Downloading {} to {}", url, temp.path().display());

    let response = client.get(url).timeout(timeout).send().await.map_err(|e| {
        error!("HTTP request failed for {url}: {e}");
        HoistError::NetworkError(url.to_string(), e.to_string())
    })?;
    let status = response.status();
    debug!("Received HTTP status: {} for {}", status, url);
    if !status.is_success() {
        error!("HTTP error {} for URL {}", status, url);
        return Err(status_error(url, status));
    }

    let mut file = tokio::fs::File::from_std(temp.reopen()?);
    let mut stream = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            HoistError::NetworkError(url.to_string(), format!("Download interrupted: {e}"))
        })?;
        file.write_all(&chunk).await.map_err(|e| {
            HoistError::StorageError(format!(
                "Failed to write download stream to {}: {}",
                temp.path().display(),
                e
            ))
        })?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);
    debug!("Finished writing {} bytes to {}", written, temp.path().display());

    Ok((temp, written))
}
