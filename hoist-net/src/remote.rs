// hoist-net/src/remote.rs
//! The two remote lookups of a run, with deliberately different failure
//! policies: the version check swallows failures, the archive fetch does not.
use std::path::Path;
use std::time::Duration;

use hoist_common::error::Result;
use hoist_common::Version;
use reqwest::Client;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::http::{download_to_temp, fetch_text};
use crate::validation::validate_url;

/// A downloaded archive on disk. The file is removed when this is dropped.
#[derive(Debug)]
pub struct DownloadedArchive {
    file: NamedTempFile,
    size: u64,
}

impl DownloadedArchive {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Fetches the published version within `timeout`. Any failure (bad URL,
/// transport, status, body) yields the sentinel version instead of an error,
/// which makes an unreachable remote indistinguishable from one reset to the
/// baseline.
pub async fn resolve_version_or_default(client: &Client, url: &str, timeout: Duration) -> Version {
    if let Err(e) = validate_url(url) {
        warn!("Error getting remote version: {}", e);
        return Version::sentinel();
    }
    match fetch_text(client, url, timeout).await {
        Ok(body) => {
            let version = Version::parse(&body);
            debug!("Remote version from {}: '{}'", url, version);
            version
        }
        Err(e) => {
            warn!("Error getting remote version: {}", e);
            Version::sentinel()
        }
    }
}

/// Downloads the archive at `url` into `download_dir`, giving the whole
/// transfer `timeout`. Every failure is returned as an error so that a failed
/// download can never be mistaken for a finished one.
pub async fn fetch_archive_or_fail(
    client: &Client,
    url: &str,
    download_dir: &Path,
    timeout: Duration,
) -> Result<DownloadedArchive> {
    validate_url(url)?;
    info!("Downloading update...");
    let (file, size) = download_to_temp(client, url, download_dir, timeout).await?;
    debug!("Downloaded {} bytes from {}", size, url);
    Ok(DownloadedArchive { file, size })
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Instant;

    use hoist_common::HoistError;
    use mockito::Server;

    use super::*;
    use crate::http::build_http_client;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn client() -> Client {
        build_http_client().unwrap()
    }

    #[tokio::test]
    async fn resolves_trimmed_remote_version() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/main/version.txt")
            .with_status(200)
            .with_body("1.2.0\r\n")
            .create_async()
            .await;

        let url = format!("{}/main/version.txt", server.url());
        let version = resolve_version_or_default(&client(), &url, TIMEOUT).await;
        assert_eq!(version.as_str(), "1.2.0");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn version_lookup_failures_become_the_sentinel() {
        let mut server = Server::new_async().await;
        let _missing = server
            .mock("GET", "/version.txt")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/version.txt", server.url());
        assert!(resolve_version_or_default(&client(), &url, TIMEOUT).await.is_sentinel());

        // Nothing listens on port 9 of the loopback interface.
        let unreachable =
            resolve_version_or_default(&client(), "http://127.0.0.1:9/version.txt", TIMEOUT).await;
        assert!(unreachable.is_sentinel());

        assert!(resolve_version_or_default(&client(), "not a url", TIMEOUT).await.is_sentinel());
    }

    #[tokio::test]
    async fn archive_download_lands_in_download_dir_and_is_cleaned_on_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/archive/refs/heads/main.zip")
            .with_status(200)
            .with_body(vec![7u8; 4096])
            .create_async()
            .await;

        let url = format!("{}/archive/refs/heads/main.zip", server.url());
        let archive = fetch_archive_or_fail(&client(), &url, tmp.path(), TIMEOUT).await.unwrap();
        assert_eq!(archive.size(), 4096);
        assert!(archive.path().starts_with(tmp.path()));
        assert_eq!(std::fs::read(archive.path()).unwrap().len(), 4096);

        let path = archive.path().to_path_buf();
        drop(archive);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn archive_download_propagates_http_failures() {
        let tmp = tempfile::tempdir().unwrap();
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/archive/refs/heads/main.zip")
            .with_status(500)
            .create_async()
            .await;

        let url = format!("{}/archive/refs/heads/main.zip", server.url());
        let err = fetch_archive_or_fail(&client(), &url, tmp.path(), TIMEOUT).await.unwrap_err();
        assert!(matches!(err, HoistError::NetworkError(..)));
        // The partial temp file does not outlive the failure.
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    fn slow_archive_body(writer: &mut dyn Write) -> std::io::Result<()> {
        for _ in 0..15 {
            writer.write_all(&[1u8; 1024])?;
            writer.flush()?;
            std::thread::sleep(Duration::from_millis(200));
        }
        Ok(())
    }

    #[tokio::test]
    async fn slow_archive_download_outlasts_the_version_timeout() {
        let tmp = tempfile::tempdir().unwrap();
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/archive/refs/heads/main.zip")
            .with_status(200)
            .with_chunked_body(slow_archive_body)
            .create_async()
            .await;

        let version_timeout = Duration::from_secs(1);
        let download_timeout = Duration::from_secs(30);
        let url = format!("{}/archive/refs/heads/main.zip", server.url());

        let started = Instant::now();
        let archive = fetch_archive_or_fail(&client(), &url, tmp.path(), download_timeout)
            .await
            .unwrap();
        assert!(started.elapsed() > version_timeout);
        assert_eq!(archive.size(), 15 * 1024);
    }

    #[tokio::test]
    async fn archive_download_gives_up_after_its_own_timeout() {
        let tmp = tempfile::tempdir().unwrap();
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/archive/refs/heads/main.zip")
            .with_status(200)
            .with_chunked_body(slow_archive_body)
            .create_async()
            .await;

        let url = format!("{}/archive/refs/heads/main.zip", server.url());
        let err = fetch_archive_or_fail(&client(), &url, tmp.path(), Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(matches!(err, HoistError::NetworkError(..)));
    }
}
