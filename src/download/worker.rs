// src/download/worker.rs
// =============================================================================
// Downloads a single link into the output directory.
//
// The file is named after the last path segment of the link
// ("/documents/a.pdf" -> "a.pdf"). The body is streamed chunk by chunk, so
// large files never sit in memory.
//
// Bytes go to a hidden ".*.part" temp file in the same directory first, and
// only a complete body is renamed onto the target. A failed transfer leaves
// the directory as it was: an existing file keeps its old contents, and two
// downloads of the same name never interleave their bytes.
// =============================================================================

use crate::config::{CollisionPolicy, ScanConfig};
use crate::http::describe_error;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

/// What happened to one download
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadStatus {
    Saved { path: PathBuf },
    HttpError { code: u16 },
    TransportError { message: String },
    WriteError { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadOutcome {
    /// The link as it was scraped
    pub link: String,
    /// Base URL + link
    pub url: String,
    #[serde(flatten)]
    pub status: DownloadStatus,
}

impl DownloadOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self.status, DownloadStatus::Saved { .. })
    }
}

/// Fetches `link` and writes it to `config.download_dir`.
pub async fn download(client: &Client, config: &ScanConfig, link: &str) -> DownloadOutcome {
    let url = config.download_url(link);
    tracing::debug!(%url, "downloading");

    let status = match fetch_to_file(client, config, &url, link).await {
        Ok(path) => DownloadStatus::Saved { path },
        Err(status) => status,
    };

    DownloadOutcome {
        link: link.to_string(),
        url,
        status,
    }
}

// The Err side is the failure status to report
async fn fetch_to_file(
    client: &Client,
    config: &ScanConfig,
    url: &str,
    link: &str,
) -> Result<PathBuf, DownloadStatus> {
    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| DownloadStatus::TransportError {
            message: describe_error(&e),
        })?;

    let status_code = response.status();
    if status_code != StatusCode::OK {
        return Err(DownloadStatus::HttpError {
            code: status_code.as_u16(),
        });
    }

    let filename = file_name(link).ok_or_else(|| DownloadStatus::WriteError {
        message: format!("link '{}' has no file name", link),
    })?;
    let path = config.download_dir.join(filename);

    if config.collision_policy == CollisionPolicy::Keep
        && fs::try_exists(&path).await.unwrap_or(false)
    {
        return Err(write_error(&path, "file already exists"));
    }

    let (file, temp_path) =
        create_temp_file(&config.download_dir).map_err(|e| write_error(&path, e))?;
    let mut file = File::from_std(file);

    // On any early return the TempPath drop deletes the temp file
    copy_body(&mut response, &mut file)
        .await
        .map_err(|message| write_error(&path, message))?;
    drop(file);

    persist(temp_path, &path, config.collision_policy).map_err(|e| write_error(&path, e))?;

    Ok(path)
}

/// Text after the last '/' of the link, if it is a usable file name
fn file_name(link: &str) -> Option<&str> {
    let name = link.rsplit('/').next()?;
    match name {
        "" | "." | ".." => None,
        name => Some(name),
    }
}

fn create_temp_file(dir: &Path) -> std::io::Result<(std::fs::File, TempPath)> {
    let temp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".part")
        .tempfile_in(dir)?;
    Ok(temp.into_parts())
}

/// Renames the finished temp file onto `target`
fn persist(temp_path: TempPath, target: &Path, policy: CollisionPolicy) -> std::io::Result<()> {
    let persisted = match policy {
        CollisionPolicy::Overwrite => temp_path.persist(target),
        // Another download may have claimed the name since the pre-check
        CollisionPolicy::Keep => temp_path.persist_noclobber(target),
    };
    persisted.map_err(|e| e.error)
}

async fn copy_body(response: &mut Response, file: &mut File) -> Result<(), String> {
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| format!("error reading body: {}", describe_error(&e)))?
    {
        file.write_all(&chunk).await.map_err(|e| e.to_string())?;
    }
    // tokio's File finishes writes in the background; flush waits for them
    file.flush().await.map_err(|e| e.to_string())
}

fn write_error(path: &Path, error: impl std::fmt::Display) -> DownloadStatus {
    DownloadStatus::WriteError {
        message: format!("{}: {}", path.display(), error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_client;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, tempfile::TempDir, ScanConfig, Client) {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfig::for_tests(&server.uri(), dir.path());
        let client = build_client(&config).unwrap();
        (server, dir, config, client)
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// One-shot HTTP server on a raw socket, for responses wiremock cannot
    /// shape: reads the request head, writes each part after its delay, then
    /// closes the connection
    async fn raw_server(parts: Vec<(Duration, &'static [u8])>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                head.extend_from_slice(&buf[..n]);
            }
            for (delay, bytes) in parts {
                tokio::time::sleep(delay).await;
                socket.write_all(bytes).await.unwrap();
            }
        });
        format!("http://{}", addr)
    }

    const HEAD_20: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 20\r\n\r\n";

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("/documents/a.pdf"), Some("a.pdf"));
        assert_eq!(file_name("a.pdf"), Some("a.pdf"));
        assert_eq!(file_name("/documents/"), None);
        assert_eq!(file_name("/documents/.."), None);
    }

    #[tokio::test]
    async fn test_saves_body_under_last_segment() {
        let (server, dir, config, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/files/10.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 ten".to_vec()))
            .mount(&server)
            .await;

        let outcome = download(&client, &config, "/files/10.pdf").await;

        let expected = dir.path().join("10.pdf");
        assert_eq!(
            outcome.status,
            DownloadStatus::Saved {
                path: expected.clone()
            }
        );
        assert_eq!(outcome.url, format!("{}/files/10.pdf", server.uri()));
        assert_eq!(std::fs::read(expected).unwrap(), b"%PDF-1.4 ten");
    }

    #[tokio::test]
    async fn test_404_leaves_no_file() {
        let (server, dir, config, client) = setup().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let outcome = download(&client, &config, "/files/missing.pdf").await;

        assert_eq!(outcome.status, DownloadStatus::HttpError { code: 404 });
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfig::for_tests("http://127.0.0.1:1", dir.path());
        let client = build_client(&config).unwrap();

        let outcome = download(&client, &config, "/files/1.pdf").await;

        assert!(matches!(outcome.status, DownloadStatus::TransportError { .. }));
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_link_without_file_name() {
        let (server, dir, config, client) = setup().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("listing"))
            .mount(&server)
            .await;

        let outcome = download(&client, &config, "/files/").await;

        assert!(matches!(outcome.status, DownloadStatus::WriteError { .. }));
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_missing_directory_is_write_error() {
        let (server, dir, mut config, client) = setup().await;
        config.download_dir = dir.path().join("does-not-exist");
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("data"))
            .mount(&server)
            .await;

        let outcome = download(&client, &config, "/files/1.pdf").await;

        assert!(matches!(outcome.status, DownloadStatus::WriteError { .. }));
    }

    #[tokio::test]
    async fn test_overwrite_and_keep_policies() {
        let (server, dir, mut config, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/files/1.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_string("new"))
            .mount(&server)
            .await;
        let target = dir.path().join("1.pdf");

        std::fs::write(&target, "old contents").unwrap();
        let outcome = download(&client, &config, "/files/1.pdf").await;
        assert!(outcome.is_saved());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "new");

        std::fs::write(&target, "old contents").unwrap();
        config.collision_policy = CollisionPolicy::Keep;
        let outcome = download(&client, &config, "/files/1.pdf").await;
        assert!(matches!(outcome.status, DownloadStatus::WriteError { .. }));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "old contents");
    }

    #[tokio::test]
    async fn test_slow_transfer_outlives_timeout() {
        let uri = raw_server(vec![
            (Duration::ZERO, HEAD_20),
            (Duration::ZERO, b"0123456789"),
            (Duration::from_millis(1500), b"abcdefghij"),
        ])
        .await;
        let dir = tempfile::tempdir().unwrap();
        let mut config = ScanConfig::for_tests(&uri, dir.path());
        config.request_timeout = Some(Duration::from_secs(1));
        let client = build_client(&config).unwrap();

        let outcome = download(&client, &config, "/files/slow.pdf").await;

        let target = dir.path().join("slow.pdf");
        assert_eq!(
            outcome.status,
            DownloadStatus::Saved {
                path: target.clone()
            }
        );
        assert_eq!(std::fs::read(target).unwrap(), b"0123456789abcdefghij");
    }

    #[tokio::test]
    async fn test_connection_closed_mid_body() {
        let uri = raw_server(vec![(Duration::ZERO, HEAD_20), (Duration::ZERO, b"0123456789")]).await;
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfig::for_tests(&uri, dir.path());
        let client = build_client(&config).unwrap();

        let outcome = download(&client, &config, "/files/cut.pdf").await;

        assert!(
            matches!(outcome.status, DownloadStatus::WriteError { .. }),
            "{:?}",
            outcome.status
        );
        assert!(files_in(dir.path()).is_empty(), "{:?}", files_in(dir.path()));
    }

    #[tokio::test]
    async fn test_failed_overwrite_keeps_existing_file() {
        let uri = raw_server(vec![(Duration::ZERO, HEAD_20), (Duration::ZERO, b"0123456789")]).await;
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfig::for_tests(&uri, dir.path());
        assert_eq!(config.collision_policy, CollisionPolicy::Overwrite);
        let client = build_client(&config).unwrap();
        let target = dir.path().join("1.pdf");
        std::fs::write(&target, "old contents").unwrap();

        let outcome = download(&client, &config, "/files/1.pdf").await;

        assert!(matches!(outcome.status, DownloadStatus::WriteError { .. }));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "old contents");
        assert_eq!(files_in(dir.path()), vec!["1.pdf"]);
    }
}
