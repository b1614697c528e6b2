//! Fetches the packaged model when it is missing on disk.
//!
//! The package is a zip archive that contains the model file somewhere
//! inside it (for example `model-best/classifier.json`). The archive is
//! downloaded next to the model path and the entry whose file name matches
//! the model path is extracted to that path.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use disaster_response::download::ensure_model;
//!
//! ensure_model(Path::new("models/classifier.json"), Some("https://example.org/model.zip")).await?;
//! ```

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::DownloadError;

/// HTTP client for the model package
#[derive(Clone)]
pub struct ModelFetcher {
    url: String,
    client: reqwest::Client,
}

impl ModelFetcher {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stream the archive to `archive_path`, chunk by chunk.
    pub async fn fetch(&self, archive_path: &Path) -> Result<u64, DownloadError> {
        log_info_indent(format!("GET {}", self.url), 1);
        let mut response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }

        if let Some(parent) = archive_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(archive_path).await?;
        let mut size = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            size += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(size)
    }
}

/// Path the archive is downloaded to: `<model dir>/<model stem>.zip`.
pub fn archive_path_for(model_path: &Path) -> PathBuf {
    let stem = model_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    model_path.with_file_name(format!("{}.zip", stem))
}

fn part_path_for(model_path: &Path) -> PathBuf {
    let mut part = model_path.as_os_str().to_owned();
    part.push(".part");
    PathBuf::from(part)
}

fn remove_if_exists(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log_warning(format!("Cannot remove {}: {}", path.display(), e)),
    }
}

/// Extract the entry named like `model_path` from the archive to `model_path`.
pub fn extract_model(archive_path: &Path, model_path: &Path) -> Result<(), DownloadError> {
    let wanted = model_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| DownloadError::MissingEntry(model_path.display().to_string()))?;

    let mut archive = zip::ZipArchive::new(File::open(archive_path)?)?;

    let index = (0..archive.len())
        .find(|&i| {
            archive
                .by_index(i)
                .ok()
                .filter(|entry| entry.is_file())
                .and_then(|entry| entry.enclosed_name())
                .and_then(|name| name.file_name().map(|n| n.to_string_lossy() == wanted))
                .unwrap_or(false)
        })
        .ok_or_else(|| DownloadError::MissingEntry(wanted.clone()))?;

    if let Some(parent) = model_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let part = part_path_for(model_path);
    let mut entry = archive.by_index(index)?;
    let mut out = File::create(&part)?;
    io::copy(&mut entry, &mut out)?;
    fs::rename(&part, model_path)?;
    Ok(())
}

/// Make sure the model file exists, downloading it if needed.
///
/// Returns `true` when a download happened. The archive and any partial
/// model file are removed afterwards, whether or not extraction succeeded.
pub async fn ensure_model(model_path: &Path, url: Option<&str>) -> Result<bool, DownloadError> {
    if model_path.exists() {
        return Ok(false);
    }
    let url = url.ok_or(DownloadError::NoUrl)?;

    log_info("Model not found, downloading...");
    let fetcher = ModelFetcher::new(url);
    let archive_path = archive_path_for(model_path);
    let result = download_and_extract(&fetcher, &archive_path, model_path).await;

    remove_if_exists(&archive_path);
    remove_if_exists(&part_path_for(model_path));

    result?;
    log_success(format!("Model extracted to {}", model_path.display()));
    Ok(true)
}

async fn download_and_extract(
    fetcher: &ModelFetcher,
    archive_path: &Path,
    model_path: &Path,
) -> Result<(), DownloadError> {
    let size = fetcher.fetch(archive_path).await?;
    log_info_indent(format!("{} bytes -> {}", size, archive_path.display()), 1);
    extract_model(archive_path, model_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn archive_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn write_archive(path: &Path, entries: &[(&str, &str)]) {
        fs::write(path, archive_bytes(entries)).unwrap();
    }

    /// Serves `body` at `/model.zip` on a local port.
    async fn serve_archive(body: Vec<u8>) -> String {
        use axum::{routing::get, Router};

        let app = Router::new().route("/model.zip", get(move || async move { body }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/model.zip", addr)
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".zip") || n.ends_with(".part"))
            .collect()
    }

    #[test]
    fn test_archive_path_for() {
        assert_eq!(
            archive_path_for(Path::new("models/classifier.json")),
            PathBuf::from("models/classifier.zip")
        );
    }

    #[test]
    fn test_extract_nested_entry() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("model.zip");
        write_archive(
            &archive,
            &[
                ("model-best/meta.json", "{}"),
                ("model-best/classifier.json", "{\"format_version\":1}"),
            ],
        );

        let model = dir.path().join("models").join("classifier.json");
        extract_model(&archive, &model).unwrap();
        assert_eq!(fs::read_to_string(&model).unwrap(), "{\"format_version\":1}");
    }

    #[test]
    fn test_extract_missing_entry() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("model.zip");
        write_archive(&archive, &[("other.json", "{}")]);

        let err = extract_model(&archive, &dir.path().join("classifier.json")).unwrap_err();
        assert!(matches!(err, DownloadError::MissingEntry(_)));
    }

    #[tokio::test]
    async fn test_existing_model_skips_download() {
        let dir = tempdir().unwrap();
        let model = dir.path().join("classifier.json");
        fs::write(&model, "{}").unwrap();
        assert!(!ensure_model(&model, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_model_without_url() {
        let dir = tempdir().unwrap();
        let err = ensure_model(&dir.path().join("classifier.json"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::NoUrl));
    }

    #[tokio::test]
    async fn test_download_streams_and_extracts() {
        let url = serve_archive(archive_bytes(&[("model-best/classifier.json", "{\"format_version\":1}")])).await;
        let dir = tempdir().unwrap();
        let model = dir.path().join("classifier.json");

        assert!(ensure_model(&model, Some(&url)).await.unwrap());
        assert_eq!(fs::read_to_string(&model).unwrap(), "{\"format_version\":1}");
        assert!(leftovers(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_failed_extraction_leaves_no_files() {
        let url = serve_archive(b"not a zip archive".to_vec()).await;
        let dir = tempdir().unwrap();
        let model = dir.path().join("classifier.json");

        let err = ensure_model(&model, Some(&url)).await.unwrap_err();
        assert!(matches!(err, DownloadError::Archive(_)));
        assert!(!model.exists());
        assert!(leftovers(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let url = serve_archive(Vec::new()).await.replace("model.zip", "missing.zip");
        let dir = tempdir().unwrap();
        let model = dir.path().join("classifier.json");

        let err = ensure_model(&model, Some(&url)).await.unwrap_err();
        assert!(matches!(err, DownloadError::Status(404)));
        assert!(leftovers(dir.path()).is_empty());
    }
}
