use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

use crate::media::resolve_extension;

pub mod progress;

pub use progress::ConsoleProgress;

/// Identifying client header sent with every download
pub const DOWNLOAD_USER_AGENT: &str = "Mozilla/5.0 (compatible; MediaTranscriptor/1.0)";

/// Bytes written (and reported) per progress step
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Connect and read timeout applied to downloads
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors raised while fetching remote media
#[derive(thiserror::Error, Debug)]
pub enum DownloadError {
    #[error("HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("no data received from server within {0:?}")]
    Timeout(Duration),

    #[error("failed to write temporary file: {0}")]
    Io(#[from] std::io::Error),
}

/// Receives `(downloaded_bytes, total_bytes)` after each chunk is written.
///
/// `total` is `None` when the server did not announce a non-zero `Content-Length`.
pub trait ProgressObserver {
    fn on_progress(&mut self, downloaded: u64, total: Option<u64>);
}

impl<F> ProgressObserver for F
where
    F: FnMut(u64, Option<u64>),
{
    fn on_progress(&mut self, downloaded: u64, total: Option<u64>) {
        (self)(downloaded, total)
    }
}

/// A fully written temporary media file.
///
/// The file is not removed when this value is dropped; whoever receives it owns the
/// file and must delete it.
#[derive(Debug, Clone)]
pub struct DownloadedMedia {
    /// Absolute path of the temporary file
    pub path: PathBuf,

    /// Suffix chosen for the file, always a supported extension
    pub extension: &'static str,

    /// Bytes written to disk
    pub bytes: u64,

    /// Content type reported by the server
    pub content_type: Option<String>,
}

/// Streams remote media into temporary files
#[derive(Debug, Clone)]
pub struct MediaDownloader {
    client: Client,
    timeout: Duration,
    temp_dir: Option<PathBuf>,
}

impl MediaDownloader {
    /// Build a downloader with a custom timeout and temp directory
    pub fn with_options(timeout: Duration, temp_dir: Option<PathBuf>) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            timeout,
            temp_dir,
        })
    }

    /// Download `url` into a new temporary file, reporting progress per chunk
    pub async fn download<P>(&self, url: &str, observer: &mut P) -> Result<DownloadedMedia, DownloadError>
    where
        P: ProgressObserver + ?Sized,
    {
        tracing::debug!("Requesting media: {}", url);

        let request = self
            .client
            .get(url)
            .header(USER_AGENT, DOWNLOAD_USER_AGENT)
            .send();
        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| DownloadError::Timeout(self.timeout))??;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                status,
                message: format!(
                    "{} for url: {}",
                    status.canonical_reason().unwrap_or("Unexpected status"),
                    url
                ),
            });
        }

        let total = response.content_length().filter(|&len| len > 0);
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(|ct| ct.to_string());
        let extension = resolve_extension(url, content_type.as_deref());

        tracing::debug!(
            "Resolved extension {} (content type: {:?}, length: {:?})",
            extension,
            content_type,
            total
        );

        let mut session = DownloadSession::create(url, extension, total, self.temp_dir.as_deref())?;
        let mut stream = response.bytes_stream();
        let mut buffer = Vec::with_capacity(CHUNK_SIZE);

        loop {
            let next = tokio::time::timeout(self.timeout, stream.next())
                .await
                .map_err(|_| DownloadError::Timeout(self.timeout))?;
            let Some(bytes) = next else {
                break;
            };
            let bytes = bytes?;
            let mut piece = &bytes[..];

            while !piece.is_empty() {
                let take = (CHUNK_SIZE - buffer.len()).min(piece.len());
                buffer.extend_from_slice(&piece[..take]);
                piece = &piece[take..];

                if buffer.len() == CHUNK_SIZE {
                    session.write_chunk(&buffer, observer)?;
                    buffer.clear();
                }
            }
        }

        if !buffer.is_empty() {
            session.write_chunk(&buffer, observer)?;
        }

        let media = session.finish(content_type)?;
        tracing::info!("Downloaded {} bytes to {}", media.bytes, media.path.display());

        Ok(media)
    }
}

/// State of one in-progress fetch.
///
/// Dropping a session before [`DownloadSession::finish`] closes and removes the
/// partially written file.
struct DownloadSession {
    url: String,
    extension: &'static str,
    downloaded: u64,
    total: Option<u64>,
    file: NamedTempFile,
}

impl DownloadSession {
    fn create(
        url: &str,
        extension: &'static str,
        total: Option<u64>,
        temp_dir: Option<&Path>,
    ) -> Result<Self, DownloadError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("media_").suffix(extension);

        let file = match temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        Ok(Self {
            url: url.to_string(),
            extension,
            downloaded: 0,
            total,
            file,
        })
    }

    fn write_chunk<P>(&mut self, chunk: &[u8], observer: &mut P) -> Result<(), DownloadError>
    where
        P: ProgressObserver + ?Sized,
    {
        self.file.write_all(chunk)?;
        self.downloaded += chunk.len() as u64;
        observer.on_progress(self.downloaded, self.total);
        Ok(())
    }

    fn finish(mut self, content_type: Option<String>) -> Result<DownloadedMedia, DownloadError> {
        self.file.flush()?;

        if let Some(total) = self.total {
            if total != self.downloaded {
                tracing::warn!(
                    "Server announced {} bytes for {} but sent {}",
                    total,
                    self.url,
                    self.downloaded
                );
            }
        }

        // Closes the handle; the file itself stays on disk for the caller.
        let path = self.file.into_temp_path().keep().map_err(|err| err.error)?;
        let path = std::path::absolute(&path)?;

        Ok(DownloadedMedia {
            path,
            extension: self.extension,
            bytes: self.downloaded,
            content_type,
        })
    }
}
