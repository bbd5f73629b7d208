use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;

use crate::config::Config;
use crate::download::{DownloadedMedia, MediaDownloader, ProgressObserver};
use crate::media::{source_name, validate_url};
use crate::utils::{format_file_size, format_megabytes};
use crate::TranscriptorError;

pub mod openai;

pub use openai::OpenAiTranscriber;

/// Language choices offered on the command line; `auto-detect` omits the hint
pub const LANGUAGE_OPTIONS: &[&str] = &[
    "auto-detect", "en", "es", "fr", "de", "it", "pt", "ru", "zh", "ja", "ko", "hi",
];

/// Errors returned by a speech-to-text service
#[derive(thiserror::Error, Debug)]
pub enum TranscriptionError {
    #[error("no API key configured (set OPENAI_API_KEY or api.api_key)")]
    MissingApiKey,

    #[error("failed to read media file: {0}")]
    Io(#[from] std::io::Error),

    #[error("request to transcription service failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("transcription service returned HTTP {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("unexpected response from transcription service: {0}")]
    InvalidResponse(String),
}

/// A finished media file and an optional language hint
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    pub media_path: PathBuf,
    pub language: Option<String>,
}

/// A speech-to-text service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the media file and return the transcript text
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<String, TranscriptionError>;

    /// Name of the service, for logs and output metadata
    fn name(&self) -> &'static str;
}

/// Transcription result with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// The transcribed text
    pub transcript: String,

    /// URL the media was downloaded from
    pub source_url: String,

    /// Decoded file name from the URL, if any
    pub source_name: Option<String>,

    /// Extension the media was stored with
    pub extension: String,

    /// Size of the downloaded media
    pub bytes_downloaded: u64,

    /// Language hint sent to the service (`None` = auto-detect)
    pub language: Option<String>,

    /// Service that produced the transcript
    pub transcriber: String,

    /// Seconds from download start to transcript
    pub elapsed_secs: f64,

    /// Timestamp when transcription completed
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// Normalize a language selection: `None`, empty, `auto` and `auto-detect` mean no hint
pub fn language_hint(language: Option<&str>) -> Option<String> {
    let language = language?.trim().to_lowercase();

    match language.as_str() {
        "" | "auto" | "auto-detect" => None,
        _ => Some(language),
    }
}

/// Downloaded media that is deleted when dropped.
///
/// Deletion is best effort; failures are logged and otherwise ignored.
struct TempMedia {
    path: PathBuf,
}

impl Drop for TempMedia {
    fn drop(&mut self) {
        match fs_err::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Removed temporary media {}", self.path.display()),
            Err(err) => tracing::debug!("Could not remove temporary media: {}", err),
        }
    }
}

/// Download, transcribe, clean up
pub struct TranscriptionPipeline {
    downloader: MediaDownloader,
    transcriber: Box<dyn Transcriber>,
    large_file_warning_bytes: u64,
    default_language: Option<String>,
}

impl TranscriptionPipeline {
    /// Create a pipeline from explicit collaborators
    pub fn new(downloader: MediaDownloader, transcriber: Box<dyn Transcriber>) -> Self {
        Self {
            downloader,
            transcriber,
            large_file_warning_bytes: Config::default().large_file_warning_bytes(),
            default_language: None,
        }
    }

    /// Create a pipeline backed by the configured OpenAI-compatible service
    pub fn from_config(config: &Config, api_key: Option<String>) -> Result<Self, TranscriptorError> {
        let downloader =
            MediaDownloader::with_options(config.download_timeout(), config.download.temp_dir.clone())?;
        let transcriber = OpenAiTranscriber::new(
            &config.api.base_url,
            &config.api.model,
            config.resolve_api_key(api_key),
        )?;

        Ok(Self::new(downloader, Box::new(transcriber))
            .with_large_file_warning(config.large_file_warning_bytes())
            .with_default_language(config.app.default_language.clone()))
    }

    pub fn with_large_file_warning(mut self, bytes: u64) -> Self {
        self.large_file_warning_bytes = bytes;
        self
    }

    pub fn with_default_language(mut self, language: Option<String>) -> Self {
        self.default_language = language;
        self
    }

    /// Transcribe the media behind `url`.
    ///
    /// The temporary file is removed before this returns, on success and on every error.
    pub async fn transcribe_url<P>(
        &self,
        url: &str,
        language: Option<&str>,
        observer: &mut P,
    ) -> Result<TranscriptionResult, TranscriptorError>
    where
        P: ProgressObserver + ?Sized,
    {
        let parsed = validate_url(url)?;
        let started = Instant::now();

        tracing::info!("Downloading media from: {}", parsed);
        let media = self.downloader.download(parsed.as_str(), observer).await?;
        let _cleanup = TempMedia {
            path: media.path.clone(),
        };

        self.warn_if_large(&media);

        let language = language_hint(language.or(self.default_language.as_deref()));
        let request = TranscriptionRequest {
            media_path: media.path.clone(),
            language: language.clone(),
        };

        tracing::info!(
            "Transcribing {} with {} (language: {})",
            format_file_size(media.bytes),
            self.transcriber.name(),
            language.as_deref().unwrap_or("auto-detect")
        );
        let transcript = self.transcriber.transcribe(&request).await?;

        Ok(TranscriptionResult {
            transcript,
            source_url: parsed.to_string(),
            source_name: source_name(&parsed),
            extension: media.extension.to_string(),
            bytes_downloaded: media.bytes,
            language,
            transcriber: self.transcriber.name().to_string(),
            elapsed_secs: started.elapsed().as_secs_f64(),
            completed_at: chrono::Utc::now(),
        })
    }

    fn exceeds_warning_size(&self, bytes: u64) -> bool {
        bytes > self.large_file_warning_bytes
    }

    fn warn_if_large(&self, media: &DownloadedMedia) {
        if self.exceeds_warning_size(media.bytes) {
            tracing::warn!(
                "Downloaded file size is {}. Large files may take longer to process.",
                format_megabytes(media.bytes)
            );
        }
    }
}
