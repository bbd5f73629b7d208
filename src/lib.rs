//! Media Transcriptor - download a media file from a URL and transcribe it
//!
//! This library resolves a supported file extension for remote media, streams it to a
//! temporary file with progress reporting, and hands it to a speech-to-text service.

pub mod cli;
pub mod config;
pub mod download;
pub mod media;
pub mod output;
pub mod transcribe;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use download::{DownloadError, DownloadedMedia, MediaDownloader, ProgressObserver};
pub use media::{is_valid_url, resolve_extension};
pub use transcribe::{Transcriber, TranscriptionError, TranscriptionPipeline, TranscriptionResult};

/// Result type used for application glue
pub type Result<T> = anyhow::Result<T>;

/// Error types surfaced to the user by the transcription flow
#[derive(thiserror::Error, Debug)]
pub enum TranscriptorError {
    #[error("Invalid URL: {0}. Please enter a valid HTTP/HTTPS URL to a media file")]
    InvalidUrl(String),

    #[error("Failed to download media: {0}")]
    Download(#[from] DownloadError),

    #[error("Transcription failed: {0}")]
    Transcription(#[from] TranscriptionError),
}
