use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::transcribe::LANGUAGE_OPTIONS;

#[derive(Parser)]
#[command(
    name = "transcriptor",
    about = "Media Transcriptor - Download a video or audio file from a URL and transcribe it",
    version,
    long_about = "Paste a direct link to a video/audio file. The file is downloaded to a temporary location, sent to a Whisper-compatible speech-to-text API, and the transcript is printed or saved."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, value_name = "FILE", env = "TRANSCRIPTOR_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download media from a URL and transcribe it
    Transcribe {
        /// Direct URL to a video or audio file
        #[arg(value_name = "URL")]
        url: String,

        /// Transcription language (auto-detect if not specified)
        #[arg(short, long, value_name = "LANG", value_parser = PossibleValuesParser::new(LANGUAGE_OPTIONS.iter().copied()))]
        language: Option<String>,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Save the transcript to transcript.txt when no output path is given
        #[arg(long)]
        save: bool,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// API key for the speech-to-text service
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Show or initialize the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// List supported media extensions and content types
    Formats,

    /// List transcription language options
    Languages,
}

#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON with download and transcription metadata
    Json,
}

impl OutputFormat {
    /// Parse a format name from the configuration file
    pub fn from_config(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
