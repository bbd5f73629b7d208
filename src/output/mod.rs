use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::OutputFormat;
use crate::transcribe::TranscriptionResult;

/// File name used when the transcript is saved without an explicit path
pub const DEFAULT_TRANSCRIPT_FILE: &str = "transcript.txt";

/// Render a transcription result in the requested format
pub fn render(result: &TranscriptionResult, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format_as_text(result)),
        OutputFormat::Json => serde_json::to_string_pretty(result)
            .context("Failed to serialize transcription result"),
    }
}

/// Plain transcript text, newline terminated
pub fn format_as_text(result: &TranscriptionResult) -> String {
    let mut text = result.transcript.trim_end().to_string();
    text.push('\n');
    text
}

/// Save transcription result to file
pub fn save_to_file(result: &TranscriptionResult, path: &Path, format: &OutputFormat) -> Result<()> {
    let content = render(result, format)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)?;
    }
    fs_err::write(path, content)?;
    Ok(())
}

/// Print transcription result to console
pub fn print_to_console(result: &TranscriptionResult, format: &OutputFormat) -> Result<()> {
    let content = render(result, format)?;

    print!("{}", content);
    Ok(())
}
