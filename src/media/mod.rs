use url::Url;

pub mod resolver;

pub use resolver::resolve_extension;

use crate::TranscriptorError;

/// File suffixes the speech-to-text API accepts without conversion
pub static SUPPORTED_EXTENSIONS: &[&str] = &[
    ".mp3", ".mp4", ".mpeg", ".mpga", ".m4a", ".wav", ".webm", ".ogg", ".oga", ".mkv", ".mov", ".m4v",
];

/// Normalized content types (lowercase, no parameters) and the suffix used for each
pub static CONTENT_TYPE_EXTENSIONS: &[(&str, &str)] = &[
    ("audio/mpeg", ".mp3"),
    ("audio/mp3", ".mp3"),
    ("audio/mp4", ".m4a"),
    ("audio/x-m4a", ".m4a"),
    ("audio/wav", ".wav"),
    ("audio/x-wav", ".wav"),
    ("audio/webm", ".webm"),
    ("audio/ogg", ".ogg"),
    ("video/mp4", ".mp4"),
    ("video/quicktime", ".mov"),
    ("video/x-matroska", ".mkv"),
    ("video/webm", ".webm"),
];

/// Suffix used when neither the URL nor the server gives a usable hint
pub const DEFAULT_EXTENSION: &str = ".mp4";

/// Look up `ext` (with leading dot, any case) in the supported set
pub fn supported_extension(ext: &str) -> Option<&'static str> {
    SUPPORTED_EXTENSIONS
        .iter()
        .copied()
        .find(|supported| supported.eq_ignore_ascii_case(ext))
}

/// True if the string is an absolute `http`/`https` URL with a host
pub fn is_valid_url(input: &str) -> bool {
    match Url::parse(input) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

/// Validate a user-supplied URL and return the parsed form
pub fn validate_url(input: &str) -> Result<Url, TranscriptorError> {
    let trimmed = input.trim();

    if !is_valid_url(trimmed) {
        return Err(TranscriptorError::InvalidUrl(input.to_string()));
    }

    Url::parse(trimmed).map_err(|_| TranscriptorError::InvalidUrl(input.to_string()))
}

/// Human-readable name for the media, taken from the last path segment
pub fn source_name(url: &Url) -> Option<String> {
    url.path_segments()
        .and_then(|segments| segments.last())
        .filter(|filename| !filename.is_empty())
        .map(|filename| {
            urlencoding::decode(filename)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| filename.to_string())
        })
}
