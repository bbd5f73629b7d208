use std::path::Path;
use url::Url;

use super::{supported_extension, CONTENT_TYPE_EXTENSIONS, DEFAULT_EXTENSION};

/// Pick the file suffix for downloaded media.
///
/// Order of precedence:
/// 1. the URL path suffix, if it is a supported extension
/// 2. the content type, via the fixed content type table
/// 3. the first supported suffix the MIME registry lists for the content type
/// 4. [`DEFAULT_EXTENSION`]
///
/// The result is always a member of [`super::SUPPORTED_EXTENSIONS`].
pub fn resolve_extension(url: &str, content_type: Option<&str>) -> &'static str {
    if let Some(ext) = extension_from_url(url) {
        return ext;
    }

    let Some(content_type) = content_type.map(normalize_content_type).filter(|ct| !ct.is_empty()) else {
        return DEFAULT_EXTENSION;
    };

    if let Some(ext) = extension_from_table(&content_type) {
        return ext;
    }

    extension_from_registry(&content_type).unwrap_or(DEFAULT_EXTENSION)
}

/// Lowercase the MIME type and drop any `;` parameters
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

fn extension_from_url(url: &str) -> Option<&'static str> {
    let parsed = Url::parse(url).ok()?;
    let ext = Path::new(parsed.path()).extension()?.to_str()?;

    supported_extension(&format!(".{}", ext))
}

fn extension_from_table(content_type: &str) -> Option<&'static str> {
    CONTENT_TYPE_EXTENSIONS
        .iter()
        .find(|(ct, _)| *ct == content_type)
        .map(|(_, ext)| *ext)
}

// The registry lists suffixes alphabetically, so skip unsupported ones (`m1v` before `mpeg`).
fn extension_from_registry(content_type: &str) -> Option<&'static str> {
    mime_guess::get_mime_extensions_str(content_type)?
        .iter()
        .find_map(|guess| supported_extension(&format!(".{}", guess)))
}
