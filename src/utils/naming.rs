use std::path::Path;
use uuid::Uuid;

/// Content type stored for payloads whose type cannot be sniffed.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Sniffs the payload and returns `(content_type, extension)`.
pub fn detect_content_type(payload: &[u8]) -> (&'static str, Option<&'static str>) {
    match infer::get(payload) {
        Some(kind) => (kind.mime_type(), Some(kind.extension())),
        None => (DEFAULT_CONTENT_TYPE, None),
    }
}

fn extension_of(filename: &str) -> Option<&str> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
}

/// Appends `.{detected}` when the filename carries no extension of its own.
pub fn with_detected_extension(filename: &str, detected: Option<&str>) -> String {
    match (extension_of(filename), detected) {
        (None, Some(ext)) => format!("{}.{}", filename, ext),
        _ => filename.to_string(),
    }
}

/// Reduces a display filename to a stem that is safe inside an object key.
pub fn normalize_base_name(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let stem = match extension_of(name) {
        Some(ext) => &name[..name.len() - ext.len() - 1],
        None => name,
    };

    let normalized: String = stem
        .trim()
        .chars()
        .map(|c| {
            if c.is_control()
                || c.is_whitespace()
                || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ';' | '#' | '%')
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    let normalized = normalized.trim_start_matches('.');
    if normalized.is_empty() {
        "file".to_string()
    } else {
        normalized.to_string()
    }
}

/// Mints a new identifier: `<normalized-base-name>-<uuid><.ext>`.
pub fn generate_file_id(filename: &str) -> String {
    let ext = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(extension_of)
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    format!("{}-{}{}", normalize_base_name(filename), Uuid::new_v4(), ext)
}
