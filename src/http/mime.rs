//! MIME type detection based on file extensions.

use std::path::Path;

pub const DEFAULT_MIME: &str = "application/octet-stream";

pub fn from_path(path: impl AsRef<Path>) -> &'static str {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    match ext {
        "css" => "text/css",
        "png" => "image/png",
        "html" => "text/html",
        "js" => "application/javascript",
        "ico" => "image/x-icon",
        _ => DEFAULT_MIME,
    }
}
