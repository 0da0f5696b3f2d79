//! Static file serving
//!
//! Files are exposed through a rule ending in `<path:filename>`; the view
//! resolves `filename` below the configured root directory.
//!
//! # Example
//!
//! ```rust,ignore
//! let app = App::new("bands");
//! app.serve_static("/assets", "./static")?;
//! ```

use crate::error::ApiError;
use crate::response::Response;
use bytes::Bytes;
use http::{header, StatusCode};
use http_body_util::Full;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

/// MIME type detection based on file extension
fn mime_type_for_extension(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "map" => "application/json",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",

        // WebAssembly
        "wasm" => "application/wasm",

        // Default
        _ => "application/octet-stream",
    }
}

/// Calculate ETag from file metadata
fn calculate_etag(modified: SystemTime, size: u64) -> String {
    let timestamp = modified
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("\"{:x}-{:x}\"", timestamp, size)
}

/// Static file serving configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFileConfig {
    /// Root directory for static files
    pub root: PathBuf,
    /// URL path prefix
    pub prefix: String,
    /// Cache-Control max-age in seconds (0 = no caching)
    pub max_age: u64,
}

impl StaticFileConfig {
    /// Create a new static file configuration
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
            max_age: 3600,
        }
    }

    /// Set Cache-Control max-age in seconds
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = seconds;
        self
    }

    /// URL rule serving this directory, e.g. `/assets/<path:filename>`
    pub fn rule(&self) -> String {
        format!("{}/<path:filename>", self.prefix.trim_end_matches('/'))
    }
}

/// Static file response
pub struct StaticFile;

impl StaticFile {
    /// Serve a file from a path relative to the root
    pub async fn serve(
        relative_path: &str,
        config: &StaticFileConfig,
    ) -> Result<Response, ApiError> {
        // Sanitize path to prevent directory traversal
        let clean_path = sanitize_path(relative_path);
        if clean_path.is_empty() {
            return Err(ApiError::not_found("Directory listing not allowed"));
        }
        Self::serve_file(&config.root.join(&clean_path), config).await
    }

    /// Serve a specific file
    async fn serve_file(path: &Path, config: &StaticFileConfig) -> Result<Response, ApiError> {
        // Check if file exists
        let metadata = fs::metadata(path)
            .await
            .map_err(|_| ApiError::not_found("File not found"))?;

        if !metadata.is_file() {
            return Err(ApiError::not_found("Not a file"));
        }

        // Read file
        let content = fs::read(path)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to read file: {}", e)))?;

        // Determine content type
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let content_type = mime_type_for_extension(extension);

        // Build response
        let mut builder = http::Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CONTENT_LENGTH, content.len());

        if let Ok(modified) = metadata.modified() {
            builder = builder.header(header::ETAG, calculate_etag(modified, metadata.len()));
        }

        // Add Cache-Control
        if config.max_age > 0 {
            builder = builder.header(
                header::CACHE_CONTROL,
                format!("public, max-age={}", config.max_age),
            );
        }

        builder
            .body(Full::new(Bytes::from(content)))
            .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
    }
}

/// Sanitize a file path to prevent directory traversal
fn sanitize_path(path: &str) -> String {
    // Remove leading slashes
    let path = path.trim_start_matches('/');

    // Split and filter out dangerous components
    let parts: Vec<&str> = path
        .split('/')
        .filter(|part| !part.is_empty() && *part != "." && *part != ".." && !part.contains('\\'))
        .collect();

    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_detection() {
        assert_eq!(mime_type_for_extension("html"), "text/html; charset=utf-8");
        assert_eq!(mime_type_for_extension("css"), "text/css; charset=utf-8");
        assert_eq!(
            mime_type_for_extension("js"),
            "text/javascript; charset=utf-8"
        );
        assert_eq!(mime_type_for_extension("png"), "image/png");
        assert_eq!(mime_type_for_extension("jpg"), "image/jpeg");
        assert_eq!(mime_type_for_extension("json"), "application/json");
        assert_eq!(
            mime_type_for_extension("unknown"),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("file.txt"), "file.txt");
        assert_eq!(sanitize_path("/file.txt"), "file.txt");
        assert_eq!(sanitize_path("../../../etc/passwd"), "etc/passwd");
        assert_eq!(sanitize_path("foo/../bar"), "foo/bar");
        assert_eq!(sanitize_path("./file.txt"), "file.txt");
        assert_eq!(sanitize_path("foo/./bar"), "foo/bar");
    }

    #[test]
    fn test_etag_calculation() {
        let time = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1000000);
        let etag = calculate_etag(time, 12345);
        assert!(etag.starts_with('"'));
        assert!(etag.ends_with('"'));
        assert!(etag.contains('-'));
    }

    #[test]
    fn test_static_file_config() {
        let config = StaticFileConfig::new("./public", "/assets/").max_age(7200);

        assert_eq!(config.root, PathBuf::from("./public"));
        assert_eq!(config.max_age, 7200);
        assert_eq!(config.rule(), "/assets/<path:filename>");
    }

    #[tokio::test]
    async fn test_serve_missing_file() {
        let config = StaticFileConfig::new("./does-not-exist", "/assets");
        let err = StaticFile::serve("site.css", &config).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_file() {
        let root = std::env::temp_dir().join(format!("docspec-static-{}", std::process::id()));
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("site.css"), "body {}").unwrap();

        let config = StaticFileConfig::new(&root, "/assets");
        let response = StaticFile::serve("../site.css", &config).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/css; charset=utf-8"
        );
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=3600"
        );

        std::fs::remove_dir_all(&root).ok();
    }
}
