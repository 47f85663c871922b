use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use derive_more::Display;
use once_cell::sync::Lazy;
use phf::phf_set;
use regex::Regex;
use serde::Serialize;

/// Largest accepted upload, 4 MiB.
pub const MAX_FILE_SIZE: usize = 4 * 1024 * 1024;

static ALLOWED_FILE_TYPES: phf::Set<&'static str> = phf_set! {
    // Images
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    // Documents
    "application/pdf",
    "text/plain",
    "text/markdown",
    // Code
    "text/javascript",
    "text/typescript",
    "application/json",
    "text/css",
    "text/html",
    "text/xml",
    "application/xml",
    // Archives
    "application/zip",
    "application/x-tar",
    "application/gzip",
};

/// Source and config files browsers tend to label with a useless MIME type.
static ALLOWED_EXTENSIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\.(ts|tsx|js|jsx|py|rb|go|rs|java|cpp|c|h|hpp|cs|php|sh|bash|zsh|ps1|psm1|yml|yaml|toml|ini|conf|cfg|env|sql|md|mdx)$",
    )
    .expect("upload extension pattern must compile")
});

#[derive(Debug, Display, PartialEq)]
pub enum UploadError {
    #[display(fmt = "Unauthorized")]
    Unauthorized,
    #[display(fmt = "No file provided")]
    NoFile,
    #[display(fmt = "File too large. Maximum size is 4MB.")]
    TooLarge,
    #[display(fmt = "File type not allowed")]
    TypeNotAllowed,
    #[display(fmt = "Failed to upload file")]
    Failed,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for UploadError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NoFile | Self::TooLarge | Self::TypeNotAllowed => StatusCode::BAD_REQUEST,
            Self::Failed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

/// Successful upload, echoed back to the browser which carries it into the
/// post or reply form as hidden fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub url: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: usize,
}

/// A file passes when its MIME type or its extension is allow-listed.
pub fn is_allowed_file(file_name: &str, content_type: &str) -> bool {
    ALLOWED_FILE_TYPES.contains(content_type) || ALLOWED_EXTENSIONS.is_match(file_name)
}

/// Checks a finished upload before it is sent to storage.
pub fn validate_upload(file_name: &str, content_type: &str, size: usize) -> Result<(), UploadError> {
    if size > MAX_FILE_SIZE {
        return Err(UploadError::TooLarge);
    }
    if !is_allowed_file(file_name, content_type) {
        return Err(UploadError::TypeNotAllowed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_by_mime_type() {
        assert!(is_allowed_file("photo", "image/png"));
        assert!(is_allowed_file("doc.bin", "application/pdf"));
        assert!(!is_allowed_file("tool.exe", "application/x-msdownload"));
    }

    #[test]
    fn allowed_by_extension() {
        assert!(is_allowed_file("main.rs", "application/octet-stream"));
        assert!(is_allowed_file("Deploy.PS1", "application/octet-stream"));
        assert!(is_allowed_file("config.yaml", ""));
        assert!(!is_allowed_file("main.rs.exe", "application/octet-stream"));
        assert!(!is_allowed_file("rs", "application/octet-stream"));
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert_eq!(validate_upload("a.txt", "text/plain", MAX_FILE_SIZE), Ok(()));
        assert_eq!(
            validate_upload("a.txt", "text/plain", MAX_FILE_SIZE + 1),
            Err(UploadError::TooLarge)
        );
    }

    #[test]
    fn size_is_checked_before_type() {
        assert_eq!(
            validate_upload("a.exe", "application/x-msdownload", MAX_FILE_SIZE + 1),
            Err(UploadError::TooLarge)
        );
        assert_eq!(
            validate_upload("a.exe", "application/x-msdownload", 10),
            Err(UploadError::TypeNotAllowed)
        );
    }

    #[test]
    fn errors_render_as_json() {
        let res = UploadError::TooLarge.error_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(UploadError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(UploadError::Failed.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
