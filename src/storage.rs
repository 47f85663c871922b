use async_trait::async_trait;
use uuid::Uuid;

/// Destination for uploaded file bytes.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Stores `data` and returns the public URL it is served from.
    async fn put(&self, file_name: &str, content_type: &str, data: Vec<u8>)
        -> anyhow::Result<String>;
}

/// Unique object key that keeps the uploaded file name readable.
pub fn object_key(file_name: &str) -> String {
    format!("{}/{}", Uuid::new_v4(), sanitize_file_name(file_name))
}

/// Reduces a client-supplied name to a single URL-safe path segment.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let clean: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let clean = clean.trim_start_matches('.');

    if clean.is_empty() {
        "file".to_owned()
    } else {
        clean.to_owned()
    }
}
