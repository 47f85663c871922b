use crate::middleware::ClientCtx;
use crate::storage::BlobStorage;
use crate::upload::{validate_upload, UploadError, UploadedFile, MAX_FILE_SIZE};
use actix_multipart::Multipart;
use actix_web::{post, web, HttpResponse};
use futures::{StreamExt, TryStreamExt};
use std::sync::Arc;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(upload_file);
}

/// Stores one file from the `file` multipart field and answers with where it lives.
#[post("/api/upload")]
async fn upload_file(
    client: ClientCtx,
    storage: web::Data<Arc<dyn BlobStorage>>,
    mut payload: Multipart,
) -> Result<HttpResponse, UploadError> {
    if !client.is_authenticated() {
        return Err(UploadError::Unauthorized);
    }

    while let Some(mut field) = payload.try_next().await.map_err(|e| {
        log::error!("upload_file: multipart: {}", e);
        UploadError::Failed
    })? {
        let disposition = field.content_disposition();
        if disposition.get_name() != Some("file") {
            continue;
        }
        let file_name = match disposition.get_filename() {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => return Err(UploadError::NoFile),
        };
        let file_type = field.content_type().essence_str().to_owned();

        // Stop reading as soon as the limit is crossed.
        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            let bytes = chunk.map_err(|e| {
                log::error!("upload_file: reading field: {}", e);
                UploadError::Failed
            })?;
            if buf.len() + bytes.len() > MAX_FILE_SIZE {
                log::info!("upload_file: {} exceeds {} bytes", file_name, MAX_FILE_SIZE);
                return Err(UploadError::TooLarge);
            }
            buf.extend_from_slice(&bytes);
        }

        validate_upload(&file_name, &file_type, buf.len())?;

        let file_size = buf.len();
        let file_type = if file_type.is_empty() {
            mime::APPLICATION_OCTET_STREAM.to_string()
        } else {
            file_type
        };
        let url = storage
            .put(&file_name, &file_type, buf)
            .await
            .map_err(|e| {
                log::error!("upload_file: storage: {:?}", e);
                UploadError::Failed
            })?;

        log::info!("upload_file: stored {} ({} bytes) at {}", file_name, file_size, url);
        return Ok(HttpResponse::Ok().json(UploadedFile {
            url,
            file_name,
            file_type,
            file_size,
        }));
    }

    Err(UploadError::NoFile)
}
