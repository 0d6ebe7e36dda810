use axum::extract::Multipart;
use bytes::Bytes;

use crate::errors::AppError;
use crate::i18n::Language;
use crate::pipeline::session::UploadedDocument;

/// Largest accepted CV, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// Request body limit for the upload route: the file plus multipart framing.
pub const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

const DEFAULT_FILENAME: &str = "resume";

/// Lowercased MIME type without parameters (`image/PNG; q=1` → `image/png`).
pub fn normalize_mime(raw: &str) -> String {
    raw.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

pub fn is_accepted_mime(mime: &str) -> bool {
    mime == "application/pdf" || mime.starts_with("image/")
}

/// Type/size check, run before the session leaves `Idle`.
pub fn validate_upload(upload: &UploadedDocument, language: Language) -> Result<(), AppError> {
    let messages = language.messages();
    if !is_accepted_mime(&upload.mime_type) {
        return Err(AppError::Validation(messages.upload_error_type.to_string()));
    }
    if upload.bytes.is_empty() {
        return Err(AppError::Validation(messages.upload_error_empty.to_string()));
    }
    if upload.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(messages.upload_error_size.to_string()));
    }
    Ok(())
}

/// Pulls the `file` field out of a multipart body. Other fields are ignored.
pub async fn read_upload(mut multipart: Multipart) -> Result<UploadedDocument, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILENAME)
            .to_string();
        let mime_type = normalize_mime(field.content_type().unwrap_or_default());
        let bytes: Bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
        return Ok(UploadedDocument {
            filename,
            mime_type,
            bytes,
        });
    }
    Err(AppError::Validation("Missing multipart field 'file'".to_string()))
}
