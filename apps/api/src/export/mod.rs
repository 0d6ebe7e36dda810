// Export Transcoder: canonical HTML → print document, DOCX, plain text.
// Pure functions only; nothing here talks to the gateway or the store.

use thiserror::Error;

pub mod docx;
pub mod handlers;
pub mod html;
pub mod print;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("DOCX packaging failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("DOCX packaging failed: {0}")]
    Io(#[from] std::io::Error),
}
