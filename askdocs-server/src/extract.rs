//! Upload file-type gate and text extraction.
//!
//! Only `.pdf` and `.txt` uploads are accepted; anything else is rejected
//! before chunking. PDF text extraction is CPU-bound, so it runs on the
//! blocking pool.

use askdocs_rag::error::{RagError, Result};
use tracing::debug;

/// Upload formats the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedType {
    Pdf,
    Txt,
}

impl SupportedType {
    /// Classify a filename by extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some("txt") => Ok(Self::Txt),
            _ => Err(RagError::InvalidArgument(format!(
                "unsupported file type for '{filename}': only .pdf and .txt are accepted"
            ))),
        }
    }
}

/// Extract plain text from an uploaded file.
///
/// # Errors
///
/// [`RagError::InvalidArgument`] for empty files, undecodable text, or
/// unparseable PDFs.
pub async fn extract_text(filename: &str, bytes: Vec<u8>) -> Result<String> {
    if bytes.is_empty() {
        return Err(RagError::InvalidArgument(format!("file '{filename}' is empty")));
    }

    let file_type = SupportedType::from_filename(filename)?;
    debug!(filename, file_type = ?file_type, size = bytes.len(), "extracting upload text");

    match file_type {
        SupportedType::Txt => String::from_utf8(bytes).map_err(|_| {
            RagError::InvalidArgument(format!("file '{filename}' is not valid UTF-8 text"))
        }),
        SupportedType::Pdf => {
            let filename = filename.to_string();
            tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
                    RagError::InvalidArgument(format!(
                        "could not extract text from PDF '{filename}': {e}"
                    ))
                })
            })
            .await
            .map_err(|e| RagError::InvalidArgument(format!("PDF extraction failed: {e}")))?
        }
    }
}
