//! Text extraction for file ingestion.

use std::path::Path;

use tracing::debug;

use crate::error::{RagError, Result};

/// Extract plain text from an uploaded file.
///
/// Dispatches on the filename extension: `txt`, `md`, and `markdown` are
/// decoded as UTF-8; `pdf` goes through the `pdf-extract` crate (feature
/// `pdf`). Anything else, including `docx`, is rejected with
/// [`RagError::UnsupportedFormat`].
///
/// # Errors
///
/// - [`RagError::FileTooLarge`] when `bytes` exceeds `max_bytes`.
/// - [`RagError::InvalidInput`] for undecodable text or unparseable PDFs.
/// - [`RagError::UnsupportedFormat`] for unrecognized extensions.
pub fn extract_text(filename: &str, bytes: &[u8], max_bytes: usize) -> Result<String> {
    if bytes.len() > max_bytes {
        return Err(RagError::FileTooLarge { size: bytes.len(), limit: max_bytes });
    }

    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    debug!(filename, extension = %extension, size = bytes.len(), "extracting file text");

    match extension.as_str() {
        "txt" | "md" | "markdown" => String::from_utf8(bytes.to_vec()).map_err(|_| {
            RagError::InvalidInput(format!("'{filename}' is not valid UTF-8 text"))
        }),
        #[cfg(feature = "pdf")]
        "pdf" => pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            RagError::InvalidInput(format!("could not extract text from '{filename}': {e}"))
        }),
        #[cfg(not(feature = "pdf"))]
        "pdf" => Err(RagError::UnsupportedFormat(
            "PDF support is not enabled (build with the 'pdf' feature)".to_string(),
        )),
        "docx" => Err(RagError::UnsupportedFormat(
            "docx is not supported; convert to PDF or plain text".to_string(),
        )),
        _ => Err(RagError::UnsupportedFormat(format!(
            "'{filename}': upload a .txt, .md, or .pdf file"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_round_trips() {
        let text = extract_text("notes.txt", b"hello world", 1024).unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn markdown_is_treated_as_text() {
        let text = extract_text("README.md", b"# Title", 1024).unwrap();
        assert_eq!(text, "# Title");
    }

    #[test]
    fn oversized_file_is_rejected() {
        let err = extract_text("big.txt", &[0u8; 100], 10).unwrap_err();
        assert!(matches!(err, RagError::FileTooLarge { size: 100, limit: 10 }));
    }

    #[test]
    fn invalid_utf8_is_invalid_input() {
        let err = extract_text("bad.txt", &[0xff, 0xfe, 0xfd], 1024).unwrap_err();
        assert!(matches!(err, RagError::InvalidInput(_)));
    }

    #[test]
    fn docx_is_unsupported() {
        let err = extract_text("report.docx", b"PK", 1024).unwrap_err();
        assert!(matches!(err, RagError::UnsupportedFormat(_)));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = extract_text("image.png", b"\x89PNG", 1024).unwrap_err();
        assert!(matches!(err, RagError::UnsupportedFormat(_)));
    }
}
