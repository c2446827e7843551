use crate::error::{LedgerError, Result};

/// Recovers plain text from a raw document buffer.
///
/// Bills arrive as PDFs; anything without the PDF magic is treated as
/// already-extracted text (UTF-8). Decode failures surface as errors and the
/// caller skips the document.
pub fn document_text(bytes: &[u8]) -> Result<String> {
    if bytes.starts_with(b"%PDF") {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| LedgerError::Decode(e.to_string()))
    } else {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| LedgerError::Decode(format!("invalid UTF-8 text: {}", e)))
    }
}
