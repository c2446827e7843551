//! The document field-extraction engine.
//!
//! One submodule per known vendor format, each an ordered set of field
//! patterns with fallbacks. Unmatched optional fields default to zero; a bill
//! with no recoverable date is discarded whole, so partial records never
//! reach the ledger.

mod electric;
mod gas;
pub mod patterns;
mod solar;

use log::warn;

use crate::decode::document_text;
use crate::error::Result;
use crate::schema::{BillRecord, SourceType};

/// Extracts typed billing facts from already-decoded document text.
pub fn extract_fields(source: SourceType, text: &str) -> Result<BillRecord> {
    match source {
        SourceType::Electric => electric::extract(text),
        SourceType::Solar => solar::extract(text),
        SourceType::Gas => gas::extract(text),
    }
}

/// Extraction boundary for a raw document: decode failures and missing
/// required fields are logged and collapse to `None`. Nothing propagates past
/// here, so one bad document never aborts a batch.
pub fn extract_document(source: SourceType, bytes: &[u8]) -> Option<BillRecord> {
    let text = match document_text(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!("Skipping undecodable {} document: {}", source, e);
            return None;
        }
    };

    match extract_fields(source, &text) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Skipping {} document with no usable fields: {}", source, e);
            None
        }
    }
}
