use crate::domain::pdf::{classify_extracted, PdfContent};

/// Extract the text layer from one downloaded PDF and classify it.
///
/// Parser failures are recovered locally: the document is reported as
/// `Unreadable` and the announcement keeps processing with whatever the
/// other attachments yielded.
pub fn extract_text(bytes: &[u8], scanned_threshold: usize) -> PdfContent {
    match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) => classify_extracted(text, scanned_threshold),
        Err(e) => {
            log::error!("Failed to extract text from PDF: {:?}", e);
            PdfContent::Unreadable
        }
    }
}
