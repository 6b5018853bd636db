/// What one downloaded attachment contributed after text extraction.
///
/// A document whose extracted text is shorter than the configured threshold
/// is treated as a scan with no usable text layer; its raw bytes go to the
/// multimodal analysis path instead. A document the parser cannot read at
/// all is `Unreadable`: it contributes nothing to the analysis, and is kept
/// distinct from `Scanned` so the two cases stay observable.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfContent {
    Text(String),
    Scanned,
    Unreadable,
}

/// Apply the scanned-document heuristic to successfully extracted text.
pub fn classify_extracted(text: String, scanned_threshold: usize) -> PdfContent {
    match text.trim().chars().count() < scanned_threshold {
        true => PdfContent::Scanned,
        false => PdfContent::Text(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_classified_as_scanned() {
        let text = "Lembar pengesahan".to_string();
        assert_eq!(classify_extracted(text, 100), PdfContent::Scanned);
    }

    #[test]
    fn whitespace_only_text_is_classified_as_scanned() {
        let text = "   \n\n   ".to_string();
        assert_eq!(classify_extracted(text, 100), PdfContent::Scanned);
    }

    #[test]
    fn long_text_is_returned_in_full() {
        let text = "laporan ".repeat(700);
        let result = classify_extracted(text.clone(), 100);
        assert_eq!(result, PdfContent::Text(text));
    }

    #[test]
    fn threshold_is_exclusive_at_the_boundary() {
        let at_threshold = "a".repeat(100);
        let below_threshold = "a".repeat(99);

        assert_eq!(
            classify_extracted(at_threshold.clone(), 100),
            PdfContent::Text(at_threshold)
        );
        assert_eq!(classify_extracted(below_threshold, 100), PdfContent::Scanned);
    }
}
