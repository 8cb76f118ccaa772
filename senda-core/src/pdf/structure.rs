// File: senda-core/src/pdf/structure.rs

use std::path::Path;

use lopdf::{Document, Object};
use tracing::debug;

use senda_common::models::{PdfContentType, PdfStructure, TextContext};
use senda_common::Error;

use crate::text::lexicon;
use crate::text::quality::TextQualityAnalyzer;

/// Producer/creator substrings that point at a scanner or OCR tool.
const SCANNER_MARKERS: &[&str] = &[
    "scan", "scanner", "ocr", "tesseract", "abbyy", "xerox", "epson", "canon", "ricoh",
];

/// Reads a PDF's extractable text, metadata and embedded images, and
/// classifies the document before a strategy is chosen.
pub struct PdfStructureAnalyzer {
    quality: TextQualityAnalyzer,
}

impl PdfStructureAnalyzer {
    pub fn new() -> Self {
        Self {
            quality: TextQualityAnalyzer::new(),
        }
    }

    pub fn analyze(&self, pdf_path: &Path) -> Result<PdfStructure, Error> {
        let doc = Document::load(pdf_path).map_err(|e| Error::Pdf(e.to_string()))?;

        let pages = doc.get_pages();
        let page_count = pages.len();
        let page_numbers: Vec<u32> = pages.keys().cloned().collect();
        let extracted_text = doc.extract_text(&page_numbers).unwrap_or_default();
        let has_images = document_has_images(&doc);

        let trimmed = extracted_text.trim();
        let assessment = self.quality.assess(trimmed, TextContext::PdfContent);
        let academic_signal = lexicon::is_academic_text(trimmed);

        // Confidence that the extractable text represents the document:
        // mostly how plausible its words are, with diversity as a tiebreaker.
        let text_confidence = if trimmed.is_empty() {
            0.0
        } else {
            (assessment.valid_word_ratio * 0.7 + assessment.lexical_diversity * 0.3)
                .clamp(0.0, 1.0)
        };
        let ocr_quality_estimate = assessment.valid_word_ratio;

        let producer = info_field(&doc, b"Producer").unwrap_or_default();
        let creator = info_field(&doc, b"Creator").unwrap_or_default();
        let scanner_metadata = is_scanner_tool(&producer) || is_scanner_tool(&creator);

        // Classification rules, evaluated in order.
        let mut is_scanned = false;
        let content_type = if text_confidence > 0.6 && trimmed.len() > 30 {
            PdfContentType::Text
        } else if academic_signal || (scanner_metadata && trimmed.len() < 200) {
            is_scanned = true;
            if trimmed.len() >= 50 {
                PdfContentType::Mixed
            } else {
                PdfContentType::Images
            }
        } else if trimmed.len() < 50 {
            // under 50 extractable chars the document is likely scanned
            is_scanned = true;
            PdfContentType::Images
        } else if has_images {
            PdfContentType::Mixed
        } else {
            PdfContentType::Unknown
        };

        debug!(
            pages = page_count,
            chars = trimmed.len(),
            confidence = text_confidence,
            scanned = is_scanned,
            academic = academic_signal,
            "PDF structure analyzed"
        );

        Ok(PdfStructure {
            page_count,
            extracted_text: trimmed.to_string(),
            content_type,
            text_confidence,
            has_images,
            is_scanned,
            academic_signal,
            ocr_quality_estimate,
        })
    }
}

impl Default for PdfStructureAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn document_has_images(doc: &Document) -> bool {
    doc.objects.values().any(|object| {
        if let Object::Stream(stream) = object {
            stream
                .dict
                .get(b"Subtype")
                .ok()
                .and_then(|o| o.as_name().ok())
                == Some(b"Image".as_ref())
        } else {
            false
        }
    })
}

fn info_field(doc: &Document, key: &[u8]) -> Option<String> {
    let info = doc.trailer.get(b"Info").ok()?;
    let info = match info {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let dict = info.as_dict().ok()?;
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).to_string()),
        _ => None,
    }
}

fn is_scanner_tool(value: &str) -> bool {
    let lower = value.to_lowercase();
    SCANNER_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanner_markers_match_case_insensitively() {
        assert!(is_scanner_tool("Epson Scan 2"));
        assert!(is_scanner_tool("ABBYY FineReader"));
        assert!(!is_scanner_tool("LibreOffice 7.4"));
    }
}
