// File: senda-core/src/pdf/strategy.rs

use senda_common::models::{PdfStrategy, PdfStructure};

/// Pure decision table mapping an inferred document structure to a named
/// analysis strategy. Identical input always yields the identical strategy.
pub fn select_strategy(structure: &PdfStructure, vision_available: bool) -> PdfStrategy {
    // Scanned and academic documents get the permissive pipeline as long as
    // the OCR signal is usable at all; sharp thresholds systematically
    // penalize them without making them unsafe.
    if (structure.is_scanned || structure.academic_signal)
        && structure.ocr_quality_estimate > 0.3
    {
        return PdfStrategy::PermissiveScannedOrAcademic;
    }

    if structure.text_confidence > 0.6 && structure.extracted_text.trim().len() > 30 {
        return PdfStrategy::TextOnly;
    }

    if structure.has_images {
        if structure.text_confidence > 0.2 {
            return if vision_available {
                PdfStrategy::TextPlusApprovedImages
            } else {
                PdfStrategy::ImageModerationOnly
            };
        }
        return if vision_available {
            PdfStrategy::ImagesWithVisionText
        } else {
            PdfStrategy::ImageModerationOnly
        };
    }

    PdfStrategy::BasicFallback
}
