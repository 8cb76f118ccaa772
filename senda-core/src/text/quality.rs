// File: senda-core/src/text/quality.rs

use senda_common::models::{QualityMetrics, TextContext};

use super::lexicon;

/// Outcome of the heuristic coherence check. Deterministic and side-effect
/// free; no external calls are ever made from here.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityAssessment {
    pub coherent: bool,
    pub valid_word_ratio: f64,
    pub lexical_diversity: f64,
    pub has_grammar_signal: bool,
    /// Set when the text was judged incoherent.
    pub reason: Option<String>,
}

impl QualityAssessment {
    pub fn metrics(&self) -> QualityMetrics {
        QualityMetrics {
            valid_word_ratio: self.valid_word_ratio,
            has_grammar_signal: self.has_grammar_signal,
            lexical_diversity: self.lexical_diversity,
        }
    }

    fn incoherent(reason: &str, valid_word_ratio: f64, lexical_diversity: f64) -> Self {
        Self {
            coherent: false,
            valid_word_ratio,
            lexical_diversity,
            has_grammar_signal: false,
            reason: Some(reason.to_string()),
        }
    }
}

/// Heuristic garbage-text detector: keyboard mash, repeated characters,
/// consonant runs, low lexical diversity and implausible word ratios.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextQualityAnalyzer;

impl TextQualityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Assesses whether `text` reads as genuine language. PDF-extracted text
    /// uses a lower valid-word floor because OCR output and academic prose
    /// legitimately score lower.
    pub fn assess(&self, text: &str, context: TextContext) -> QualityAssessment {
        let normalized = lexicon::normalize(text);
        if normalized.trim().is_empty() {
            return QualityAssessment::incoherent("El texto está vacío", 0.0, 0.0);
        }

        let tokens = lexicon::tokenize(&normalized);
        if tokens.is_empty() {
            return QualityAssessment::incoherent(
                "El texto no contiene palabras reconocibles",
                0.0,
                0.0,
            );
        }

        let valid_words = tokens
            .iter()
            .filter(|t| lexicon::is_plausible_word(t))
            .count();
        let valid_word_ratio = valid_words as f64 / tokens.len() as f64;

        let mut unique: Vec<&str> = tokens.clone();
        unique.sort_unstable();
        unique.dedup();
        let lexical_diversity = unique.len() as f64 / tokens.len() as f64;
        let has_grammar_signal = lexicon::has_grammar_signal(&tokens);

        // A character or short substring repeated four or more times in a row.
        if has_repetition_mash(&normalized) {
            return QualityAssessment::incoherent(
                "Patrón repetitivo detectado",
                valid_word_ratio,
                lexical_diversity,
            );
        }

        // Words typed straight across one keyboard row, e.g. "asdfasdf".
        let mash_words = tokens
            .iter()
            .filter(|t| lexicon::is_keyboard_row_mash(t))
            .count();
        if mash_words * 2 > tokens.len() {
            return QualityAssessment::incoherent(
                "Texto de teclado sin sentido",
                valid_word_ratio,
                lexical_diversity,
            );
        }

        // Five consonants in a row with no vowel do not occur in Spanish.
        if tokens.iter().any(|t| has_long_consonant_run(t)) && valid_word_ratio < 0.5 {
            return QualityAssessment::incoherent(
                "Secuencias de consonantes impronunciables",
                valid_word_ratio,
                lexical_diversity,
            );
        }

        let alphabetic: Vec<char> = normalized.chars().filter(|c| c.is_alphabetic()).collect();
        if alphabetic.len() > 8 {
            let mut distinct: Vec<char> = alphabetic.clone();
            distinct.sort_unstable();
            distinct.dedup();
            let char_ratio = distinct.len() as f64 / alphabetic.len() as f64;
            if char_ratio < 0.3 {
                return QualityAssessment::incoherent(
                    "Texto repetitivo",
                    valid_word_ratio,
                    lexical_diversity,
                );
            }

            let vowels = alphabetic
                .iter()
                .filter(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
                .count();
            let vowel_ratio = vowels as f64 / alphabetic.len() as f64;
            if vowel_ratio < 0.1 || vowel_ratio > 0.9 {
                return QualityAssessment::incoherent(
                    "Proporción de vocales implausible",
                    valid_word_ratio,
                    lexical_diversity,
                );
            }
        }

        if tokens.len() > 10 && lexical_diversity < 0.2 {
            return QualityAssessment::incoherent(
                "Vocabulario demasiado repetitivo",
                valid_word_ratio,
                lexical_diversity,
            );
        }

        let floor = match context {
            TextContext::GeneralContent => 0.3,
            TextContext::PdfContent => 0.2,
        };
        if valid_word_ratio < floor {
            return QualityAssessment::incoherent(
                "Muy pocas palabras reconocibles",
                valid_word_ratio,
                lexical_diversity,
            );
        }

        QualityAssessment {
            coherent: true,
            valid_word_ratio,
            lexical_diversity,
            has_grammar_signal,
            reason: None,
        }
    }
}

/// One character, or a substring of up to three characters, repeated at least
/// four times consecutively ("aaaa", "jajajajajaja" stays legal via the
/// allowed-expression list, "abcabcabcabc" does not).
fn has_repetition_mash(text: &str) -> bool {
    let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();

    let mut run = 1usize;
    for window in chars.windows(2) {
        if window[0] == window[1] && window[0].is_alphanumeric() {
            run += 1;
            if run >= 4 {
                return true;
            }
        } else {
            run = 1;
        }
    }

    for width in 2..=3 {
        if chars.len() < width * 4 {
            continue;
        }
        'outer: for start in 0..chars.len() - width * 4 + 1 {
            let pattern = &chars[start..start + width];
            for rep in 1..4 {
                let offset = start + rep * width;
                if &chars[offset..offset + width] != pattern {
                    continue 'outer;
                }
            }
            // "jajaja..." and friends are laughter, not mash
            let as_string: String = pattern.iter().collect();
            if !lexicon::is_allowed_expression(&format!("{}{}", as_string, as_string)) {
                return true;
            }
        }
    }
    false
}

fn has_long_consonant_run(word: &str) -> bool {
    let mut run = 0usize;
    for c in word.chars() {
        if c.is_alphabetic() && !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u') {
            run += 1;
            if run >= 5 {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assess(text: &str, context: TextContext) -> QualityAssessment {
        TextQualityAnalyzer::new().assess(text, context)
    }

    #[test]
    fn real_sentence_is_coherent() {
        let a = assess(
            "Hermoso mirador con vista al valle",
            TextContext::GeneralContent,
        );
        assert!(a.coherent);
        assert!(a.valid_word_ratio > 0.8);
    }

    #[test]
    fn keyboard_mash_is_incoherent() {
        let a = assess("nklnknlkklnnlkn", TextContext::GeneralContent);
        assert!(!a.coherent);
    }

    #[test]
    fn repeated_characters_are_incoherent() {
        assert!(!assess("holaaaaaaaa que tal", TextContext::GeneralContent).coherent);
        assert!(!assess("abcabcabcabc", TextContext::GeneralContent).coherent);
    }

    #[test]
    fn laughter_is_not_flagged_as_repetition() {
        assert!(assess("jajaja que lindo lugar", TextContext::GeneralContent).coherent);
    }

    #[test]
    fn low_diversity_long_text_is_incoherent() {
        let text = "lugar lugar lugar lugar lugar lugar lugar lugar lugar lugar lugar lugar";
        assert!(!assess(text, TextContext::GeneralContent).coherent);
    }

    #[test]
    fn pdf_context_uses_lower_valid_word_floor() {
        // roughly a quarter of the tokens are plausible words
        let text = "xq1 zkw lugar qw3 kfd valle jk2 wp9 zb4 xv0 montana qp7";
        let general = assess(text, TextContext::GeneralContent);
        let pdf = assess(text, TextContext::PdfContent);
        assert!(!general.coherent);
        assert!(pdf.coherent);
    }

    #[test]
    fn determinism() {
        let first = assess("sendero al paramo", TextContext::GeneralContent);
        let second = assess("sendero al paramo", TextContext::GeneralContent);
        assert_eq!(first, second);
    }
}
