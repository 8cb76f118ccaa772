// File: senda-core/src/text/service.rs

use std::sync::Arc;

use tracing::{debug, warn};

use senda_common::models::{AnalysisMethod, AnalysisResult, ReasonCode, TextContext};

use crate::cache::ModerationResultCache;
use crate::capabilities::toxicity::{FallbackVerdict, LocalToxicityFallback, ToxicityClassifier};
use crate::config::TextPolicy;
use crate::text::lexicon;
use crate::text::quality::TextQualityAnalyzer;

/// Composes the quality analyzer, the external toxicity classifier and the
/// local fallback into a single text verdict. Classifier errors never reach
/// the caller; they degrade to the fallback path.
pub struct TextModerationService {
    classifier: Option<Arc<dyn ToxicityClassifier>>,
    fallback: LocalToxicityFallback,
    quality: TextQualityAnalyzer,
    cache: Arc<ModerationResultCache>,
    policy: TextPolicy,
}

impl TextModerationService {
    pub fn new(
        classifier: Option<Arc<dyn ToxicityClassifier>>,
        cache: Arc<ModerationResultCache>,
        policy: TextPolicy,
    ) -> Self {
        Self {
            classifier,
            fallback: LocalToxicityFallback::new(),
            quality: TextQualityAnalyzer::new(),
            cache,
            policy,
        }
    }

    /// Evaluates a text:
    ///  1. Empty/whitespace input is rejected immediately.
    ///  2. A cache hit skips every other step.
    ///  3. Trivial greetings bypass the classifier and approve.
    ///  4. Otherwise the classifier's worst-category score is blended with
    ///     the coherence signal; on classifier failure the local keyword
    ///     fallback supplies the toxicity instead.
    pub async fn evaluate(
        &self,
        text: &str,
        context: TextContext,
        submitter_key: &str,
    ) -> AnalysisResult {
        if text.trim().is_empty() {
            return AnalysisResult::empty_input();
        }

        if let Some(hit) = self.cache.get(context, text) {
            debug!(context = context.as_str(), "text verdict served from cache");
            return hit;
        }

        if lexicon::is_trivial_greeting(text) {
            let assessment = self.quality.assess(text, context);
            let result = AnalysisResult::trivial_approval(assessment.metrics());
            self.cache.insert(context, text, result.clone());
            return result;
        }

        let assessment = self.quality.assess(text, context);

        let (toxicity, method, mut fallback_verdict) = match &self.classifier {
            Some(classifier) => {
                let hints = vec!["es".to_string(), "en".to_string()];
                match classifier.classify(text, &hints).await {
                    Ok(scores) => {
                        let worst = scores.values().cloned().fold(0.0f64, f64::max);
                        (worst, AnalysisMethod::External, None)
                    }
                    Err(e) => {
                        warn!(
                            submitter = submitter_key,
                            "toxicity classifier failed, using local fallback: {}", e
                        );
                        let verdict = self.fallback.score(text);
                        (verdict.toxicity, AnalysisMethod::LocalFallback, Some(verdict))
                    }
                }
            }
            None => {
                let verdict = self.fallback.score(text);
                (verdict.toxicity, AnalysisMethod::LocalFallback, Some(verdict))
            }
        };

        // PDF text is approved primarily on safety; coherence weighs less
        // and never rejects on its own.
        let (toxicity_weight, coherence_weight) = match context {
            TextContext::GeneralContent => (0.5, 0.5),
            TextContext::PdfContent => (0.8, 0.2),
        };
        let coherence_component = if assessment.coherent {
            0.5 + assessment.valid_word_ratio / 2.0
        } else {
            assessment.valid_word_ratio / 2.0
        };
        let score = ((1.0 - toxicity) * toxicity_weight + coherence_component * coherence_weight)
            .clamp(0.0, 1.0);

        let toxicity_ok = toxicity < self.policy.toxicity_rejection;
        let approved = match context {
            TextContext::GeneralContent => toxicity_ok && assessment.coherent,
            TextContext::PdfContent => toxicity_ok,
        };

        let (reason_code, flagged_terms, reason) = if approved {
            (ReasonCode::None, Vec::new(), None)
        } else if !toxicity_ok {
            match fallback_verdict.take() {
                Some(verdict) => reject_from_fallback(verdict),
                None => (
                    ReasonCode::Offensive,
                    Vec::new(),
                    Some("Lenguaje inapropiado detectado".to_string()),
                ),
            }
        } else {
            (
                ReasonCode::Incoherent,
                Vec::new(),
                assessment
                    .reason
                    .clone()
                    .or_else(|| Some("El texto no parece coherente".to_string())),
            )
        };

        let result = AnalysisResult {
            approved,
            score,
            flagged_terms,
            reason_code,
            method,
            quality_metrics: assessment.metrics(),
            reason,
        };
        self.cache.insert(context, text, result.clone());
        result
    }
}

fn reject_from_fallback(verdict: FallbackVerdict) -> (ReasonCode, Vec<String>, Option<String>) {
    let reason_code = if verdict.reason_code == ReasonCode::None {
        ReasonCode::Offensive
    } else {
        verdict.reason_code
    };
    (reason_code, verdict.flagged_terms, verdict.reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::capabilities::toxicity::MockToxicityClassifier;
    use crate::config::CacheSettings;

    fn service(classifier: Option<Arc<dyn ToxicityClassifier>>) -> TextModerationService {
        let cache = Arc::new(ModerationResultCache::new(CacheSettings {
            ttl_secs: 300,
            max_entries: 32,
        }));
        TextModerationService::new(classifier, cache, TextPolicy::default())
    }

    fn scores(toxicity: f64) -> HashMap<String, f64> {
        let mut map = HashMap::new();
        map.insert("TOXICITY".to_string(), toxicity);
        map
    }

    #[tokio::test]
    async fn empty_text_rejects_without_any_calls() {
        let mut classifier = MockToxicityClassifier::new();
        classifier.expect_classify().times(0);
        let service = service(Some(Arc::new(classifier)));

        let result = service
            .evaluate("   ", TextContext::GeneralContent, "anon")
            .await;
        assert!(!result.approved);
        assert_eq!(result.score, 0.1);
        assert_eq!(result.reason_code, ReasonCode::Incoherent);
    }

    #[tokio::test]
    async fn trivial_greeting_bypasses_the_classifier() {
        let mut classifier = MockToxicityClassifier::new();
        classifier.expect_classify().times(0);
        let service = service(Some(Arc::new(classifier)));

        let result = service
            .evaluate("¡Gracias!", TextContext::GeneralContent, "anon")
            .await;
        assert!(result.approved);
        assert!(result.score >= 0.9);
    }

    #[tokio::test]
    async fn clean_text_approves_with_high_score() {
        let mut classifier = MockToxicityClassifier::new();
        classifier
            .expect_classify()
            .times(1)
            .returning(|_, _| Ok(scores(0.05)));
        let service = service(Some(Arc::new(classifier)));

        let result = service
            .evaluate(
                "Hermoso mirador con vista al valle",
                TextContext::GeneralContent,
                "anon",
            )
            .await;
        assert!(result.approved);
        assert!(result.score >= 0.8);
        assert_eq!(result.method, AnalysisMethod::External);
    }

    #[tokio::test]
    async fn second_evaluation_is_served_from_cache() {
        let mut classifier = MockToxicityClassifier::new();
        classifier
            .expect_classify()
            .times(1)
            .returning(|_, _| Ok(scores(0.05)));
        let service = service(Some(Arc::new(classifier)));

        let first = service
            .evaluate("Un sendero precioso entre montañas", TextContext::GeneralContent, "a")
            .await;
        let second = service
            .evaluate("Un sendero precioso entre montañas", TextContext::GeneralContent, "b")
            .await;
        assert_eq!(first.approved, second.approved);
        assert_eq!(first.score, second.score);
    }

    #[tokio::test]
    async fn classifier_failure_degrades_to_local_fallback() {
        let mut classifier = MockToxicityClassifier::new();
        classifier.expect_classify().times(1).returning(|_, _| {
            Err(senda_common::Error::CapabilityTimeout {
                capability: "toxicity".to_string(),
                timeout_secs: 10,
            })
        });
        let service = service(Some(Arc::new(classifier)));

        let result = service
            .evaluate("eres un malparido", TextContext::GeneralContent, "anon")
            .await;
        assert!(!result.approved);
        assert_eq!(result.method, AnalysisMethod::LocalFallback);
        assert_eq!(result.reason_code, ReasonCode::Offensive);
        assert_eq!(result.flagged_terms, vec!["malparido"]);
    }

    #[tokio::test]
    async fn incoherent_text_rejects_in_general_but_not_pdf_context() {
        let mut classifier = MockToxicityClassifier::new();
        classifier
            .expect_classify()
            .returning(|_, _| Ok(scores(0.05)));
        let service = service(Some(Arc::new(classifier)));

        // mostly implausible tokens, more than 10 words
        let garbage = "xq1 zkw lugar qw3 kfd valle jk2 wp9 zb4 xv0 montana qp7";
        let general = service
            .evaluate(garbage, TextContext::GeneralContent, "anon")
            .await;
        assert!(!general.approved);
        assert_eq!(general.reason_code, ReasonCode::Incoherent);

        let pdf = service
            .evaluate(garbage, TextContext::PdfContent, "anon")
            .await;
        assert!(pdf.approved);
    }

    #[tokio::test]
    async fn high_toxicity_rejects_pdf_context_too() {
        let mut classifier = MockToxicityClassifier::new();
        classifier
            .expect_classify()
            .returning(|_, _| Ok(scores(0.92)));
        let service = service(Some(Arc::new(classifier)));

        let result = service
            .evaluate("texto cualquiera del documento", TextContext::PdfContent, "anon")
            .await;
        assert!(!result.approved);
        assert_eq!(result.reason_code, ReasonCode::Offensive);
    }
}
