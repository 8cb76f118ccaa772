// File: senda-core/src/capabilities/toxicity.rs

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use senda_common::models::ReasonCode;
use senda_common::Error;

use crate::text::lexicon;

/// External text-safety capability: maps a text to category→score∈[0,1].
/// Implementations must enforce their own client-side timeout; a timeout or
/// non-2xx response surfaces as a capability error so the caller can switch
/// to the local fallback.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToxicityClassifier: Send + Sync {
    fn name(&self) -> &str;

    async fn classify(
        &self,
        text: &str,
        language_hints: &[String],
    ) -> Result<HashMap<String, f64>, Error>;
}

/// HTTP classifier client. Request: `{text, languageHints}`; response: a JSON
/// object of category scores, e.g. `{"TOXICITY": 0.12, "THREAT": 0.02}`.
pub struct HttpToxicityClassifier {
    client: Client,
    url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpToxicityClassifier {
    pub fn new(url: String, api_key: Option<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::new(),
            url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[async_trait]
impl ToxicityClassifier for HttpToxicityClassifier {
    fn name(&self) -> &str {
        "http-toxicity"
    }

    async fn classify(
        &self,
        text: &str,
        language_hints: &[String],
    ) -> Result<HashMap<String, f64>, Error> {
        let mut request = self.client.post(&self.url).timeout(self.timeout).json(&json!({
            "text": text,
            "languageHints": language_hints,
        }));
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::CapabilityTimeout {
                    capability: "toxicity".to_string(),
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                Error::CapabilityError {
                    capability: "toxicity".to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::CapabilityError {
                capability: "toxicity".to_string(),
                message: format!("classifier returned HTTP {}", status),
            });
        }

        let data = response.json::<serde_json::Value>().await?;
        let object = data.as_object().ok_or_else(|| Error::CapabilityError {
            capability: "toxicity".to_string(),
            message: "response is not a JSON object".to_string(),
        })?;

        let mut scores = HashMap::new();
        for (category, value) in object {
            if let Some(score) = value.as_f64() {
                scores.insert(category.clone(), score.clamp(0.0, 1.0));
            }
        }
        if scores.is_empty() {
            return Err(Error::CapabilityError {
                capability: "toxicity".to_string(),
                message: "response carried no category scores".to_string(),
            });
        }

        debug!("toxicity classifier returned {} categories", scores.len());
        Ok(scores)
    }
}

/// What the local fallback concluded about a text.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackVerdict {
    pub toxicity: f64,
    pub reason_code: ReasonCode,
    pub flagged_terms: Vec<String>,
    pub reason: Option<String>,
}

/// Keyword-list heuristic used whenever the external classifier fails or is
/// not configured. Operates on normalized, leet-folded text.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalToxicityFallback;

impl LocalToxicityFallback {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, text: &str) -> FallbackVerdict {
        let normalized = lexicon::normalize(text);
        let folded = lexicon::fold_leet(&normalized);

        let extreme = lexicon::find_terms(&folded, lexicon::EXTREME_TERMS);
        if !extreme.is_empty() {
            return FallbackVerdict {
                toxicity: 0.9,
                reason_code: ReasonCode::Offensive,
                flagged_terms: to_owned(extreme),
                reason: Some("Lenguaje ofensivo detectado".to_string()),
            };
        }

        let phrases = lexicon::find_terms(&folded, lexicon::PROHIBITED_PHRASES);
        if !phrases.is_empty() {
            return FallbackVerdict {
                toxicity: 0.9,
                reason_code: ReasonCode::Offensive,
                flagged_terms: to_owned(phrases),
                reason: Some("Frase amenazante o fraudulenta detectada".to_string()),
            };
        }

        if lexicon::contains_url(&normalized)
            || lexicon::contains_email(&normalized)
            || lexicon::contains_phone(&normalized)
        {
            return FallbackVerdict {
                toxicity: 0.6,
                reason_code: ReasonCode::LinksOrContact,
                flagged_terms: Vec::new(),
                reason: Some("Enlaces o datos de contacto no permitidos".to_string()),
            };
        }

        let spam = lexicon::find_terms(&folded, lexicon::SPAM_TERMS);
        if spam.len() >= 2 {
            return FallbackVerdict {
                toxicity: 0.6,
                reason_code: ReasonCode::Spam,
                flagged_terms: to_owned(spam),
                reason: Some("Contenido promocional no permitido".to_string()),
            };
        }

        let moderate = lexicon::find_terms(&folded, lexicon::MODERATE_TERMS);
        if !moderate.is_empty() {
            return FallbackVerdict {
                toxicity: 0.6,
                reason_code: ReasonCode::Offensive,
                flagged_terms: to_owned(moderate),
                reason: Some("Lenguaje inapropiado detectado".to_string()),
            };
        }

        FallbackVerdict {
            toxicity: 0.1,
            reason_code: ReasonCode::None,
            flagged_terms: Vec::new(),
            reason: None,
        }
    }
}

fn to_owned(terms: Vec<&str>) -> Vec<String> {
    terms.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_scores_low() {
        let verdict = LocalToxicityFallback::new().score("Hermoso mirador con vista al valle");
        assert_eq!(verdict.toxicity, 0.1);
        assert_eq!(verdict.reason_code, ReasonCode::None);
        assert!(verdict.flagged_terms.is_empty());
    }

    #[test]
    fn extreme_terms_dominate_moderate_terms() {
        let verdict = LocalToxicityFallback::new().score("este idiota malparido");
        assert_eq!(verdict.toxicity, 0.9);
        assert_eq!(verdict.reason_code, ReasonCode::Offensive);
        assert_eq!(verdict.flagged_terms, vec!["malparido"]);
    }

    #[test]
    fn leet_disguises_are_caught() {
        let verdict = LocalToxicityFallback::new().score("h1juepu7a");
        assert_eq!(verdict.toxicity, 0.9);
    }

    #[test]
    fn contact_info_flags_links_or_contact() {
        let verdict = LocalToxicityFallback::new().score("escríbeme al 315 222 4455");
        assert_eq!(verdict.reason_code, ReasonCode::LinksOrContact);
        assert!(verdict.toxicity >= 0.6);
    }

    #[test]
    fn spam_needs_two_distinct_terms() {
        let one = LocalToxicityFallback::new().score("gran oferta en el mirador");
        assert_eq!(one.reason_code, ReasonCode::None);

        let two = LocalToxicityFallback::new().score("oferta con descuento imperdible");
        assert_eq!(two.reason_code, ReasonCode::Spam);
        assert!(two.toxicity >= 0.6);
    }
}
