// File: senda-core/src/cache/result_cache.rs

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use senda_common::models::{AnalysisResult, TextContext};

use crate::config::CacheSettings;
use crate::text::lexicon;

#[derive(Debug, Clone)]
struct CacheEntry {
    result: AnalysisResult,
    /// Insertion sequence number; the smallest is evicted first.
    sequence: u64,
    expires_at: Instant,
}

/// Short-TTL cache for text verdicts, keyed by (context, normalized-text
/// hash). Hashing the normalized text bounds key memory; storing per-key
/// entries in a DashMap keeps reads/writes atomic under concurrent
/// submissions. Expired entries are purged lazily on lookup; when the map is
/// full the oldest entry is evicted.
pub struct ModerationResultCache {
    entries: DashMap<(TextContext, u64), CacheEntry>,
    ttl: Duration,
    max_entries: usize,
    next_sequence: AtomicU64,
}

impl ModerationResultCache {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::from_secs(settings.ttl_secs),
            max_entries: settings.max_entries.max(1),
            next_sequence: AtomicU64::new(0),
        }
    }

    pub fn get(&self, context: TextContext, text: &str) -> Option<AnalysisResult> {
        let key = (context, hash_normalized(text));
        if let Some(entry) = self.entries.get(&key) {
            if entry.expires_at > Instant::now() {
                return Some(entry.result.clone());
            }
        }
        // lazy purge of the expired entry
        self.entries
            .remove_if(&key, |_, entry| entry.expires_at <= Instant::now());
        None
    }

    pub fn insert(&self, context: TextContext, text: &str, result: AnalysisResult) {
        if self.entries.len() >= self.max_entries {
            self.evict_oldest();
        }
        self.entries.insert(
            (context, hash_normalized(text)),
            CacheEntry {
                result,
                sequence: self.next_sequence.fetch_add(1, Ordering::Relaxed),
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().sequence)
            .map(|entry| *entry.key());
        if let Some(key) = oldest {
            debug!("Result cache full; evicting oldest entry.");
            self.entries.remove(&key);
        }
    }
}

fn hash_normalized(text: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    lexicon::normalize(text).hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use senda_common::models::{AnalysisMethod, QualityMetrics, ReasonCode};

    fn approved_result() -> AnalysisResult {
        AnalysisResult {
            approved: true,
            score: 0.9,
            flagged_terms: Vec::new(),
            reason_code: ReasonCode::None,
            method: AnalysisMethod::LocalFallback,
            quality_metrics: QualityMetrics::empty(),
            reason: None,
        }
    }

    fn cache(ttl_secs: u64, max_entries: usize) -> ModerationResultCache {
        ModerationResultCache::new(CacheSettings { ttl_secs, max_entries })
    }

    #[test]
    fn hit_within_ttl_and_normalization_folds_keys() {
        let cache = cache(60, 8);
        cache.insert(TextContext::GeneralContent, "Hola  Mundo", approved_result());
        assert!(cache.get(TextContext::GeneralContent, "hola mundo").is_some());
        // same text under another context is a different key
        assert!(cache.get(TextContext::PdfContent, "hola mundo").is_none());
    }

    #[test]
    fn expired_entries_are_purged_on_lookup() {
        let cache = cache(0, 8);
        cache.insert(TextContext::GeneralContent, "hola", approved_result());
        assert!(cache.get(TextContext::GeneralContent, "hola").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn capacity_is_bounded_by_evicting_the_oldest() {
        let cache = cache(60, 2);
        cache.insert(TextContext::GeneralContent, "uno", approved_result());
        cache.insert(TextContext::GeneralContent, "dos", approved_result());
        cache.insert(TextContext::GeneralContent, "tres", approved_result());
        assert_eq!(cache.len(), 2);
        assert!(cache.get(TextContext::GeneralContent, "uno").is_none());
        assert!(cache.get(TextContext::GeneralContent, "tres").is_some());
    }
}
