//! services/api/src/adapters/recommendations.rs
//!
//! Best-effort wrappers around the recommendation port: a static adapter that
//! always answers with the generic suggestions, and a resilient wrapper that
//! bounds a primary adapter with a timeout and degrades to the same fallback.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use study_tracker_core::{
    domain::{StudySuggestions, StudySummary},
    ports::{PortResult, RecommendationService},
};
use tracing::{debug, warn};

/// Always returns the fixed fallback suggestions.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticRecommendationAdapter;

#[async_trait]
impl RecommendationService for StaticRecommendationAdapter {
    async fn summarize(&self, _summary: &StudySummary) -> PortResult<StudySuggestions> {
        Ok(StudySuggestions::fallback())
    }
}

/// Wraps an optional primary recommender. Errors, timeouts and a missing
/// primary all yield the fallback set, so `summarize` never fails.
#[derive(Clone)]
pub struct ResilientRecommender {
    primary: Option<Arc<dyn RecommendationService>>,
    timeout: Duration,
}

impl ResilientRecommender {
    pub fn new(primary: Option<Arc<dyn RecommendationService>>, timeout: Duration) -> Self {
        Self { primary, timeout }
    }

    /// A recommender that never calls out.
    pub fn fallback_only() -> Self {
        Self::new(None, Duration::ZERO)
    }
}

#[async_trait]
impl RecommendationService for ResilientRecommender {
    async fn summarize(&self, summary: &StudySummary) -> PortResult<StudySuggestions> {
        let Some(primary) = &self.primary else {
            debug!("No recommendation gateway configured, using fallback suggestions");
            return Ok(StudySuggestions::fallback());
        };

        match tokio::time::timeout(self.timeout, primary.summarize(summary)).await {
            Ok(Ok(suggestions)) => Ok(suggestions.or_fallback()),
            Ok(Err(e)) => {
                warn!("Recommendation gateway failed, using fallback: {}", e);
                Ok(StudySuggestions::fallback())
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Recommendation gateway timed out, using fallback"
                );
                Ok(StudySuggestions::fallback())
            }
        }
    }
}
