//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use study_tracker_core::{
    ports::{RecommendationService, TutorService},
    StudyTracker,
};

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<StudyTracker>,
    /// Expected to be best-effort; see `ResilientRecommender`.
    pub recommender: Arc<dyn RecommendationService>,
    /// Drafts answers for new doubts; `None` when no AI key is configured.
    pub tutor: Option<Arc<dyn TutorService>>,
    pub config: Arc<Config>,
}
