//! services/api/src/adapters/tutor.rs
//!
//! Bounds a tutor adapter with a timeout. A slow tutor becomes a gateway
//! error, which the engine treats as "no draft" and keeps the doubt.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use study_tracker_core::{
    domain::Doubt,
    ports::{PortError, PortResult, TutorService},
};

#[derive(Clone)]
pub struct ResilientTutor {
    primary: Arc<dyn TutorService>,
    timeout: Duration,
}

impl ResilientTutor {
    pub fn new(primary: Arc<dyn TutorService>, timeout: Duration) -> Self {
        Self { primary, timeout }
    }
}

#[async_trait]
impl TutorService for ResilientTutor {
    async fn answer_doubt(&self, doubt: &Doubt) -> PortResult<String> {
        tokio::time::timeout(self.timeout, self.primary.answer_doubt(doubt))
            .await
            .map_err(|_| {
                PortError::Gateway(format!(
                    "Tutor did not answer within {} ms",
                    self.timeout.as_millis()
                ))
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use study_tracker_core::domain::DoubtStatus;
    use uuid::Uuid;

    struct Slow;

    #[async_trait]
    impl TutorService for Slow {
        async fn answer_doubt(&self, _doubt: &Doubt) -> PortResult<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".to_string())
        }
    }

    struct Quick;

    #[async_trait]
    impl TutorService for Quick {
        async fn answer_doubt(&self, doubt: &Doubt) -> PortResult<String> {
            Ok(format!("About {}", doubt.subject))
        }
    }

    fn doubt() -> Doubt {
        Doubt {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "What is a derivative?".to_string(),
            description: "Intuition please".to_string(),
            subject: "Mathematics".to_string(),
            tags: vec![],
            status: DoubtStatus::Open,
            upvotes: 0,
            is_anonymous: false,
            ai_answer: None,
            created_at: Utc::now(),
            version: 0,
        }
    }

    #[tokio::test]
    async fn slow_tutor_becomes_a_gateway_error() {
        let tutor = ResilientTutor::new(Arc::new(Slow), Duration::from_millis(50));
        let err = tutor.answer_doubt(&doubt()).await.unwrap_err();
        assert!(matches!(err, PortError::Gateway(_)));
    }

    #[tokio::test]
    async fn timely_answers_pass_through() {
        let tutor = ResilientTutor::new(Arc::new(Quick), Duration::from_secs(1));
        assert_eq!(tutor.answer_doubt(&doubt()).await.unwrap(), "About Mathematics");
    }
}
