//! Durable review records.

pub mod memory;
pub mod postgres;

use crate::error::PersistenceError;
use crate::models::{FeedbackSubmission, Review, ReviewFilter};
use async_trait::async_trait;

pub use memory::InMemoryReviewRepository;
pub use postgres::PgReviewRepository;

/// Storage for reviews created by the ingestion pipeline
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Insert one review with status NEW and a server-assigned id and timestamp
    async fn create(
        &self,
        submission: &FeedbackSubmission,
        photo_url: Option<String>,
    ) -> Result<Review, PersistenceError>;

    /// Reviews matching the filter, newest first
    async fn find(&self, filter: &ReviewFilter) -> Result<Vec<Review>, PersistenceError>;

    /// Cheap connectivity check for readiness probes
    async fn ping(&self) -> Result<(), PersistenceError>;
}
