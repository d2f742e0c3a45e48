use super::ReviewRepository;
use crate::error::PersistenceError;
use crate::models::{FeedbackSubmission, Review, ReviewFilter, ReviewStatus};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local review repository, for tests and database-less runs
#[derive(Default)]
pub struct InMemoryReviewRepository {
    // Insertion order; newest last
    reviews: RwLock<Vec<Review>>,
}

impl InMemoryReviewRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.reviews.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.reviews.read().await.is_empty()
    }

    /// Insert a fully formed record, e.g. a fixture with a fixed timestamp
    pub async fn insert(&self, review: Review) {
        self.reviews.write().await.push(review);
    }
}

#[async_trait]
impl ReviewRepository for InMemoryReviewRepository {
    async fn create(
        &self,
        submission: &FeedbackSubmission,
        photo_url: Option<String>,
    ) -> Result<Review, PersistenceError> {
        let review = Review {
            id: Uuid::new_v4(),
            club_id: submission.club_id.clone(),
            location: submission.location.clone(),
            review_type: submission.review_type.as_str().to_string(),
            category: submission.category.clone(),
            rating: submission.rating,
            comment: submission.comment.clone(),
            contact: submission.contact.clone(),
            photo_url,
            status: ReviewStatus::New,
            created_at: Utc::now(),
        };

        self.reviews.write().await.push(review.clone());

        Ok(review)
    }

    async fn find(&self, filter: &ReviewFilter) -> Result<Vec<Review>, PersistenceError> {
        let reviews = self.reviews.read().await;

        // Reverse insertion order first so equal timestamps list the newest insert first
        let mut matching: Vec<Review> = reviews
            .iter()
            .rev()
            .filter(|review| filter.matches(review))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(matching)
    }

    async fn ping(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReviewType;
    use chrono::{Duration, TimeZone};

    fn submission(club: &str, kind: ReviewType, rating: i32) -> FeedbackSubmission {
        FeedbackSubmission {
            club_id: club.to_string(),
            location: None,
            review_type: kind,
            category: Some("service".to_string()),
            rating,
            comment: format!("{club} {rating}"),
            contact: None,
            photo: None,
        }
    }

    fn fixture(club: &str, status: ReviewStatus, minutes: i64) -> Review {
        Review {
            id: Uuid::new_v4(),
            club_id: club.to_string(),
            location: None,
            review_type: "suggestion".to_string(),
            category: None,
            rating: 4,
            comment: String::new(),
            contact: None,
            photo_url: None,
            status,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
                + Duration::minutes(minutes),
        }
    }

    #[test]
    fn test_create_assigns_identity_and_new_status() {
        let repo = InMemoryReviewRepository::new();

        let review = tokio_test::block_on(repo.create(
            &submission("LEVEL", ReviewType::Complaint, 2),
            Some("/uploads/a.jpg".to_string()),
        ))
        .unwrap();

        assert_eq!(review.status, ReviewStatus::New);
        assert_eq!(review.review_type, "complaint");
        assert_eq!(review.photo_url.as_deref(), Some("/uploads/a.jpg"));
        assert_eq!(tokio_test::block_on(repo.len()), 1);
    }

    #[tokio::test]
    async fn test_find_orders_newest_first_and_filters() {
        let repo = InMemoryReviewRepository::new();
        repo.insert(fixture("LEVEL", ReviewStatus::New, 1)).await;
        repo.insert(fixture("SPACE", ReviewStatus::Resolved, 3)).await;
        repo.insert(fixture("LEVEL", ReviewStatus::Resolved, 2)).await;

        let all = repo.find(&ReviewFilter::default()).await.unwrap();
        let order: Vec<_> = all.iter().map(|r| r.created_at).collect();
        let mut sorted = order.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(order, sorted);
        assert_eq!(all.len(), 3);

        let level = repo
            .find(&ReviewFilter {
                club_id: Some("LEVEL".to_string()),
                status: None,
            })
            .await
            .unwrap();
        assert_eq!(level.len(), 2);
        assert!(level.iter().all(|r| r.club_id == "LEVEL"));
        assert!(level[0].created_at > level[1].created_at);

        let resolved_level = repo
            .find(&ReviewFilter {
                club_id: Some("LEVEL".to_string()),
                status: Some(ReviewStatus::Resolved),
            })
            .await
            .unwrap();
        assert_eq!(resolved_level.len(), 1);

        let none = repo
            .find(&ReviewFilter {
                club_id: Some("PINGWIN".to_string()),
                status: None,
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_equal_timestamps_list_latest_insert_first() {
        let repo = InMemoryReviewRepository::new();
        let first = fixture("LEVEL", ReviewStatus::New, 0);
        let second = fixture("LEVEL", ReviewStatus::New, 0);
        repo.insert(first.clone()).await;
        repo.insert(second.clone()).await;

        let found = repo.find(&ReviewFilter::default()).await.unwrap();
        assert_eq!(found[0].id, second.id);
        assert_eq!(found[1].id, first.id);
    }
}
