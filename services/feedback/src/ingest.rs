use crate::attachments::AttachmentStore;
use crate::clubs::ClubLocationMap;
use crate::error::FeedbackError;
use crate::models::{RawSubmission, Review};
use crate::review_store::ReviewRepository;
use crate::validation::validate_submission;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Submission pipeline: validate, store the photo, persist the review.
///
/// The photo upload completes before the review insert starts, so a stored
/// review never points at a missing attachment. A failed insert after a
/// successful upload leaves an orphaned object behind.
pub struct FeedbackIngest {
    clubs: Arc<ClubLocationMap>,
    attachments: Arc<dyn AttachmentStore>,
    reviews: Arc<dyn ReviewRepository>,
}

impl FeedbackIngest {
    pub fn new(
        clubs: Arc<ClubLocationMap>,
        attachments: Arc<dyn AttachmentStore>,
        reviews: Arc<dyn ReviewRepository>,
    ) -> Self {
        Self {
            clubs,
            attachments,
            reviews,
        }
    }

    #[instrument(skip_all, fields(club_id = raw.club_id.as_deref().unwrap_or_default()))]
    pub async fn submit(&self, raw: RawSubmission) -> Result<Review, FeedbackError> {
        let result = self.process(raw).await;

        match &result {
            Ok(review) => {
                metrics::counter!("feedback.submissions.accepted").increment(1);
                info!(
                    review_id = %review.id,
                    has_photo = review.photo_url.is_some(),
                    "Review created"
                );
            }
            Err(e) => {
                metrics::counter!("feedback.submissions.rejected", "reason" => e.reason())
                    .increment(1);
                match e {
                    FeedbackError::Validation(_) => warn!(error = %e, "Submission rejected"),
                    _ => error!(error = %e, "Submission failed"),
                }
            }
        }

        result
    }

    async fn process(&self, raw: RawSubmission) -> Result<Review, FeedbackError> {
        let submission = validate_submission(raw, &self.clubs)?;

        let photo_url = match &submission.photo {
            Some(photo) => {
                let url = self
                    .attachments
                    .store(&submission.club_id, photo)
                    .await?;
                let backend = self.attachments.backend_tag();
                metrics::counter!("feedback.attachments.stored", "backend" => backend)
                    .increment(1);
                metrics::histogram!("feedback.attachments.bytes").record(photo.bytes.len() as f64);
                Some(url)
            }
            None => None,
        };

        let review = self.reviews.create(&submission, photo_url).await?;

        Ok(review)
    }
}
