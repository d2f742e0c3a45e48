use crate::aggregate::aggregate;
use crate::error::FeedbackError;
use crate::models::{Review, ReviewAggregate};
use crate::review_store::ReviewRepository;
use crate::validation::parse_filter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Raw dashboard filter as it arrives in the query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub club: Option<String>,
    pub status: Option<String>,
}

/// Filtered reviews together with their statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub reviews: Vec<Review>,
    pub aggregate: ReviewAggregate,
}

/// Read side of the review dashboard; never writes
pub struct DashboardService {
    reviews: Arc<dyn ReviewRepository>,
}

impl DashboardService {
    pub fn new(reviews: Arc<dyn ReviewRepository>) -> Self {
        Self { reviews }
    }

    #[instrument(skip(self))]
    pub async fn query(&self, query: DashboardQuery) -> Result<Dashboard, FeedbackError> {
        let filter = parse_filter(query.club, query.status)?;

        let reviews = self.reviews.find(&filter).await?;
        let aggregate = aggregate(&reviews);

        metrics::counter!("feedback.dashboard.queries").increment(1);
        debug!(
            total = aggregate.total_count,
            average = aggregate.average_rating,
            "Dashboard computed"
        );

        Ok(Dashboard { reviews, aggregate })
    }
}
