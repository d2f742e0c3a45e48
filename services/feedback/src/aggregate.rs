use crate::models::{Review, ReviewAggregate, ReviewType};

/// Compute dashboard statistics over a review set.
///
/// Reviews whose stored type is not recognized count toward the total but
/// toward neither type-specific count.
pub fn aggregate(reviews: &[Review]) -> ReviewAggregate {
    let mut summary = ReviewAggregate {
        total_count: reviews.len(),
        ..Default::default()
    };

    let mut rating_sum: i64 = 0;
    for review in reviews {
        rating_sum += i64::from(review.rating);
        match review.kind() {
            Some(ReviewType::Suggestion) => summary.suggestion_count += 1,
            Some(ReviewType::Complaint) => summary.complaint_count += 1,
            None => {}
        }
    }

    if !reviews.is_empty() {
        summary.average_rating = round_one_decimal(rating_sum as f64 / reviews.len() as f64);
    }

    summary
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
