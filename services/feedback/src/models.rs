use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of feedback a visitor leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewType {
    Suggestion,
    Complaint,
}

impl ReviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewType::Suggestion => "suggestion",
            ReviewType::Complaint => "complaint",
        }
    }
}

impl FromStr for ReviewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "suggestion" => Ok(ReviewType::Suggestion),
            "complaint" => Ok(ReviewType::Complaint),
            other => Err(format!("unknown review type '{other}'")),
        }
    }
}

impl fmt::Display for ReviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator workflow status of a review
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    #[default]
    New,
    InProgress,
    Resolved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::New => "NEW",
            ReviewStatus::InProgress => "IN_PROGRESS",
            ReviewStatus::Resolved => "RESOLVED",
            ReviewStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(ReviewStatus::New),
            "IN_PROGRESS" => Ok(ReviewStatus::InProgress),
            "RESOLVED" => Ok(ReviewStatus::Resolved),
            "REJECTED" => Ok(ReviewStatus::Rejected),
            other => Err(format!("unknown review status '{other}'")),
        }
    }
}

impl TryFrom<String> for ReviewStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uploaded photo as received from the client
#[derive(Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    /// Raw image bytes
    pub bytes: Vec<u8>,
    /// Declared content type, if the client sent one
    pub content_type: Option<String>,
    /// Original file name on the client
    pub filename: String,
}

impl fmt::Debug for PhotoUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoUpload")
            .field("size_bytes", &self.bytes.len())
            .field("content_type", &self.content_type)
            .field("filename", &self.filename)
            .finish()
    }
}

/// Untyped submission fields exactly as the transport delivered them
#[derive(Debug, Clone, Default)]
pub struct RawSubmission {
    pub club_id: Option<String>,
    pub location: Option<String>,
    pub review_type: Option<String>,
    pub category: Option<String>,
    pub rating: Option<String>,
    pub comment: Option<String>,
    pub contact: Option<String>,
    pub photo: Option<PhotoUpload>,
}

/// Validated, canonical feedback submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackSubmission {
    pub club_id: String,
    pub location: Option<String>,
    pub review_type: ReviewType,
    pub category: Option<String>,
    /// Always within 1..=5
    pub rating: i32,
    pub comment: String,
    pub contact: Option<String>,
    pub photo: Option<PhotoUpload>,
}

/// Stored review record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub club_id: String,
    pub location: Option<String>,
    /// Kept as text so rows written by older clients still load
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub review_type: String,
    pub category: Option<String>,
    pub rating: i32,
    pub comment: String,
    pub contact: Option<String>,
    pub photo_url: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Parsed review type; `None` for unrecognized stored values
    pub fn kind(&self) -> Option<ReviewType> {
        self.review_type.parse().ok()
    }
}

/// Dashboard filter; `None` matches every value of that dimension
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFilter {
    pub club_id: Option<String>,
    pub status: Option<ReviewStatus>,
}

impl ReviewFilter {
    pub fn matches(&self, review: &Review) -> bool {
        self.club_id
            .as_deref()
            .map_or(true, |club| review.club_id == club)
            && self.status.map_or(true, |status| review.status == status)
    }
}

/// Summary statistics over a filtered review set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAggregate {
    pub total_count: usize,
    /// Rounded to one decimal place, 0.0 for an empty set
    pub average_rating: f64,
    pub suggestion_count: usize,
    pub complaint_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_review() -> Review {
        Review {
            id: Uuid::nil(),
            club_id: "LEVEL".to_string(),
            location: Some("ASTANA".to_string()),
            review_type: "complaint".to_string(),
            category: None,
            rating: 2,
            comment: "cold showers".to_string(),
            contact: None,
            photo_url: None,
            status: ReviewStatus::New,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_review_serializes_camel_case() {
        let json = serde_json::to_value(sample_review()).unwrap();

        assert_eq!(json["clubId"], "LEVEL");
        assert_eq!(json["type"], "complaint");
        assert_eq!(json["status"], "NEW");
        assert!(json["photoUrl"].is_null());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            ReviewStatus::New,
            ReviewStatus::InProgress,
            ReviewStatus::Resolved,
            ReviewStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<ReviewStatus>(), Ok(status));
        }
        assert!("new".parse::<ReviewStatus>().is_err());
    }

    #[test]
    fn test_unknown_stored_type_has_no_kind() {
        let mut review = sample_review();
        review.review_type = "praise".to_string();
        assert_eq!(review.kind(), None);
    }

    #[test]
    fn test_filter_matches() {
        let review = sample_review();

        assert!(ReviewFilter::default().matches(&review));
        assert!(ReviewFilter {
            club_id: Some("LEVEL".to_string()),
            status: Some(ReviewStatus::New),
        }
        .matches(&review));
        assert!(!ReviewFilter {
            club_id: Some("SPACE".to_string()),
            status: None,
        }
        .matches(&review));
        assert!(!ReviewFilter {
            club_id: None,
            status: Some(ReviewStatus::Resolved),
        }
        .matches(&review));
    }
}
