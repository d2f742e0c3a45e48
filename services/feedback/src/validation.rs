use crate::clubs::{ClubLocationMap, LocationCheck};
use crate::error::ValidationError;
use crate::models::{
    FeedbackSubmission, PhotoUpload, RawSubmission, ReviewFilter, ReviewStatus, ReviewType,
};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Turn raw transport fields into a canonical submission.
///
/// Rules are checked in order and the first failure is returned:
/// 1. `clubId` present and non-empty
/// 2. `rating` an integer within 1..=5
/// 3. `type` one of `suggestion` / `complaint`
/// 4. `location`, when supplied for a configured club, must be listed for it
///
/// Optional text fields are passed through, with empty values treated as absent.
pub fn validate_submission(
    raw: RawSubmission,
    clubs: &ClubLocationMap,
) -> Result<FeedbackSubmission, ValidationError> {
    let club_id = non_empty(raw.club_id).ok_or_else(|| ValidationError::missing("clubId"))?;

    let rating = parse_rating(raw.rating.as_deref())?;

    let review_type = non_empty(raw.review_type)
        .ok_or_else(|| ValidationError::missing("type"))?
        .parse::<ReviewType>()
        .map_err(|e| ValidationError::invalid("type", e))?;

    let location = non_empty(raw.location);
    if let Some(location) = &location {
        if clubs.check_location(&club_id, location) == LocationCheck::NotListed {
            return Err(ValidationError::invalid(
                "location",
                format!("'{location}' is not a location of club '{club_id}'"),
            ));
        }
    }

    Ok(FeedbackSubmission {
        club_id,
        location,
        review_type,
        category: non_empty(raw.category),
        rating,
        comment: raw.comment.unwrap_or_default(),
        contact: non_empty(raw.contact),
        photo: raw.photo.filter(has_content),
    })
}

/// Build a dashboard filter from raw query values
pub fn parse_filter(
    club: Option<String>,
    status: Option<String>,
) -> Result<ReviewFilter, ValidationError> {
    let status = non_empty(status)
        .map(|s| s.parse::<ReviewStatus>())
        .transpose()
        .map_err(|e| ValidationError::invalid("status", e))?;

    Ok(ReviewFilter {
        club_id: non_empty(club),
        status,
    })
}

fn parse_rating(raw: Option<&str>) -> Result<i32, ValidationError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ValidationError::missing("rating"))?;

    let rating: i32 = raw
        .parse()
        .map_err(|_| ValidationError::invalid("rating", format!("'{raw}' is not an integer")))?;

    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ValidationError::invalid(
            "rating",
            format!("{rating} is outside {MIN_RATING}..={MAX_RATING}"),
        ));
    }

    Ok(rating)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// Browsers post an empty file part when no photo was chosen
fn has_content(photo: &PhotoUpload) -> bool {
    !photo.bytes.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldProblem;

    fn raw(club: &str, rating: &str, kind: &str) -> RawSubmission {
        RawSubmission {
            club_id: Some(club.to_string()),
            rating: Some(rating.to_string()),
            review_type: Some(kind.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_submission_passes_fields_through() {
        let mut input = raw("SPACE", "2", "complaint");
        input.location = Some("TRK".to_string());
        input.comment = Some("slow wifi".to_string());
        input.category = Some("".to_string());

        let submission = validate_submission(input, &ClubLocationMap::builtin()).unwrap();

        assert_eq!(submission.club_id, "SPACE");
        assert_eq!(submission.location.as_deref(), Some("TRK"));
        assert_eq!(submission.review_type, ReviewType::Complaint);
        assert_eq!(submission.rating, 2);
        assert_eq!(submission.comment, "slow wifi");
        assert_eq!(submission.category, None);
        assert_eq!(submission.photo, None);
    }

    #[test]
    fn test_comment_defaults_to_empty() {
        let submission =
            validate_submission(raw("LEVEL", "5", "suggestion"), &ClubLocationMap::builtin())
                .unwrap();
        assert_eq!(submission.comment, "");
    }

    #[test]
    fn test_missing_required_fields_in_order() {
        let clubs = ClubLocationMap::builtin();

        let err = validate_submission(RawSubmission::default(), &clubs).unwrap_err();
        assert_eq!(err, ValidationError::missing("clubId"));

        let err = validate_submission(raw("", "3", "complaint"), &clubs).unwrap_err();
        assert_eq!(err.field, "clubId");

        let mut input = raw("LEVEL", "3", "complaint");
        input.rating = None;
        assert_eq!(
            validate_submission(input, &clubs).unwrap_err(),
            ValidationError::missing("rating")
        );

        let mut input = raw("LEVEL", "3", "complaint");
        input.review_type = None;
        assert_eq!(
            validate_submission(input, &clubs).unwrap_err(),
            ValidationError::missing("type")
        );
    }

    #[test]
    fn test_rating_bounds() {
        let clubs = ClubLocationMap::builtin();

        for ok in ["1", "5", " 3 "] {
            assert!(validate_submission(raw("LEVEL", ok, "complaint"), &clubs).is_ok());
        }
        for bad in ["0", "6", "-1", "2.5", "five"] {
            let err = validate_submission(raw("LEVEL", bad, "complaint"), &clubs).unwrap_err();
            assert_eq!(err.field, "rating");
            assert!(matches!(err.problem, FieldProblem::Invalid(_)));
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = validate_submission(raw("LEVEL", "4", "praise"), &ClubLocationMap::builtin())
            .unwrap_err();
        assert_eq!(err.field, "type");
    }

    #[test]
    fn test_location_policy() {
        let clubs = ClubLocationMap::builtin();

        let mut foreign = raw("SPACE", "4", "suggestion");
        foreign.location = Some("ASTANA".to_string());
        assert_eq!(
            validate_submission(foreign, &clubs).unwrap_err().field,
            "location"
        );

        let mut single_site = raw("PINGWIN", "4", "suggestion");
        single_site.location = Some("MAIN".to_string());
        assert_eq!(
            validate_submission(single_site, &clubs).unwrap_err().field,
            "location"
        );

        let mut unconfigured = raw("NEWCLUB", "4", "suggestion");
        unconfigured.location = Some("ANY".to_string());
        let submission = validate_submission(unconfigured, &clubs).unwrap();
        assert_eq!(submission.location.as_deref(), Some("ANY"));

        let mut blank = raw("PINGWIN", "4", "suggestion");
        blank.location = Some(String::new());
        assert_eq!(validate_submission(blank, &clubs).unwrap().location, None);
    }

    #[test]
    fn test_empty_photo_is_absent() {
        let mut input = raw("LEVEL", "4", "suggestion");
        input.photo = Some(PhotoUpload {
            bytes: Vec::new(),
            content_type: Some("application/octet-stream".to_string()),
            filename: String::new(),
        });

        let submission = validate_submission(input, &ClubLocationMap::builtin()).unwrap();
        assert!(submission.photo.is_none());
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter(Some(String::new()), Some(String::new())).unwrap(),
            ReviewFilter::default()
        );

        let filter = parse_filter(Some("LEVEL".to_string()), Some("IN_PROGRESS".to_string()))
            .unwrap();
        assert_eq!(filter.club_id.as_deref(), Some("LEVEL"));
        assert_eq!(filter.status, Some(ReviewStatus::InProgress));

        let err = parse_filter(None, Some("DONE".to_string())).unwrap_err();
        assert_eq!(err.field, "status");
    }
}
