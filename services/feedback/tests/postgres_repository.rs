use std::time::Duration;

use feedback_service::config::DatabaseConfig;
use feedback_service::models::{FeedbackSubmission, ReviewFilter, ReviewStatus, ReviewType};
use feedback_service::review_store::{PgReviewRepository, ReviewRepository};
use uuid::Uuid;

async fn repository() -> Option<PgReviewRepository> {
    let url = match std::env::var("FEEDBACK_TEST_DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("skipping postgres repository test: FEEDBACK_TEST_DATABASE_URL not set");
            return None;
        }
    };
    let config = DatabaseConfig {
        url,
        max_connections: 2,
        min_connections: 1,
        connect_timeout_secs: 10,
        idle_timeout_secs: 60,
        run_migrations: true,
    };
    let repo = PgReviewRepository::new(&config)
        .await
        .expect("connect postgres");
    repo.run_migrations().await.expect("run migrations");
    Some(repo)
}

fn submission(club: &str, kind: ReviewType, rating: i32) -> FeedbackSubmission {
    FeedbackSubmission {
        club_id: club.to_string(),
        location: Some("TRK".to_string()),
        review_type: kind,
        category: None,
        rating,
        comment: format!("{club} rated {rating}"),
        contact: Some("guest@example.com".to_string()),
        photo: None,
    }
}

#[tokio::test]
#[ignore = "requires FEEDBACK_TEST_DATABASE_URL and a local PostgreSQL"]
async fn find_filters_and_orders_newest_first() {
    let Some(repo) = repository().await else {
        return;
    };
    repo.ping().await.expect("ping");

    // Unique clubs keep runs against a shared database apart
    let club = format!("PG{}", Uuid::new_v4().simple());
    let other = format!("PG{}", Uuid::new_v4().simple());

    let mut created = Vec::new();
    for (club_id, kind, rating) in [
        (&club, ReviewType::Suggestion, 5),
        (&other, ReviewType::Complaint, 1),
        (&club, ReviewType::Complaint, 2),
    ] {
        let review = repo
            .create(
                &submission(club_id, kind, rating),
                Some(format!("/uploads/{club_id}-{rating}.jpg")),
            )
            .await
            .expect("create review");
        created.push(review);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let found = repo
        .find(&ReviewFilter {
            club_id: Some(club.clone()),
            status: None,
        })
        .await
        .expect("find by club");
    assert_eq!(found, vec![created[2].clone(), created[0].clone()]);
    assert!(found.iter().all(|r| r.status == ReviewStatus::New));

    let new_only = repo
        .find(&ReviewFilter {
            club_id: Some(club.clone()),
            status: Some(ReviewStatus::New),
        })
        .await
        .expect("find by club and status");
    assert_eq!(new_only.len(), 2);

    let resolved = repo
        .find(&ReviewFilter {
            club_id: Some(club.clone()),
            status: Some(ReviewStatus::Resolved),
        })
        .await
        .expect("find resolved");
    assert!(resolved.is_empty());

    let all = repo
        .find(&ReviewFilter::default())
        .await
        .expect("find all");
    let ours: Vec<_> = all
        .iter()
        .filter(|r| r.club_id == club || r.club_id == other)
        .map(|r| r.id)
        .collect();
    assert_eq!(ours, vec![created[2].id, created[1].id, created[0].id]);
    assert!(all
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));
}
