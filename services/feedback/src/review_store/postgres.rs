use super::ReviewRepository;
use crate::config::DatabaseConfig;
use crate::error::PersistenceError;
use crate::models::{FeedbackSubmission, Review, ReviewFilter, ReviewStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, instrument};
use uuid::Uuid;

const REVIEW_COLUMNS: &str = r#"
    id, club_id, location, type, category, rating,
    comment, contact, photo_url, status, created_at
"#;

/// Review repository backed by PostgreSQL
pub struct PgReviewRepository {
    pool: PgPool,
}

impl PgReviewRepository {
    /// Create a new repository with connection pool
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout())
            .idle_timeout(Some(config.idle_timeout()))
            .connect(&config.url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        info!("Connected to PostgreSQL database");

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;

        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    #[instrument(skip(self, submission), fields(club_id = %submission.club_id))]
    async fn create(
        &self,
        submission: &FeedbackSubmission,
        photo_url: Option<String>,
    ) -> Result<Review, PersistenceError> {
        let review_id = Uuid::new_v4();

        let sql = format!(
            r#"
            INSERT INTO reviews (
                id, club_id, location, type, category, rating,
                comment, contact, photo_url, status, created_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6,
                $7, $8, $9, $10, NOW()
            )
            RETURNING {REVIEW_COLUMNS}
            "#
        );

        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(review_id)
            .bind(&submission.club_id)
            .bind(&submission.location)
            .bind(submission.review_type.as_str())
            .bind(&submission.category)
            .bind(submission.rating)
            .bind(&submission.comment)
            .bind(&submission.contact)
            .bind(&photo_url)
            .bind(ReviewStatus::New.as_str())
            .fetch_one(&self.pool)
            .await?;

        debug!(review_id = %review.id, "Review inserted");

        Ok(review)
    }

    #[instrument(skip(self))]
    async fn find(&self, filter: &ReviewFilter) -> Result<Vec<Review>, PersistenceError> {
        let sql = format!(
            r#"
            SELECT {REVIEW_COLUMNS}
            FROM reviews
            WHERE ($1::text IS NULL OR club_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            "#
        );

        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(filter.club_id.as_deref())
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

        Ok(reviews)
    }

    async fn ping(&self) -> Result<(), PersistenceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
