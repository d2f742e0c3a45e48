//! Venue Feedback Service
//!
//! Collects guest feedback for a small chain of venues ("clubs") and serves
//! it back to staff. Guests submit a multipart form with a rating, a comment
//! and optionally a photo; staff browse the stored reviews filtered by club
//! and status, together with summary statistics.
//!
//! ## Features
//!
//! - **Validated Ingestion**: Club, rating, type and location checks with
//!   field-level error reporting
//! - **Pluggable Attachment Storage**: Local directory served over HTTP, or
//!   S3-compatible object storage with multipart uploads for large photos
//! - **PostgreSQL Persistence**: Reviews indexed by club, status and
//!   creation time
//! - **Review Dashboard**: Filtered listings with total count, average rating
//!   and per-type counts
//!
//! ## Architecture
//!
//! ```text
//!  Feedback form                                    Staff dashboard
//! ┌──────────────┐                                 ┌──────────────┐
//! │ POST         │                                 │ GET          │
//! │ /api/feedback│                                 │ /api/v1/     │
//! └──────────────┘                                 │   reviews    │
//!        │                                         └──────────────┘
//!        ▼                                                │
//! ┌──────────────┐     ┌──────────────┐                   ▼
//! │ Validation   │────▶│ Attachment   │            ┌──────────────┐
//! │ (club map)   │     │ Store        │            │ Dashboard    │
//! └──────────────┘     │ local / S3   │            │ + Aggregate  │
//!                      └──────────────┘            └──────────────┘
//!                             │                           ▲
//!                             ▼                           │
//!                      ┌──────────────┐                   │
//!                      │ Review       │───────────────────┘
//!                      │ Repository   │
//!                      │ (PostgreSQL) │
//!                      └──────────────┘
//! ```

pub mod aggregate;
pub mod api;
pub mod attachments;
pub mod clubs;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod ingest;
pub mod models;
pub mod review_store;
pub mod validation;

pub use aggregate::aggregate;
pub use api::{create_router, AppState, DashboardAuth, ServedUploads};
pub use attachments::{AttachmentStore, LocalAttachmentStore, S3AttachmentStore};
pub use clubs::ClubLocationMap;
pub use config::Config;
pub use dashboard::{Dashboard, DashboardQuery, DashboardService};
pub use error::{FeedbackError, PersistenceError, StorageError, ValidationError};
pub use ingest::FeedbackIngest;
pub use models::{
    FeedbackSubmission, PhotoUpload, RawSubmission, Review, ReviewAggregate, ReviewFilter,
    ReviewStatus, ReviewType,
};
pub use review_store::{InMemoryReviewRepository, PgReviewRepository, ReviewRepository};
pub use validation::{parse_filter, validate_submission};
