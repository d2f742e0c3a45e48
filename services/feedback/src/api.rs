use crate::attachments::AttachmentStore;
use crate::clubs::{ClubLinks, ClubLocationMap};
use crate::config::{ApiConfig, DashboardConfig};
use crate::dashboard::{Dashboard, DashboardQuery, DashboardService};
use crate::error::{ErrorResponse, FeedbackError, ValidationError};
use crate::ingest::FeedbackIngest;
use crate::models::{PhotoUpload, RawSubmission, Review};
use crate::review_store::ReviewRepository;
use anyhow::{Context, Result};
use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<FeedbackIngest>,
    pub dashboard: Arc<DashboardService>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub clubs: Arc<ClubLocationMap>,
    pub auth: Arc<DashboardAuth>,
    pub public_base_url: String,
}

impl AppState {
    pub fn new(
        clubs: Arc<ClubLocationMap>,
        attachments: Arc<dyn AttachmentStore>,
        reviews: Arc<dyn ReviewRepository>,
        auth: DashboardAuth,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            ingest: Arc::new(FeedbackIngest::new(
                clubs.clone(),
                attachments,
                reviews.clone(),
            )),
            dashboard: Arc::new(DashboardService::new(reviews.clone())),
            reviews,
            clubs,
            auth: Arc::new(auth),
            public_base_url: public_base_url.into(),
        }
    }
}

type HmacSha256 = Hmac<Sha256>;

const TOKEN_DIGEST_KEY: &[u8] = b"feedback-dashboard-bearer";

/// Decides whether a dashboard caller is authorized.
///
/// Only digests of the configured tokens are kept. A presented token is
/// digested the same way and checked against every configured digest with
/// constant-time comparison.
#[derive(Debug, Clone, Default)]
pub struct DashboardAuth {
    token_digests: Vec<Vec<u8>>,
}

fn token_mac(token: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(TOKEN_DIGEST_KEY).ok()?;
    mac.update(token.as_bytes());
    Some(mac)
}

impl DashboardAuth {
    pub fn new(bearer_tokens: Vec<String>) -> Self {
        Self {
            token_digests: bearer_tokens
                .iter()
                .filter(|t| !t.is_empty())
                .filter_map(|t| token_mac(t))
                .map(|mac| mac.finalize().into_bytes().to_vec())
                .collect(),
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(config.bearer_tokens.clone())
    }

    /// No tokens configured
    pub fn is_open(&self) -> bool {
        self.token_digests.is_empty()
    }

    pub fn is_authorized(&self, headers: &HeaderMap) -> bool {
        if self.is_open() {
            return true;
        }

        let Some(mac) = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .and_then(token_mac)
        else {
            return false;
        };

        // No short-circuit: every configured digest is compared
        self.token_digests.iter().fold(false, |matched, digest| {
            mac.clone().verify_slice(digest).is_ok() | matched
        })
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), FeedbackError> {
        if self.is_authorized(headers) {
            Ok(())
        } else {
            Err(FeedbackError::Unauthorized)
        }
    }
}

/// Upload directory exposed over HTTP by the local attachment backend
#[derive(Debug, Clone)]
pub struct ServedUploads {
    pub url_prefix: String,
    pub dir: PathBuf,
}

/// One club's locations, for rendering a feedback form
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubLocations {
    pub club_id: String,
    pub locations: Vec<String>,
}

/// Create the API router
pub fn create_router(
    state: AppState,
    config: &ApiConfig,
    uploads: Option<ServedUploads>,
) -> Router {
    let cors = if config.cors_enabled {
        if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    } else {
        CorsLayer::new()
    };

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route(
            "/api/feedback",
            post(submit_feedback).layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .route("/api/v1/reviews", get(list_reviews))
        .route("/api/v1/clubs", get(club_links))
        .route("/api/v1/clubs/:club_id", get(club_locations));

    if let Some(uploads) = uploads {
        let prefix = uploads.url_prefix.trim_end_matches('/');
        if prefix.starts_with('/') && prefix.len() > 1 {
            router = router.nest_service(prefix, ServeDir::new(&uploads.dir));
        } else {
            warn!(url_prefix = %uploads.url_prefix, "Upload prefix is not a local path, not serving uploads");
        }
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "feedback-service"
    }))
}

/// Readiness check endpoint
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.reviews.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "database": "connected"
            })),
        ),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "not_ready",
                    "database": "disconnected"
                })),
            )
        }
    }
}

/// Accept a multipart feedback submission
async fn submit_feedback(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Review>, FeedbackError> {
    let multipart = multipart.map_err(|e| {
        warn!(error = %e, "Rejected non-multipart submission");
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            FeedbackError::PayloadTooLarge
        } else {
            ValidationError::invalid("body", e.body_text()).into()
        }
    })?;

    let raw = read_submission(multipart).await.map_err(|e| {
        metrics::counter!("feedback.submissions.rejected", "reason" => e.reason()).increment(1);
        warn!(error = %e, "Malformed multipart submission");
        e
    })?;

    let review = state.ingest.submit(raw).await?;

    Ok(Json(review))
}

/// Body errors past the size limit are reported as such, not as a bad field
fn multipart_error(field: &'static str, e: MultipartError) -> FeedbackError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        FeedbackError::PayloadTooLarge
    } else {
        ValidationError::invalid(field, e.body_text()).into()
    }
}

async fn read_submission(mut multipart: Multipart) -> Result<RawSubmission, FeedbackError> {
    let mut raw = RawSubmission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("body", e))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "clubId" => raw.club_id = Some(field_text(field, "clubId").await?),
            "location" => raw.location = Some(field_text(field, "location").await?),
            "type" => raw.review_type = Some(field_text(field, "type").await?),
            "category" => raw.category = Some(field_text(field, "category").await?),
            "rating" => raw.rating = Some(field_text(field, "rating").await?),
            "comment" => raw.comment = Some(field_text(field, "comment").await?),
            "contact" => raw.contact = Some(field_text(field, "contact").await?),
            "photo" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("photo", e))?;

                raw.photo = Some(PhotoUpload {
                    bytes: bytes.to_vec(),
                    content_type,
                    filename,
                });
            }
            _ => {}
        }
    }

    Ok(raw)
}

async fn field_text(field: Field<'_>, name: &'static str) -> Result<String, FeedbackError> {
    field.text().await.map_err(|e| multipart_error(name, e))
}

/// Filtered review list with aggregate statistics
async fn list_reviews(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Dashboard>, FeedbackError> {
    state.auth.authorize(&headers)?;

    let dashboard = state.dashboard.query(query).await.map_err(|e| {
        match &e {
            FeedbackError::Validation(_) => warn!(error = %e, "Dashboard query rejected"),
            _ => tracing::error!(error = %e, "Failed to query reviews"),
        }
        e
    })?;

    Ok(Json(dashboard))
}

/// Feedback form links for every configured club
async fn club_links(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ClubLinks>>, FeedbackError> {
    state.auth.authorize(&headers)?;

    Ok(Json(state.clubs.feedback_links(&state.public_base_url)))
}

/// Locations of one club
async fn club_locations(
    State(state): State<AppState>,
    Path(club_id): Path<String>,
) -> Result<Json<ClubLocations>, (StatusCode, Json<ErrorResponse>)> {
    match state.clubs.locations(&club_id) {
        Some(locations) => Ok(Json(ClubLocations {
            club_id,
            locations: locations.to_vec(),
        })),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Club not found".to_string(),
                code: "NOT_FOUND".to_string(),
            }),
        )),
    }
}

/// Start the feedback API server
pub async fn start_api_server(
    state: AppState,
    config: &ApiConfig,
    uploads: Option<ServedUploads>,
) -> Result<()> {
    let router = create_router(state, config, uploads);
    let addr = format!("{}:{}", config.host, config.port);

    info!(address = %addr, "Starting feedback API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, router)
        .await
        .context("API server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(authorization).unwrap());
        headers
    }

    #[test]
    fn test_open_dashboard_allows_everyone() {
        let auth = DashboardAuth::new(vec![String::new()]);
        assert!(auth.is_open());
        assert!(auth.is_authorized(&HeaderMap::new()));
    }

    #[test]
    fn test_bearer_token_required() {
        let auth = DashboardAuth::new(vec!["s3cret".to_string(), "other".to_string()]);

        assert!(auth.is_authorized(&headers("Bearer s3cret")));
        assert!(auth.is_authorized(&headers("Bearer other")));
        assert!(!auth.is_authorized(&headers("Bearer wrong")));
        assert!(!auth.is_authorized(&headers("Bearer s3cre")));
        assert!(!auth.is_authorized(&headers("Bearer s3cretX")));
        assert!(!auth.is_authorized(&headers("s3cret")));
        assert!(!auth.is_authorized(&HeaderMap::new()));
        assert!(matches!(
            auth.authorize(&HeaderMap::new()),
            Err(FeedbackError::Unauthorized)
        ));
    }
}
