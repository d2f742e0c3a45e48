use anyhow::{Context, Result};
use feedback_service::api::{start_api_server, AppState, DashboardAuth, ServedUploads};
use feedback_service::attachments::build_attachment_store;
use feedback_service::config::{AttachmentBackend, Config};
use feedback_service::review_store::PgReviewRepository;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    init_tracing(&config.service.log_level);

    info!(
        service = %config.service.name,
        clubs = config.clubs.len(),
        "Starting feedback service"
    );

    init_metrics(config.service.metrics_port)?;

    let repository = Arc::new(
        PgReviewRepository::new(&config.database)
            .await
            .context("Failed to initialize review repository")?,
    );

    if config.database.run_migrations {
        repository
            .run_migrations()
            .await
            .context("Failed to run database migrations")?;
    }

    let attachments = build_attachment_store(&config.attachments).await?;

    let auth = DashboardAuth::from_config(&config.dashboard);
    if auth.is_open() {
        warn!("No dashboard bearer tokens configured, review listing is unauthenticated");
    }

    let uploads = match config.attachments.backend {
        AttachmentBackend::Local => Some(ServedUploads {
            url_prefix: config.attachments.local.url_prefix.clone(),
            dir: config.attachments.local.upload_dir.clone(),
        }),
        AttachmentBackend::S3 => None,
    };

    let api_state = AppState::new(
        Arc::new(config.club_map()),
        attachments,
        repository,
        auth,
        config.service.public_base_url.clone(),
    );

    let api_config = config.api.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = start_api_server(api_state, &api_config, uploads).await {
            error!(error = %e, "API server error");
        }
    });

    info!("Feedback service started successfully");

    shutdown_signal().await;

    info!("Shutting down feedback service");

    api_handle.abort();

    info!("Feedback service stopped");

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .init();
}

/// Initialize Prometheus metrics exporter
fn init_metrics(port: u16) -> Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus metrics exporter")?;

    info!(port = port, "Prometheus metrics exporter started");

    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
