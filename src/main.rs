use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use doc_intake::app_state::AppState;
use doc_intake::config::AppConfig;
use doc_intake::routes;
use doc_intake::services::clock::TokioClock;
use doc_intake::services::driver::IntakeService;
use doc_intake::services::engine::IntakeEngine;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing doc-intake server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!(
        "intake_files_accepted_total",
        "Documents accepted by validation"
    );
    metrics::describe_counter!(
        "intake_files_rejected_total",
        "Documents dropped by validation, by reason"
    );
    metrics::describe_counter!(
        "intake_files_completed_total",
        "Documents that reached the completed state"
    );
    metrics::describe_counter!(
        "intake_files_removed_total",
        "Documents removed before or after completion"
    );
    metrics::describe_gauge!(
        "intake_files_in_flight",
        "Documents currently uploading or processing"
    );

    tracing::info!(
        max_file_bytes = config.max_file_bytes,
        upload_tick_ms = config.upload_tick_ms,
        processing_tick_ms = config.processing_tick_ms,
        settle_delay_ms = config.settle_delay_ms,
        seeded = config.rng_seed.is_some(),
        "Starting intake driver"
    );

    let engine = IntakeEngine::new(Box::new(TokioClock::new()), config.delta_streams())
        .with_policy(config.policy())
        .with_timing(config.timing())
        .with_analysis_base(config.analysis_base_path.clone());
    let intake = IntakeService::start(engine);

    let state = AppState::new(intake);

    let app = routes::api_router(state.clone(), config.max_request_bytes)
        .merge(
            Router::new()
                .route("/metrics", get(routes::prometheus_metrics))
                .with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    state.intake.shutdown();
    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
