use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hms_api::cleanup::CleanupScheduler;
use hms_api::config::ServerConfig;
use hms_api::router::build_app_router;
use hms_api::seed::seed_admin;
use hms_api::state::AppState;
use hms_events::{EmailConfig, EmailDelivery, EmailNotifier, EventBus};
use hms_sensor::{SensorConfig, SensorManager};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "hms_api=debug,hms_events=info,hms_sensor=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let sensor_config = SensorConfig::from_env();
    tracing::info!(
        port = ?sensor_config.port,
        baudrate = sensor_config.baudrate,
        "Loaded fingerprint sensor configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = hms_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    hms_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    hms_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    if let Some(seed) = &config.admin_seed {
        seed_admin(&pool, seed)
            .await
            .expect("Failed to seed admin account");
    }

    // --- Fingerprint sensor ---
    // Connection is deferred to the first initialize call from the console.
    let sensor = SensorManager::with_serial(sensor_config);

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());

    let email_delivery = EmailConfig::from_env().map(EmailDelivery::new);
    if email_delivery.is_none() {
        tracing::warn!("SMTP_HOST not set, notification e-mails will only be logged");
    }
    let notifier_handle = tokio::spawn(EmailNotifier::run(email_delivery, event_bus.subscribe()));

    // --- Expired row cleanup ---
    let cleanup_cancel = tokio_util::sync::CancellationToken::new();
    let cleanup = CleanupScheduler::new(pool.clone());
    let cleanup_cancel_clone = cleanup_cancel.clone();
    let cleanup_handle = tokio::spawn(async move {
        cleanup.run(cleanup_cancel_clone).await;
    });

    tracing::info!("Background services started (e-mail notifier, cleanup scheduler)");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        sensor,
        event_bus: Arc::clone(&event_bus),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let grace = Duration::from_secs(config.shutdown_timeout_secs);

    cleanup_cancel.cancel();
    let _ = tokio::time::timeout(grace, cleanup_handle).await;
    tracing::info!("Cleanup scheduler stopped");

    // Closing the bus ends the notifier loop once queued e-mails are sent.
    drop(event_bus);
    if tokio::time::timeout(grace, notifier_handle).await.is_err() {
        tracing::warn!("E-mail notifier did not finish before the shutdown timeout");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
