use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;

use ara_email_service::config::Settings;
use ara_email_service::locale::LocaleStore;
use ara_email_service::mail::{create_transport, InlineImage};
use ara_email_service::server::{create_app, AppState};
use ara_email_service::tasks::RateLimitCleanupTask;
use ara_email_service::telemetry::init_telemetry;
use ara_email_service::template::{EmailRenderer, TemplateConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing; keep the guard alive until shutdown
    let _telemetry = init_telemetry(&settings.otel, &settings.log)?;

    settings.validate()?;
    tracing::info!("Configuration loaded");

    // Every locale bundle must load before serving
    let store = Arc::new(LocaleStore::load(&settings.templates.locales)?);

    let logo = InlineImage::load(&settings.templates.logo, &settings.templates.cid);
    let logo_url = logo.as_ref().map(|_| settings.templates.logo_url());

    let template_config = TemplateConfig {
        templates_dir: settings.templates.dir.clone(),
        partials_dir: settings.templates.partials_dir(),
    };
    let renderer = Arc::new(EmailRenderer::new(template_config, store, logo_url)?);
    tracing::info!(dir = %settings.templates.dir.display(), "Template engine initialized");

    let mailer = create_transport(&settings.smtp, logo)?;
    if !mailer.verify().await {
        tracing::warn!(
            host = %settings.smtp.host,
            port = settings.smtp.port,
            "Mail relay is not reachable, sends will fail until it is"
        );
    }

    // Create application state
    let state = AppState::new(settings.clone(), renderer, mailer);
    tracing::info!("Application state initialized");

    let (shutdown_tx, _) = broadcast::channel(1);

    // Start rate limit bucket cleanup in background
    let cleanup_task = RateLimitCleanupTask::new(state.rate_limiter.clone(), shutdown_tx.subscribe());
    let cleanup_handle = tokio::spawn(cleanup_task.run());

    // Create Axum app
    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal_handler(shutdown_tx))
    .await?;

    // Wait for background tasks to finish
    tracing::info!("Waiting for background tasks to finish...");
    let _ = cleanup_handle.await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }

    // Stop background tasks
    let _ = shutdown_tx.send(());
}
