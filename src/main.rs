use std::{net::SocketAddr, sync::Arc};

use http::HeaderValue;
use tokio::{signal, sync::mpsc};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use tracing::{error, info};

use farmconnect_api as api;
use farmconnect_api::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);
    api::handlers::health::init_start_time();

    let pool = api::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        if let Err(e) = api::db::run_migrations(&pool).await {
            error!("Could not bring the schema up to date: {}", e);
            return Err(e.into());
        }
    }

    let db = Arc::new(pool);
    let config = Arc::new(cfg);

    // Domain events ride an in-process channel; the consumer logs and
    // keeps counters.
    let (event_tx, event_rx) = mpsc::channel(config.event_channel_capacity);
    let event_sender = api::events::EventSender::new(event_tx);
    tokio::spawn(api::events::process_events(event_rx));

    let auth = Arc::new(api::auth::AuthService::new(
        api::auth::AuthConfig::from_app_config(&config),
    ));
    let services =
        api::services::AppServices::new(db.clone(), Arc::new(event_sender), config.clone());

    // OTP send counters accumulate until swept
    tokio::spawn(api::auth::rate_limit::cleanup_otp_limits(
        services.verification.otp_limiter(),
    ));

    let state = api::AppState {
        db,
        config: config.clone(),
        auth,
        services,
    };

    let cors = build_cors(&config)?;
    let app = api::app(state).layer(CompressionLayer::new()).layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("farmconnect-api listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Builds the CORS layer. Explicit origins win; outside development a
/// missing allowlist is a startup error unless permissive mode was opted
/// into through configuration.
fn build_cors(config: &AppConfig) -> Result<CorsLayer, Box<dyn std::error::Error>> {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .as_deref()
        .unwrap_or("")
        .split(',')
        .filter_map(|raw| {
            let origin = raw.trim();
            if origin.is_empty() {
                None
            } else {
                HeaderValue::from_str(origin).ok()
            }
        })
        .collect();

    if !origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_credentials(config.cors_allow_credentials));
    }

    if config.should_allow_permissive_cors() {
        info!(
            "Permissive CORS in effect ({})",
            if config.is_development() {
                "development environment"
            } else {
                "explicit override"
            }
        );
        return Ok(CorsLayer::permissive());
    }

    error!("No CORS origins configured; set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true");
    Err("missing CORS configuration".into())
}

/// Resolves on SIGTERM from the orchestrator or Ctrl+C locally.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate())
            .expect("SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
