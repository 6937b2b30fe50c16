//! Connection pool setup, migration runner and the readiness ping.

use crate::config::AppConfig;
use crate::errors::ServiceError;
use metrics::{counter, gauge};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{debug, error, info};

/// Opens the pool with the sizing and timeouts from configuration.
pub async fn establish_connection_from_app_config(
    cfg: &AppConfig,
) -> Result<DatabaseConnection, ServiceError> {
    let mut options = ConnectOptions::new(cfg.database_url.clone());
    options
        .max_connections(cfg.db_max_connections)
        .min_connections(cfg.db_min_connections)
        .connect_timeout(Duration::from_secs(cfg.db_connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(cfg.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(cfg.db_idle_timeout_secs))
        .sqlx_logging(true);

    gauge!(
        "farmconnect_db.max_connections",
        cfg.db_max_connections as f64
    );
    info!(
        "Connecting to database (pool {}..{})",
        cfg.db_min_connections, cfg.db_max_connections
    );

    let pool = Database::connect(options).await?;
    info!("Database pool ready");
    Ok(pool)
}

/// Applies every pending migration from the embedded migrator.
pub async fn run_migrations(pool: &DatabaseConnection) -> Result<(), ServiceError> {
    info!("Applying database migrations");
    let started = std::time::Instant::now();

    match crate::migrator::Migrator::up(pool, None).await {
        Ok(()) => {
            info!("Migrations up to date after {:?}", started.elapsed());
            Ok(())
        }
        Err(e) => {
            error!("Migration run failed after {:?}: {}", started.elapsed(), e);
            Err(ServiceError::DatabaseError(e))
        }
    }
}

/// Round-trips a ping, recording latency for the readiness probe.
pub async fn check_connection(pool: &DatabaseConnection) -> Result<(), ServiceError> {
    let started = std::time::Instant::now();

    match pool.ping().await {
        Ok(()) => {
            let elapsed = started.elapsed();
            debug!("Database ping ok in {:?}", elapsed);
            gauge!(
                "farmconnect_db.ping_latency_ms",
                elapsed.as_millis() as f64
            );
            Ok(())
        }
        Err(e) => {
            error!("Database ping failed: {}", e);
            counter!("farmconnect_db.ping_failures", 1);
            Err(ServiceError::DatabaseError(e))
        }
    }
}
