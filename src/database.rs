use sqlx::{postgres::{PgConnectOptions, PgPoolOptions}, PgPool};
use std::str::FromStr;
use tracing::{info, warn};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(database_url)?
        .application_name("otaku-card");

    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .idle_timeout(std::time::Duration::from_secs(60))
        .connect_with(options)
        .await
}

/// Apply `./migrations`. A version mismatch is logged and tolerated so an
/// already-initialised database still serves; any other failure is returned.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(_) => {
            info!("✅ Migrations completed successfully");
            Ok(())
        }
        Err(sqlx::migrate::MigrateError::VersionMismatch(version)) => {
            warn!("Migration version mismatch: {}", version);
            warn!("Database has different migration state than expected");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
