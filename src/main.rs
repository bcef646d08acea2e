use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use otaku_card::{
    app,
    config::Config,
    database,
    store::{CardStore, MemoryCardStore, PgCardStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("otaku_card=info,tower_http=info,sqlx=warn")),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn CardStore> = match &config.database_url {
        Some(url) => {
            let pool = database::create_pool(url)
                .await
                .context("Failed to connect to PostgreSQL")?;

            if config.skip_migrations {
                warn!("⚠️ Skipping migrations due to SKIP_MIGRATIONS=true");
            } else if let Err(e) = database::run_migrations(&pool).await {
                warn!("❌ Failed to run migrations: {}", e);
                warn!("Continuing without migrations (set SKIP_MIGRATIONS=true to suppress this warning)");
            }

            Arc::new(PgCardStore::new(pool))
        }
        None => {
            warn!("⚠️ DATABASE_URL not set, cards are kept in memory and lost on restart");
            Arc::new(MemoryCardStore::new())
        }
    };
    info!("🗄️ Card store backend: {}", store.backend());

    let addr = config.socket_addr()?;
    let app = app(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🚀 Server starting on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
