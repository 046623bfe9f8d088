use std::sync::Arc;

use blogs_api::config::AppConfig;
use blogs_api::storage::{MemoryStorage, PgStorage, Storage};
use blogs_api::{build_router, AppState};
use blogs_shared::clients::db::create_pool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    blogs_shared::middleware::init_tracing("blogs-api");

    let config = AppConfig::load()?;
    let port = config.port;

    let storage: Arc<dyn Storage> = if config.uses_memory_storage() {
        tracing::warn!("using in-memory storage, data is lost on restart");
        Arc::new(MemoryStorage::new())
    } else {
        let pool = create_pool(
            &config.database_url,
            config.db_pool_size,
            config.storage_timeout(),
        )?;
        Arc::new(PgStorage::new(pool, config.storage_timeout()))
    };

    let metrics = blogs_shared::middleware::init_metrics()?;

    let state = Arc::new(AppState {
        storage,
        config,
        metrics: Some(metrics),
    });
    let app = build_router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "blogs-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
