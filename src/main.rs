use agency_resources::{
    app, apply_migrations, builtin_config, ensure_database_exists, load_from_path, resolve, telemetry,
    AppState, MemoryStore, PgStore, Settings, Store, StoreBackend,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    telemetry::init();

    let config = match &settings.resources_path {
        Some(path) => load_from_path(path).await?,
        None => builtin_config()?,
    };
    let model = Arc::new(resolve(&config)?);
    tracing::info!(resources = model.resources.len(), "resource model resolved");

    let store: Arc<dyn Store> = match settings.store_backend {
        StoreBackend::Postgres => {
            ensure_database_exists(&settings.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(settings.db_max_connections)
                .connect(&settings.database_url)
                .await?;
            apply_migrations(&pool, &model).await?;
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(store, model);
    let router = app(state, settings.max_body_bytes);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
