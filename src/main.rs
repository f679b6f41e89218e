use std::sync::Arc;

use axum::Router;
use lambda_runtime::{service_fn, LambdaEvent};
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

mod config;
mod db;
mod error;
mod handlers;
mod models;

use crate::config::{Config, Runtime, StoreBackend};
use crate::db::{DynamoStore, InventoryStore, MemoryStore};

/// Shared application state — cheap to clone, the store handle is built once per
/// process and reused by every invocation.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn InventoryStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in Lambda where env vars are injected)
    dotenv::dotenv().ok();

    let config = Config::from_env()?;

    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,inventory_lambda=debug".into()),
        )
        .with_target(false)
        .with_ansi(config.runtime == Runtime::Local)
        .compact()
        .init();

    let store: Arc<dyn InventoryStore> = match config.backend {
        StoreBackend::DynamoDb => {
            info!(table = %config.table_name, region = %config.region, "Using DynamoDB store");
            Arc::new(DynamoStore::connect(&config).await)
        }
        StoreBackend::Memory => {
            info!(page_size = config.memory_page_size, "Using in-memory store");
            Arc::new(MemoryStore::new(config.memory_page_size))
        }
    };
    let state = AppState { store };

    match config.runtime {
        Runtime::Lambda => run_lambda(state).await,
        Runtime::Local => serve_local(state, &config).await,
    }
}

async fn run_lambda(state: AppState) -> anyhow::Result<()> {
    info!("Starting Lambda runtime loop");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let store = Arc::clone(&state.store);
        async move {
            Ok::<_, lambda_runtime::Error>(handlers::dispatch(store.as_ref(), event.payload).await)
        }
    }))
    .await
    .map_err(|err| anyhow::anyhow!(err))
}

async fn serve_local(state: AppState, config: &Config) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening on http://{}", addr);
    info!("Quick-start: curl http://{}/status", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Every path goes through the dispatcher, which owns the routing table.
fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(handlers::http::proxy)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
