//! OpenSASE Storefront - cart, checkout and order service

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opensase_storefront::{
    api::{self, AppState},
    config::Config,
    publisher::EventPublisher,
    store::{MemoryStore, PgStore, SharedStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: SharedStore = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new().max_connections(config.max_connections).connect(url).await?;
            let store = PgStore::new(pool);
            store.migrate().await?;
            info!("using postgres store");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(error) => {
                warn!(%error, "NATS unavailable, order events disabled");
                None
            }
        },
        None => None,
    };

    let app = api::router(AppState::new(store, EventPublisher::new(nats)));

    let addr = config.bind_addr();
    info!("OpenSASE Storefront listening on {addr}");
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
