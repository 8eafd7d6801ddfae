// HTTP API server binary for the pricebook catalog service.

use std::sync::Arc;

use anyhow::Result;
use pricebook::api::ApiServer;
use pricebook::catalog::{CatalogService, CatalogStore, StoreConfig};
use pricebook::config::Config;
use pricebook::db::Db;
use pricebook::ingest::{FeedConfig, HttpFeed};

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let cfg = Config::from_env()?;

    let db = Db::connect(&cfg.database_url, cfg.db_max_conns).await?;
    db.migrate().await?;

    let feed = HttpFeed::new(FeedConfig {
        http_timeout: cfg.http_timeout,
    })?;
    let store = CatalogStore::new(
        db.clone(),
        StoreConfig {
            query_timeout: cfg.query_timeout,
        },
    );
    let service = CatalogService::new(Arc::new(feed), store);

    ApiServer::new(&cfg).run(db, service).await
}
