// API server implementation using actix-web

use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};

use crate::api::routes;
use crate::catalog::service::CatalogService;
use crate::config::Config;
use crate::db::Db;

pub struct ApiServer {
    pub host: String,
    pub port: u16,
}

impl ApiServer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            host: cfg.app_host.clone(),
            port: cfg.app_port,
        }
    }

    /// Start the HTTP server; runs until the process is asked to stop.
    pub async fn run(self, db: Db, service: CatalogService) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = self.port,
            "starting pricebook API server"
        );

        let db_data = web::Data::new(db);
        let service_data = web::Data::new(service);

        HttpServer::new(move || {
            App::new()
                .app_data(db_data.clone())
                .app_data(service_data.clone())
                .configure(routes::configure_routes)
        })
        .bind(&bind_addr)
        .with_context(|| format!("cannot bind {bind_addr}"))?
        .run()
        .await
        .context("api server terminated")?;

        Ok(())
    }
}
