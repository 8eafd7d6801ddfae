// API route configuration

use actix_web::web;

use crate::api::handlers;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/health", web::get().to(handlers::health_check))
        .route("/", web::get().to(handlers::health_check))
        // API v1 routes
        .service(
            web::scope("/api/v1")
                .route("/catalog/fetch", web::post().to(handlers::fetch_feed))
                .route(
                    "/catalog/products/list",
                    web::post().to(handlers::list_products),
                ),
        );
}
