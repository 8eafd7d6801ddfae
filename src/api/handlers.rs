// HTTP request handlers for API endpoints

use std::time::SystemTime;

use actix_web::{web, HttpResponse, Result};

use crate::api::models::*;
use crate::catalog::error::Error;
use crate::catalog::service::CatalogService;
use crate::db::Db;

/// Health check endpoint
pub async fn health_check(db: web::Data<Db>) -> Result<HttpResponse> {
    // Quick database connectivity check
    let db_status = match sqlx::query_scalar::<_, bool>("SELECT true")
        .fetch_one(&db.pool)
        .await
    {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let uptime = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let response = ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        database: db_status.to_string(),
        uptime_seconds: uptime,
    });

    Ok(HttpResponse::Ok().json(response))
}

/// Pull a CSV price list and reconcile it into the catalog.
pub async fn fetch_feed(
    payload: web::Json<FetchRequest>,
    svc: web::Data<CatalogService>,
) -> Result<HttpResponse> {
    tracing::info!(url = %payload.url, "feed fetch requested");

    match svc.fetch(&payload.url).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
            "status": "reconciled"
        })))),
        Err(err) => Ok(error_response(err)),
    }
}

/// Paginated, sortable catalog read.
pub async fn list_products(
    payload: web::Json<ListRequest>,
    svc: web::Data<CatalogService>,
) -> Result<HttpResponse> {
    let query = match payload.into_inner().into_query() {
        Ok(query) => query,
        Err(err) => return Ok(error_response(err)),
    };

    match svc.list(&query).await {
        Ok(products) => {
            let items: Vec<ProductDto> = products.iter().map(ProductDto::from).collect();
            Ok(HttpResponse::Ok().json(ApiResponse::success(items)))
        }
        Err(err) => Ok(error_response(err)),
    }
}

/// InvalidInput maps to the client-error class; everything else is a 500.
fn error_response(err: Error) -> HttpResponse {
    let body = ApiResponse::<()>::error(err.to_string());
    if err.is_invalid_input() {
        HttpResponse::BadRequest().json(body)
    } else {
        tracing::error!(error = %err, "request failed");
        HttpResponse::InternalServerError().json(body)
    }
}
