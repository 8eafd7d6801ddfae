// HTTP API module for the pricebook catalog service.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
