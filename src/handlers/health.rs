// src/handlers/health.rs
// DOCUMENTATION: Health check handler
// PURPOSE: Verify the service and its storage respond

use crate::db::Storer;
use crate::errors::GopherError;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

pub async fn health_check(store: web::Data<Storer>) -> Result<impl Responder, GopherError> {
    let gophers = store.count().await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "gopher-rating",
        "version": env!("CARGO_PKG_VERSION"),
        "gophers": gophers
    })))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
