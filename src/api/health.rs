use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use crate::state::AppState;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    /// `connected` or `unreachable`
    pub document_store: String,
    pub timestamp: i64,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up; document store reachability reported", body = HealthResponse)
    )
)]
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let (status, document_store) = match state.probe_store().await {
        Ok(()) => ("healthy", "connected"),
        Err(e) => {
            log::warn!("⚠️ Health probe could not reach document store: {}", e);
            ("degraded", "unreachable")
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        document_store: document_store.to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    })
}
