use actix_web::{web, HttpResponse, ResponseError};
use crate::services::chat_service;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "Every user document with its id"),
        (status = 404, description = "No users found"),
        (status = 500, description = "Error fetching users")
    )
)]
pub async fn list_users(state: web::Data<AppState>) -> HttpResponse {
    log::info!("📋 GET /users");

    match chat_service::list_users(&state).await {
        Ok(users) => {
            log::info!("✅ Listed {} users", users.len());
            HttpResponse::Ok().json(users)
        }
        Err(e) => {
            log::warn!("❌ Listing users failed: {}", e);
            e.error_response()
        }
    }
}
