use actix_web::{web, HttpResponse, ResponseError};
use crate::services::chat_service::{self, CredentialsRequest, LoginResponse, LogoutRequest, MessageResponse, RegisterResponse};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Missing fields or rejected by the identity provider")
    )
)]
pub async fn register(
    state: web::Data<AppState>,
    request: web::Json<CredentialsRequest>,
) -> HttpResponse {
    let email = request.email.as_deref().unwrap_or("N/A");
    log::info!("📝 POST /register - email: {}", email);

    match chat_service::register(&state, &request).await {
        Ok(response) => {
            log::info!("✅ Registration successful: {} ({})", email, response.user_record.uid);
            HttpResponse::Created().json(response)
        }
        Err(e) => {
            log::warn!("❌ Registration failed: {} - {}", email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Custom token issued", body = LoginResponse),
        (status = 400, description = "Missing fields or unknown account"),
        (status = 401, description = "Password mismatch"),
        (status = 404, description = "No user document for the account")
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<CredentialsRequest>,
) -> HttpResponse {
    let email = request.email.as_deref().unwrap_or("N/A");
    log::info!("🔐 POST /login - email: {}", email);

    match chat_service::login(&state, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", email);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    request_body = LogoutRequest,
    responses(
        (status = 200, description = "Status set to offline", body = MessageResponse),
        (status = 400, description = "Missing uid or no such user document")
    )
)]
pub async fn logout(
    state: web::Data<AppState>,
    request: web::Json<LogoutRequest>,
) -> HttpResponse {
    let uid = request.uid.as_deref().unwrap_or("N/A");
    log::info!("👋 POST /logout - uid: {}", uid);

    match chat_service::logout(&state, &request).await {
        Ok(response) => {
            log::info!("✅ User {} is offline", uid);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Logout failed: {} - {}", uid, e);
            e.error_response()
        }
    }
}
