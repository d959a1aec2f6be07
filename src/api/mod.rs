pub mod auth;
pub mod health;
pub mod messages;
pub mod swagger;
pub mod users;

use crate::utils::AppError;
use actix_web::{error::InternalError, web, ResponseError};

/// Rejects unparseable bodies with `400 {message}` instead of actix's plain-text default.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, req| {
        let message = err.to_string();
        log::warn!("❌ Invalid JSON body on {}: {}", req.path(), message);
        InternalError::from_response(err, AppError::Validation(message).error_response()).into()
    })
}

/// Chat route table shared by the server and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/health", web::get().to(health::health_check))
        .route("/register", web::post().to(auth::register))
        .route("/login", web::post().to(auth::login))
        .route("/logout", web::post().to(auth::logout))
        .route("/users", web::get().to(users::list_users))
        .route("/send-message", web::post().to(messages::send_message))
        .route("/get-messages", web::get().to(messages::get_messages));
}
