mod api;
mod config;
mod firebase;
mod models;
mod services;
mod state;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io::{Error, ErrorKind};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = config::Config::from_env().map_err(|e| Error::new(ErrorKind::InvalidInput, e))?;

    log::info!("🚀 Starting Chat Relay...");
    log::info!("🧩 Backend: {:?}", config.backend);
    if let Some(url) = &config.database_url {
        log::info!("📡 Realtime database configured: {}", url);
    }

    let state = state::AppState::from_config(&config)
        .map_err(|e| Error::new(ErrorKind::Other, e.to_string()))?;

    state.check_store_connection().await;

    let state_data = web::Data::new(state);
    let allowed_origins = config.allowed_origins.clone();

    log::info!("🌐 Server starting on {}:{}", config.host, config.port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", config.host, config.port);

    HttpServer::new(move || {
        // Empty origin list allows any origin
        let origins = if allowed_origins.is_empty() {
            Cors::default().allow_any_origin()
        } else {
            allowed_origins
                .iter()
                .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        };
        let cors = origins
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .max_age(3600);

        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(state_data.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi)
            )
            .configure(api::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
