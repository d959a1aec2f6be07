use actix_web::{web, HttpResponse, ResponseError};
use crate::services::chat_service::{self, ConversationQuery, MessageResponse, MessagesResponse, SendMessageRequest};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/send-message",
    tag = "Messages",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message stored", body = MessageResponse),
        (status = 400, description = "Missing fields or external service failure")
    )
)]
pub async fn send_message(
    state: web::Data<AppState>,
    request: web::Json<SendMessageRequest>,
) -> HttpResponse {
    let sender = request.sender_uid.as_deref().unwrap_or("N/A");
    let receiver = request.receiver_uid.as_deref().unwrap_or("N/A");
    log::info!("💬 POST /send-message - {} -> {}", sender, receiver);

    match chat_service::send_message(&state, &request).await {
        Ok(response) => {
            log::info!("✅ Message delivered: {} -> {}", sender, receiver);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::error!("❌ Error sending message: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/get-messages",
    tag = "Messages",
    params(ConversationQuery),
    responses(
        (status = 200, description = "Messages between the two users, oldest first", body = MessagesResponse),
        (status = 400, description = "Missing parameters or query failure")
    )
)]
pub async fn get_messages(
    state: web::Data<AppState>,
    query: web::Query<ConversationQuery>,
) -> HttpResponse {
    log::info!(
        "📥 GET /get-messages - {} <-> {}",
        query.user1_uid.as_deref().unwrap_or("N/A"),
        query.user2_uid.as_deref().unwrap_or("N/A")
    );

    match chat_service::get_messages(&state, &query).await {
        Ok(response) => {
            log::info!("✅ Returned {} messages", response.messages.len());
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Fetching messages failed: {}", e);
            e.error_response()
        }
    }
}
