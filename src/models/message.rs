use serde::{Deserialize, Serialize};

/// Immutable chat message stored in the `messages` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub sender_uid: String,
    pub receiver_uid: String,
    pub message: String,
    /// ISO-8601 UTC with millisecond precision; lexical order equals time order
    pub timestamp: String,
}
