pub mod message;
pub mod user;

pub use message::*;
pub use user::*;

pub const USERS_COLLECTION: &str = "users";
pub const MESSAGES_COLLECTION: &str = "messages";
