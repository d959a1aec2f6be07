pub mod chat_service;
pub mod document_store;
pub mod identity;
pub mod push;

pub use document_store::{DocumentStore, MemoryStore};
pub use identity::{IdentityService, MemoryIdentity};
pub use push::{MemoryPush, PushDispatch};
