pub mod dashmap_qr_session_store;
pub mod hashmap_user_store;
pub mod postgres_qr_session_store;
pub mod postgres_user_store;
pub mod redis_qr_session_store;
