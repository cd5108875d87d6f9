pub mod kv_store;
pub mod queue_repository;
pub mod room_repository;
