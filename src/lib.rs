pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod room;
pub mod room_manager;
pub mod server_protocol;
pub mod server_utils;
pub mod types;
