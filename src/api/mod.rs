//! HTTP API for the chat orchestrator

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use handlers::AppState;
pub use server::serve_api;
