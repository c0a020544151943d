//! HTTP surface
//!
//! - `server`: listener lifecycle with graceful shutdown
//! - `routes`: metrics endpoints, front page, health check
//! - `state`: collectors and poller shared with the handlers

mod server;

pub mod routes;
pub mod state;
pub mod templates;

pub use server::start_server;
pub use state::AppState;
