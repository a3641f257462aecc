//! TicketTriage Server
//!
//! HTTP surface for the ticket classification pipeline: configuration,
//! API-key authentication, per-address rate limiting, route handlers, and
//! error-to-status mapping. The binary entry point lives in `main.rs`.

pub mod config;
pub mod rate_limit;
pub mod routes;
pub mod security;
pub mod state;

pub use config::{Secrets, ServerConfig};
pub use rate_limit::RateLimiter;
pub use routes::create_router;
pub use state::AppState;
