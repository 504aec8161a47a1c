//! Plugdock REST API
//!
//! Exposes plugin installation for the configured sites over HTTP.

mod auth;
mod handlers;
mod routes;
pub mod server;

pub use auth::ApiKeyAuth;
pub use handlers::ApiState;
pub use server::run_api_server;
