//! API Module
//!
//! Demo HTTP surface showing the authenticator wired into axum.
//!
//! # Endpoints
//! - `GET /me` - Authenticated caller's claims
//! - `GET /stats` - Token cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
