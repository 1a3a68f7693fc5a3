//! # Capstan Gateway
//!
//! The HTTP edge: receives order webhooks from the commerce platform,
//! acknowledges them immediately, and hands processing to the order
//! processor on a spawned task. Also serves the scheduled-jobs
//! diagnostics view and a health endpoint.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
