//! # Capstan Core
//!
//! Shared foundation for the Capstan deferred-capture service:
//! configuration, error taxonomy, commerce domain types, and the port
//! traits that decouple the scheduler and order processor from the
//! concrete platform client.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::CapstanConfig;
pub use error::{CapstanError, PlatformError, Result};
