//! # Capstan Platform Client
//!
//! REST client for the commerce platform's order API: order reads,
//! transaction listing, and payment capture, with a self-refreshing
//! OAuth client-credentials token. Implements the `PlatformPort` /
//! `CapturePort` traits from `capstan-core`, which is all the rest of
//! the system ever sees.

pub mod client;

pub use client::PlatformClient;
