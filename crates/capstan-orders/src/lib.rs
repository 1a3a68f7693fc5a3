//! # Capstan Orders
//!
//! The order processor: reads the payment-intent flag off order metadata,
//! finds the authorization transaction, and either captures immediately
//! or hands the order to the deferred-capture scheduler. The webhook
//! gateway feeds it decoded order events; it owns everything from there.

pub mod intent;
pub mod processor;

pub use processor::OrderProcessor;
