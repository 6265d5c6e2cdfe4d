//! Command-line entry points besides the webhook server.

pub mod price;
pub mod setup;
