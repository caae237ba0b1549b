//! HTTP transport to the session server.
//!
//! A thin request/response layer: form-encoded POST in, plain-text token
//! out, with a fixed client-side timeout and no retries.

mod client;
mod error;

pub use client::ServerClient;
pub use error::TransportError;
