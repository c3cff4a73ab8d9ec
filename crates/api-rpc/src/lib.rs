//! Turnstile Admission API - JSON-RPC edge
//!
//! Resolves caller identity into a token, forwards to the matching
//! AdmissionQueue and maps the result to a client-facing status payload.

pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
